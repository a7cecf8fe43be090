//! Day-by-day synchronization of calendar events into time entries.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

use crate::classify::{self, ExclusionConfig, Outcome};
use crate::event::CalendarEvent;
use crate::matcher;
use crate::ports::{BOT_TAG_NAME, CalendarSource, NewTimeEntry, PortError, TimeTrackingSink};
use crate::purge;
use crate::rules::RuleSet;

/// Longest allowed distance between the first and last day, in days.
pub const MAX_RANGE_DAYS: i64 = 31;

/// Errors that abort a synchronization run.
///
/// Per-event and per-day failures are contained and counted instead;
/// only structural problems surface here.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The requested date range is out of order or too long.
    #[error("invalid date range: {0}")]
    InvalidRange(String),
    /// Purge was requested but the bot tag does not exist. Purging is
    /// refused entirely rather than risking foreign entries.
    #[error("tag {name:?} does not exist, refusing to purge")]
    TagUnresolved { name: String },
    /// A structural sink call failed before the day loop started.
    #[error(transparent)]
    Port(#[from] PortError),
}

/// Parameters for one synchronization run.
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// First day to process.
    pub start: NaiveDate,
    /// Last day to process, inclusive.
    pub end: NaiveDate,
    /// Log intended actions without any mutating call.
    pub simulate: bool,
    /// Delete previously created bot entries before each day's pass.
    pub purge: bool,
}

/// Outcome counters for a synchronization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub days: usize,
    pub events: usize,
    pub created: usize,
    pub simulated: usize,
    pub duplicates: usize,
    pub conflicts: usize,
    pub excluded: usize,
    pub unmatched_projects: usize,
    pub purged: usize,
    pub errors: usize,
}

/// What happened to a single candidate event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventAction {
    Excluded,
    UnmatchedProject,
    Simulated,
    Duplicate,
    Conflict,
    Created,
}

impl SyncReport {
    fn record(&mut self, action: EventAction) {
        match action {
            EventAction::Excluded => self.excluded += 1,
            EventAction::UnmatchedProject => self.unmatched_projects += 1,
            EventAction::Simulated => self.simulated += 1,
            EventAction::Duplicate => self.duplicates += 1,
            EventAction::Conflict => self.conflicts += 1,
            EventAction::Created => self.created += 1,
        }
    }
}

/// Drives the per-day pipeline: purge, fetch, classify, match, create.
///
/// Strictly sequential; every source and sink call is awaited in
/// program order. Re-running the same range without purge is safe: every
/// entry created earlier is recognized as a duplicate.
pub struct Synchronizer<'a, C, T> {
    source: &'a C,
    sink: &'a mut T,
    rules: &'a RuleSet,
    exclusions: &'a ExclusionConfig,
}

impl<'a, C, T> Synchronizer<'a, C, T>
where
    C: CalendarSource + Sync,
    T: TimeTrackingSink + Send,
{
    pub fn new(
        source: &'a C,
        sink: &'a mut T,
        rules: &'a RuleSet,
        exclusions: &'a ExclusionConfig,
    ) -> Self {
        Self {
            source,
            sink,
            rules,
            exclusions,
        }
    }

    /// Runs the synchronization over the inclusive date range.
    pub async fn run(&mut self, options: &SyncOptions) -> Result<SyncReport, SyncError> {
        validate_range(options.start, options.end)?;

        if options.simulate {
            tracing::info!("simulation mode: no entries will be created or deleted");
        }

        let bot_tag_id = self.resolve_bot_tag(options).await?;

        let mut report = SyncReport::default();
        let mut day = options.start;
        loop {
            self.process_day(day, options, bot_tag_id.as_deref(), &mut report)
                .await;
            report.days += 1;
            if day >= options.end {
                break;
            }
            let Some(next) = day.succ_opt() else { break };
            day = next;
        }

        tracing::info!(?report, "synchronization finished");
        Ok(report)
    }

    /// Resolves the bot tag up front. Purge refuses to run against a
    /// missing tag; creation looks the tag up or creates it, except in
    /// simulate mode where no tag may be created.
    async fn resolve_bot_tag(&mut self, options: &SyncOptions) -> Result<Option<String>, SyncError> {
        if options.purge {
            match self.sink.find_tag(BOT_TAG_NAME).await? {
                Some(id) => Ok(Some(id)),
                None => Err(SyncError::TagUnresolved {
                    name: BOT_TAG_NAME.to_string(),
                }),
            }
        } else if options.simulate {
            Ok(self.sink.find_tag(BOT_TAG_NAME).await?)
        } else {
            Ok(Some(self.sink.ensure_tag(BOT_TAG_NAME).await?))
        }
    }

    /// One cycle of the day loop. Failures inside a day are logged and
    /// counted; the loop always moves on to the next day.
    async fn process_day(
        &mut self,
        day: NaiveDate,
        options: &SyncOptions,
        bot_tag_id: Option<&str>,
        report: &mut SyncReport,
    ) {
        let (window_start, window_end) = day_window(day);
        tracing::info!(%day, "processing day");

        if options.purge {
            if let Some(tag_id) = bot_tag_id {
                match purge::purge_day(self.sink, window_start, window_end, tag_id, options.simulate)
                    .await
                {
                    Ok(count) => report.purged += count,
                    Err(err) => {
                        report.errors += 1;
                        tracing::error!(%day, error = %err, "purge pass failed");
                    }
                }
            }
        }

        let events = match self.source.fetch_events(window_start, window_end).await {
            Ok(events) => events,
            Err(err) => {
                report.errors += 1;
                tracing::error!(%day, error = %err, "failed to fetch events, skipping day");
                return;
            }
        };

        for mut event in events {
            report.events += 1;
            match self.process_event(&mut event, options, bot_tag_id).await {
                Ok(action) => report.record(action),
                Err(err) => {
                    report.errors += 1;
                    tracing::error!(
                        title = %event.summary,
                        error = %err,
                        "event failed, continuing with the next one"
                    );
                }
            }
        }
    }

    async fn process_event(
        &mut self,
        event: &mut CalendarEvent,
        options: &SyncOptions,
        bot_tag_id: Option<&str>,
    ) -> Result<EventAction, PortError> {
        let external_actor = match classify::classify(event, self.exclusions) {
            Outcome::Skip(reason) => {
                tracing::info!(title = %event.summary, %reason, "skipping event");
                return Ok(EventAction::Excluded);
            }
            Outcome::Eligible { external_actor } => external_actor,
        };
        if event.external_actor_email.is_none() {
            event.external_actor_email = external_actor;
        }

        let project_name = matcher::match_project(event, self.rules);
        let project_id = match &project_name {
            Some(name) => match self.sink.resolve_project_id(name).await? {
                Some(id) => Some(id),
                None => {
                    tracing::warn!(
                        title = %event.summary,
                        project = %name,
                        "matched project does not exist, skipping event"
                    );
                    return Ok(EventAction::UnmatchedProject);
                }
            },
            None => None,
        };

        let (Some(start), Some(end)) = (event.start.instant(), event.end.instant()) else {
            // The classifier already rejects all-day starts; this guards
            // events with a malformed end.
            tracing::warn!(title = %event.summary, "event has no concrete time range, skipping");
            return Ok(EventAction::Excluded);
        };

        if options.simulate {
            tracing::info!(
                title = %event.summary,
                %start,
                %end,
                project = project_name.as_deref().unwrap_or("(none)"),
                "simulate: would create entry"
            );
            return Ok(EventAction::Simulated);
        }

        let existing = self.sink.list_entries(start, end).await?;
        let mut conflicting = None;
        for entry in existing
            .iter()
            .filter(|entry| entry.start == start && entry.end == end)
        {
            if entry.project_id == project_id {
                tracing::info!(
                    title = %event.summary,
                    entry = %entry.id,
                    "entry already exists, skipping duplicate"
                );
                return Ok(EventAction::Duplicate);
            }
            conflicting = Some(entry);
        }
        if let Some(entry) = conflicting {
            tracing::warn!(
                title = %event.summary,
                entry = %entry.id,
                existing_project = ?entry.project_id,
                wanted_project = ?project_id,
                "conflicting entry at the same interval, skipping"
            );
            return Ok(EventAction::Conflict);
        }

        let created = self
            .sink
            .create_entry(NewTimeEntry {
                start,
                end,
                description: event.summary.clone(),
                project_id,
                tag_ids: bot_tag_id.map(str::to_string).into_iter().collect(),
            })
            .await?;
        tracing::info!(title = %event.summary, entry = %created.id, "created entry");
        Ok(EventAction::Created)
    }
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), SyncError> {
    if start > end {
        return Err(SyncError::InvalidRange(format!(
            "start {start} is after end {end}"
        )));
    }
    let span = (end - start).num_days();
    if span > MAX_RANGE_DAYS {
        return Err(SyncError::InvalidRange(format!(
            "range spans {span} days, maximum is {MAX_RANGE_DAYS}"
        )));
    }
    Ok(())
}

/// Full-day window from 00:00:00 to 23:59:59 UTC.
fn day_window(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::seconds(24 * 60 * 60 - 1);
    (start, end)
}
