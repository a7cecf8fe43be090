//! Sync command: drives the synchronizer against the live services.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use cs_clockify::ClockifyClient;
use cs_core::{SyncOptions, SyncReport, Synchronizer};
use cs_google::CalendarClient;

use crate::Config;
use crate::rules;

#[derive(Debug, Clone)]
pub struct SyncArgs {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub simulate: bool,
    pub purge: bool,
    pub rules: Option<PathBuf>,
}

pub async fn run(args: &SyncArgs, config: &Config) -> Result<SyncReport> {
    let rules_path = args.rules.as_ref().unwrap_or(&config.rules_path);
    let rules = rules::load_rules(rules_path, config.use_default_fallback)?;
    if rules.is_empty() {
        tracing::warn!(
            path = %rules_path.display(),
            "rules file has no domain rules, only marker matches are possible"
        );
    }

    let source = CalendarClient::new(
        config.google.access_token.clone(),
        config.google.calendar_id.clone(),
    )
    .context("failed to build calendar client")?;
    let mut sink = ClockifyClient::new(
        config.clockify.api_key.clone(),
        config.clockify.workspace_id.clone(),
    )
    .context("failed to build Clockify client")?;

    let exclusions = config.exclusion_config();
    let options = SyncOptions {
        start: args.start,
        end: args.end,
        simulate: args.simulate,
        purge: args.purge,
    };

    let report = Synchronizer::new(&source, &mut sink, &rules, &exclusions)
        .run(&options)
        .await?;
    Ok(report)
}
