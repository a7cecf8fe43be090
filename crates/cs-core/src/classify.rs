//! Event eligibility classification.
//!
//! The checks form an ordered list evaluated in sequence; the first one
//! that fires excludes the event and the rest are skipped. Every
//! exclusion carries a [`SkipReason`] so the caller can log one
//! distinguishable message per decision point.

use std::fmt;

use crate::event::{CalendarEvent, ResponseStatus};

/// Substring marking an automated reclaim.ai scheduling task.
const RECLAIM_MARKER: &str = "reclaim.ai";

/// Description marker opting an event out of logging (case-insensitive).
const NO_PROJECT_MARKER: &str = "#noproject";

/// Exclusion configuration, immutable during a run.
#[derive(Debug, Clone, Default)]
pub struct ExclusionConfig {
    /// Attendee addresses that never justify logging a 1:1 event.
    pub ignored_emails: Vec<String>,
    /// The calendar owner's own address.
    pub self_email: Option<String>,
    /// Suffix identifying organization members, e.g. `@corp.com`.
    /// Including the leading `@` keeps sibling domains from matching.
    pub organization_domain: String,
}

/// Why an event was excluded from logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The description references a reclaim.ai scheduling task.
    ReclaimTask,
    /// All-day events are never logged.
    AllDay,
    /// The description carries the `#noproject` opt-out marker.
    NoProjectMarker,
    /// Nobody was invited.
    NoAttendees,
    /// The only other attendee is on the ignored list.
    IgnoredOneOnOne { email: String },
    /// The organizer is external and no external attendee stands in.
    ExternalWithoutActor,
    /// The configured self address never accepted the invitation.
    NotAccepted,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReclaimTask => write!(f, "reclaim.ai task"),
            Self::AllDay => write!(f, "all-day event"),
            Self::NoProjectMarker => write!(f, "#noproject marker"),
            Self::NoAttendees => write!(f, "no attendees"),
            Self::IgnoredOneOnOne { email } => write!(f, "1:1 with ignored attendee {email}"),
            Self::ExternalWithoutActor => {
                write!(f, "external organizer with no external attendee")
            }
            Self::NotAccepted => write!(f, "invitation not accepted"),
        }
    }
}

/// Result of classifying a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event should be logged. `external_actor` is the attendee
    /// substituted for an external organizer, when one was resolved;
    /// the caller records it on the event before matching.
    Eligible { external_actor: Option<String> },
    /// The event must not be logged.
    Skip(SkipReason),
}

/// Runs the exclusion checks against one event.
pub fn classify(event: &CalendarEvent, config: &ExclusionConfig) -> Outcome {
    let description = event.description.as_deref().unwrap_or_default();

    if description.contains(RECLAIM_MARKER) {
        return Outcome::Skip(SkipReason::ReclaimTask);
    }

    if event.is_all_day() {
        return Outcome::Skip(SkipReason::AllDay);
    }

    if description.to_lowercase().contains(NO_PROJECT_MARKER) {
        return Outcome::Skip(SkipReason::NoProjectMarker);
    }

    if event.attendees.is_empty() {
        return Outcome::Skip(SkipReason::NoAttendees);
    }

    if let Some(reason) = ignored_one_on_one(event, config) {
        return Outcome::Skip(reason);
    }

    let external_actor = match resolve_external_actor(event, config) {
        Ok(actor) => actor,
        Err(reason) => return Outcome::Skip(reason),
    };

    if !self_accepted(event, config) {
        return Outcome::Skip(SkipReason::NotAccepted);
    }

    Outcome::Eligible { external_actor }
}

/// Check 5: after removing the self address, exactly one attendee
/// remains and it is on the ignored list.
fn ignored_one_on_one(event: &CalendarEvent, config: &ExclusionConfig) -> Option<SkipReason> {
    let others: Vec<&str> = event
        .attendees
        .iter()
        .map(|attendee| attendee.email.as_str())
        .filter(|email| {
            config
                .self_email
                .as_deref()
                .is_none_or(|own| !email.eq_ignore_ascii_case(own))
        })
        .collect();

    match others.as_slice() {
        [only] if config
            .ignored_emails
            .iter()
            .any(|ignored| ignored.eq_ignore_ascii_case(only)) =>
        {
            Some(SkipReason::IgnoredOneOnOne {
                email: (*only).to_string(),
            })
        }
        _ => None,
    }
}

/// Check 6: an organizer outside the organization domain must be backed
/// by an external attendee, who becomes the matching key.
fn resolve_external_actor(
    event: &CalendarEvent,
    config: &ExclusionConfig,
) -> Result<Option<String>, SkipReason> {
    let Some(organizer) = event.organizer_email.as_deref() else {
        return Ok(None);
    };
    if is_organization_member(organizer, config) {
        return Ok(None);
    }

    event
        .attendees
        .iter()
        .find(|attendee| !is_organization_member(&attendee.email, config))
        .map(|attendee| Some(attendee.email.clone()))
        .ok_or(SkipReason::ExternalWithoutActor)
}

/// Check 7: events organized by someone else count only once the self
/// address has accepted the invitation.
fn self_accepted(event: &CalendarEvent, config: &ExclusionConfig) -> bool {
    let Some(own) = config.self_email.as_deref() else {
        return true;
    };
    if event
        .organizer_email
        .as_deref()
        .is_some_and(|organizer| organizer.eq_ignore_ascii_case(own))
    {
        return true;
    }

    event.attendees.iter().any(|attendee| {
        attendee.email.eq_ignore_ascii_case(own)
            && attendee.response_status == Some(ResponseStatus::Accepted)
    })
}

fn is_organization_member(email: &str, config: &ExclusionConfig) -> bool {
    email
        .to_lowercase()
        .ends_with(&config.organization_domain.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Attendee, EventTime};

    fn config() -> ExclusionConfig {
        ExclusionConfig {
            ignored_emails: vec!["spam@y.com".into()],
            self_email: Some("me@x.com".into()),
            organization_domain: "@x.com".into(),
        }
    }

    fn attendee(email: &str, status: Option<ResponseStatus>) -> Attendee {
        Attendee {
            email: email.to_string(),
            response_status: status,
        }
    }

    fn event(attendees: Vec<Attendee>) -> CalendarEvent {
        CalendarEvent {
            id: "evt-1".into(),
            summary: "Weekly check-in".into(),
            description: None,
            start: EventTime::At("2025-03-01T10:00:00Z".parse().unwrap()),
            end: EventTime::At("2025-03-01T11:00:00Z".parse().unwrap()),
            organizer_email: Some("me@x.com".into()),
            attendees,
            external_actor_email: None,
        }
    }

    fn eligible_event() -> CalendarEvent {
        event(vec![
            attendee("me@x.com", Some(ResponseStatus::Accepted)),
            attendee("peer@x.com", Some(ResponseStatus::Accepted)),
        ])
    }

    #[test]
    fn plain_internal_meeting_is_eligible() {
        assert_eq!(
            classify(&eligible_event(), &config()),
            Outcome::Eligible {
                external_actor: None
            }
        );
    }

    #[test]
    fn reclaim_task_is_excluded_first() {
        let mut event = eligible_event();
        event.description = Some("Busy (via reclaim.ai)".into());
        assert_eq!(
            classify(&event, &config()),
            Outcome::Skip(SkipReason::ReclaimTask)
        );
    }

    #[test]
    fn all_day_event_is_excluded_regardless_of_other_fields() {
        let mut event = eligible_event();
        event.start = EventTime::AllDay("2025-03-01".parse().unwrap());
        event.end = EventTime::AllDay("2025-03-02".parse().unwrap());
        assert_eq!(classify(&event, &config()), Outcome::Skip(SkipReason::AllDay));
    }

    #[test]
    fn noproject_marker_is_case_insensitive() {
        let mut event = eligible_event();
        event.description = Some("planning #NoProject".into());
        assert_eq!(
            classify(&event, &config()),
            Outcome::Skip(SkipReason::NoProjectMarker)
        );
    }

    #[test]
    fn event_without_attendees_is_excluded() {
        let event = event(vec![]);
        assert_eq!(
            classify(&event, &config()),
            Outcome::Skip(SkipReason::NoAttendees)
        );
    }

    #[test]
    fn one_on_one_with_ignored_attendee_is_excluded() {
        let event = event(vec![
            attendee("me@x.com", Some(ResponseStatus::Accepted)),
            attendee("spam@y.com", None),
        ]);
        assert_eq!(
            classify(&event, &config()),
            Outcome::Skip(SkipReason::IgnoredOneOnOne {
                email: "spam@y.com".into()
            })
        );
    }

    #[test]
    fn ignored_attendee_with_third_party_is_not_excluded() {
        let event = event(vec![
            attendee("me@x.com", Some(ResponseStatus::Accepted)),
            attendee("spam@y.com", None),
            attendee("other@z.com", None),
        ]);
        assert!(matches!(
            classify(&event, &config()),
            Outcome::Eligible { .. }
        ));
    }

    #[test]
    fn ignored_check_removes_self_case_insensitively() {
        let event = event(vec![
            attendee("ME@X.com", Some(ResponseStatus::Accepted)),
            attendee("SPAM@Y.COM", None),
        ]);
        assert_eq!(
            classify(&event, &config()),
            Outcome::Skip(SkipReason::IgnoredOneOnOne {
                email: "SPAM@Y.COM".into()
            })
        );
    }

    #[test]
    fn external_organizer_resolves_external_attendee_as_actor() {
        let mut event = event(vec![
            attendee("me@x.com", Some(ResponseStatus::Accepted)),
            attendee("colleague@x.com", None),
            attendee("client@acme.com", None),
        ]);
        event.organizer_email = Some("scheduler@acme.com".into());
        assert_eq!(
            classify(&event, &config()),
            Outcome::Eligible {
                external_actor: Some("client@acme.com".into())
            }
        );
    }

    #[test]
    fn external_organizer_without_external_attendee_is_excluded() {
        let mut event = event(vec![
            attendee("me@x.com", Some(ResponseStatus::Accepted)),
            attendee("colleague@x.com", None),
        ]);
        event.organizer_email = Some("scheduler@acme.com".into());
        assert_eq!(
            classify(&event, &config()),
            Outcome::Skip(SkipReason::ExternalWithoutActor)
        );
    }

    #[test]
    fn foreign_invitation_requires_acceptance() {
        let mut event = event(vec![
            attendee("me@x.com", Some(ResponseStatus::Tentative)),
            attendee("host@x.com", Some(ResponseStatus::Accepted)),
        ]);
        event.organizer_email = Some("host@x.com".into());
        assert_eq!(
            classify(&event, &config()),
            Outcome::Skip(SkipReason::NotAccepted)
        );

        let mut accepted = event.clone();
        accepted.attendees[0].response_status = Some(ResponseStatus::Accepted);
        assert!(matches!(
            classify(&accepted, &config()),
            Outcome::Eligible { .. }
        ));
    }

    #[test]
    fn own_events_need_no_acceptance() {
        let event = event(vec![
            attendee("me@x.com", None),
            attendee("peer@x.com", Some(ResponseStatus::Accepted)),
        ]);
        assert!(matches!(
            classify(&event, &config()),
            Outcome::Eligible { .. }
        ));
    }

    #[test]
    fn acceptance_check_is_skipped_without_self_email() {
        let mut config = config();
        config.self_email = None;
        let mut event = event(vec![attendee("peer@x.com", None), attendee("me@x.com", None)]);
        event.organizer_email = Some("host@x.com".into());
        assert!(matches!(classify(&event, &config), Outcome::Eligible { .. }));
    }
}
