//! Calendar events as returned by the calendar source.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Start or end of a calendar event.
///
/// All-day events carry a plain date instead of an instant; the
/// classifier excludes them from logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    /// A timezone-aware instant.
    At(DateTime<Utc>),
    /// A date-only marker for all-day events.
    AllDay(NaiveDate),
}

impl EventTime {
    /// Returns the instant for timed events, or `None` for all-day markers.
    pub const fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::At(at) => Some(*at),
            Self::AllDay(_) => None,
        }
    }

    /// Returns true for date-only markers.
    pub const fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }
}

/// Invitation response recorded for an attendee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    NeedsAction,
    Declined,
    Tentative,
    Accepted,
}

/// One invited participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<ResponseStatus>,
}

/// A calendar event within the query window.
///
/// Events are per-run scratch values: the calendar source creates them,
/// the pipeline consumes them once, nothing persists them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    /// Event title as shown in the calendar UI.
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer_email: Option<String>,
    /// Attendees in the order the calendar reported them.
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    /// Set at most once by the classifier when an external attendee
    /// stands in for an external organizer; read-only afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_actor_email: Option<String>,
}

impl CalendarEvent {
    /// Returns true when the event spans whole days rather than a
    /// concrete time range.
    pub const fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_roundtrip() {
        let event = CalendarEvent {
            id: "evt-1".into(),
            summary: "Design review".into(),
            description: Some("weekly".into()),
            start: EventTime::At("2025-03-01T10:00:00Z".parse().unwrap()),
            end: EventTime::At("2025-03-01T11:00:00Z".parse().unwrap()),
            organizer_email: Some("host@corp.com".into()),
            attendees: vec![Attendee {
                email: "guest@example.com".into(),
                response_status: Some(ResponseStatus::Accepted),
            }],
            external_actor_email: None,
        };

        let json = serde_json::to_string(&event).unwrap();
        let parsed: CalendarEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, event);
    }

    #[test]
    fn response_status_uses_calendar_api_casing() {
        let status: ResponseStatus = serde_json::from_str("\"needsAction\"").unwrap();
        assert_eq!(status, ResponseStatus::NeedsAction);
        assert_eq!(
            serde_json::to_string(&ResponseStatus::Accepted).unwrap(),
            "\"accepted\""
        );
    }

    #[test]
    fn all_day_marker_has_no_instant() {
        let time = EventTime::AllDay("2025-03-01".parse().unwrap());
        assert!(time.is_all_day());
        assert!(time.instant().is_none());

        let timed = EventTime::At("2025-03-01T09:00:00Z".parse().unwrap());
        assert!(!timed.is_all_day());
        assert!(timed.instant().is_some());
    }
}
