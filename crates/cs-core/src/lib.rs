//! Core domain logic for the calendar-to-timesheet synchronizer.
//!
//! This crate contains the fundamental types and logic for:
//! - Classification: deciding which calendar events are worth logging
//! - Matching: resolving events to time-tracking projects via a rule set
//! - Synchronization: the idempotent day-by-day entry creation loop
//! - Purging: tag-scoped deletion of previously created entries

pub mod classify;
pub mod event;
pub mod matcher;
pub mod ports;
pub mod purge;
pub mod rules;
pub mod sync;

pub use classify::{ExclusionConfig, Outcome, SkipReason, classify};
pub use event::{Attendee, CalendarEvent, EventTime, ResponseStatus};
pub use matcher::match_project;
pub use ports::{
    BOT_TAG_NAME, CalendarSource, NewTimeEntry, PortError, Project, Tag, TimeEntry,
    TimeTrackingSink,
};
pub use purge::purge_day;
pub use rules::RuleSet;
pub use sync::{MAX_RANGE_DAYS, SyncError, SyncOptions, SyncReport, Synchronizer};
