//! Interfaces to the calendar source and the time-tracking sink.
//!
//! The synchronizer only ever talks to these traits; HTTP clients live
//! in their own crates and in-memory fakes back the tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::CalendarEvent;

/// Tag attached to every entry this tool creates. Purging is scoped to
/// entries carrying it, so foreign entries are never touched.
pub const BOT_TAG_NAME: &str = "calendar-sync-bot";

/// Errors surfaced by port implementations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The request never completed (connectivity, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),
    /// The remote API answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A project known to the time-tracking service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub archived: bool,
}

/// A tag known to the time-tracking service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// An existing time entry on the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
    pub project_id: Option<String>,
    pub tag_ids: Vec<String>,
}

/// A time entry to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeEntry {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
    pub project_id: Option<String>,
    pub tag_ids: Vec<String>,
}

/// Read-only source of calendar events.
#[async_trait]
pub trait CalendarSource {
    /// Fetches events overlapping `[start, end]`, ordered by start time.
    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, PortError>;
}

/// Time-entry CRUD against the tracking service.
///
/// Implementations own the per-run caches (projects, tags, user id);
/// methods take `&mut self` so a cache never outlives its run.
#[async_trait]
pub trait TimeTrackingSink {
    /// Lists every project in the workspace.
    async fn list_projects(&mut self) -> Result<Vec<Project>, PortError>;

    /// Resolves a project name to its id, case-insensitively, skipping
    /// archived projects.
    async fn resolve_project_id(&mut self, name: &str) -> Result<Option<String>, PortError>;

    /// Finds an existing tag by exact name.
    async fn find_tag(&mut self, name: &str) -> Result<Option<String>, PortError>;

    /// Finds a tag by exact name, creating it when missing.
    async fn ensure_tag(&mut self, name: &str) -> Result<String, PortError>;

    /// Lists the authenticated user's entries overlapping `[start, end]`.
    async fn list_entries(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>, PortError>;

    /// Creates a time entry and returns it as stored remotely.
    async fn create_entry(&mut self, entry: NewTimeEntry) -> Result<TimeEntry, PortError>;

    /// Deletes a time entry by id.
    async fn delete_entry(&mut self, id: &str) -> Result<(), PortError>;
}
