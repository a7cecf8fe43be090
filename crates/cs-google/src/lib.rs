//! Google Calendar integration for the synchronizer.
//!
//! A thin read-only client for the Calendar v3 events endpoint. It maps
//! API items into [`cs_core::CalendarEvent`] and implements the
//! [`CalendarSource`] port; everything interesting happens downstream.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};
use serde::Deserialize;
use thiserror::Error;

use cs_core::{Attendee, CalendarEvent, CalendarSource, EventTime, PortError, ResponseStatus};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const GOOGLE_API_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Client construction errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential was empty.
    #[error("invalid calendar credential: {reason}")]
    InvalidCredential { reason: &'static str },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// Google Calendar events client.
pub struct CalendarClient {
    http: reqwest::Client,
    token: String,
    calendar_id: String,
    base_url: String,
}

impl fmt::Debug for CalendarClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarClient")
            .field("token", &"[REDACTED]")
            .field("calendar_id", &self.calendar_id)
            .finish_non_exhaustive()
    }
}

impl CalendarClient {
    /// Creates a new client with the given access token and calendar id.
    ///
    /// # Errors
    ///
    /// Returns an error if either credential is empty or whitespace-only,
    /// or if the HTTP client fails to build.
    pub fn new(token: impl Into<String>, calendar_id: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        let calendar_id = calendar_id.into();

        if token.trim().is_empty() {
            return Err(ConfigError::InvalidCredential {
                reason: "access token cannot be empty",
            });
        }
        if calendar_id.trim().is_empty() {
            return Err(ConfigError::InvalidCredential {
                reason: "calendar id cannot be empty",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(ConfigError::ClientBuild)?;

        Ok(Self {
            http,
            token,
            calendar_id,
            base_url: GOOGLE_API_URL.to_string(),
        })
    }

    /// Points the client at a different API root. Used by tests.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches single (non-recurring-expanded) events between the given
    /// instants, ordered by start time.
    pub async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, PortError> {
        let url = format!("{}/calendars/{}/events", self.base_url, self.calendar_id);
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(&[
                ("timeMin", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("timeMax", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let payload: EventsResponse = serde_json::from_str(&body)
            .map_err(|err| PortError::InvalidResponse(err.to_string()))?;
        tracing::debug!(count = payload.items.len(), "fetched calendar events");

        payload
            .items
            .into_iter()
            .map(ApiEvent::into_event)
            .collect()
    }
}

#[async_trait]
impl CalendarSource for CalendarClient {
    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, PortError> {
        self.list_events(start, end).await
    }
}

fn transport(err: reqwest::Error) -> PortError {
    PortError::Transport(err.to_string())
}

fn api_error(status: u16, body: &str) -> PortError {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    let message = serde_json::from_str::<ErrorPayload>(body)
        .map_or_else(|_| body.to_string(), |payload| payload.error.message);
    PortError::Api { status, message }
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
}

#[derive(Debug, Deserialize)]
struct ApiEvent {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    start: ApiEventTime,
    end: ApiEventTime,
    #[serde(default)]
    organizer: Option<ApiOrganizer>,
    #[serde(default)]
    attendees: Vec<ApiAttendee>,
}

impl ApiEvent {
    fn into_event(self) -> Result<CalendarEvent, PortError> {
        Ok(CalendarEvent {
            id: self.id,
            summary: self.summary.unwrap_or_else(|| "No title".to_string()),
            description: self.description,
            start: self.start.into_event_time()?,
            end: self.end.into_event_time()?,
            organizer_email: self.organizer.and_then(|organizer| organizer.email),
            attendees: self
                .attendees
                .into_iter()
                .map(|attendee| Attendee {
                    email: attendee.email,
                    response_status: attendee.response_status,
                })
                .collect(),
            external_actor_email: None,
        })
    }
}

/// Either `dateTime` for timed events or `date` for all-day events.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    #[serde(default)]
    date_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    date: Option<NaiveDate>,
}

impl ApiEventTime {
    fn into_event_time(self) -> Result<EventTime, PortError> {
        match (self.date_time, self.date) {
            (Some(at), _) => Ok(EventTime::At(at.with_timezone(&Utc))),
            (None, Some(date)) => Ok(EventTime::AllDay(date)),
            (None, None) => Err(PortError::InvalidResponse(
                "event time carries neither dateTime nor date".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiOrganizer {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAttendee {
    email: String,
    #[serde(default)]
    response_status: Option<ResponseStatus>,
}
