//! Clockify integration for the synchronizer.
//!
//! Implements the [`TimeTrackingSink`] port against the Clockify v1
//! API. The client owns the per-run caches (current user id, projects,
//! tags): they are filled on first use and never refreshed, since none
//! of that data changes within a run.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use cs_core::{NewTimeEntry, PortError, Project, Tag, TimeEntry, TimeTrackingSink};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CLOCKIFY_API_URL: &str = "https://api.clockify.me/api/v1";

/// Largest page the API hands out; one page covers any realistic
/// workspace for this tool.
const PAGE_SIZE: &str = "200";

/// Client construction errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential was empty.
    #[error("invalid Clockify credential: {reason}")]
    InvalidCredential { reason: &'static str },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// Clockify API client with per-run caches.
pub struct ClockifyClient {
    http: reqwest::Client,
    api_key: String,
    workspace_id: String,
    base_url: String,
    user_id: Option<String>,
    projects: Option<Vec<Project>>,
    tags: Option<Vec<Tag>>,
}

impl fmt::Debug for ClockifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockifyClient")
            .field("api_key", &"[REDACTED]")
            .field("workspace_id", &self.workspace_id)
            .finish_non_exhaustive()
    }
}

impl ClockifyClient {
    /// Creates a new client for the given workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key or workspace id is empty or
    /// whitespace-only, or if the HTTP client fails to build.
    pub fn new(
        api_key: impl Into<String>,
        workspace_id: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        let workspace_id = workspace_id.into();

        if api_key.trim().is_empty() {
            return Err(ConfigError::InvalidCredential {
                reason: "API key cannot be empty",
            });
        }
        if workspace_id.trim().is_empty() {
            return Err(ConfigError::InvalidCredential {
                reason: "workspace id cannot be empty",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(ConfigError::ClientBuild)?;

        Ok(Self {
            http,
            api_key,
            workspace_id,
            base_url: CLOCKIFY_API_URL.to_string(),
            user_id: None,
            projects: None,
            tags: None,
        })
    }

    /// Points the client at a different API root. Used by tests.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn workspace_url(&self, suffix: &str) -> String {
        format!(
            "{}/workspaces/{}/{suffix}",
            self.base_url, self.workspace_id
        )
    }

    /// Current user id, fetched once. Time-entry listing is scoped per
    /// user, so every entry query needs it.
    async fn user_id(&mut self) -> Result<String, PortError> {
        if let Some(id) = &self.user_id {
            return Ok(id.clone());
        }
        let user: ApiUser = self
            .get_json(format!("{}/user", self.base_url), &[])
            .await?;
        tracing::debug!(user = %user.id, "resolved current user");
        self.user_id = Some(user.id.clone());
        Ok(user.id)
    }

    async fn cached_projects(&mut self) -> Result<Vec<Project>, PortError> {
        if let Some(projects) = &self.projects {
            return Ok(projects.clone());
        }
        let projects: Vec<ApiProject> = self
            .get_json(
                self.workspace_url("projects"),
                &[("page-size", PAGE_SIZE.to_string())],
            )
            .await?;
        let projects: Vec<Project> = projects
            .into_iter()
            .map(|project| Project {
                id: project.id,
                name: project.name,
                archived: project.archived,
            })
            .collect();
        tracing::debug!(count = projects.len(), "loaded workspace projects");
        self.projects = Some(projects.clone());
        Ok(projects)
    }

    async fn cached_tags(&mut self) -> Result<Vec<Tag>, PortError> {
        if let Some(tags) = &self.tags {
            return Ok(tags.clone());
        }
        let tags: Vec<ApiTag> = self
            .get_json(
                self.workspace_url("tags"),
                &[("page-size", PAGE_SIZE.to_string())],
            )
            .await?;
        let tags: Vec<Tag> = tags
            .into_iter()
            .map(|tag| Tag {
                id: tag.id,
                name: tag.name,
            })
            .collect();
        tracing::debug!(count = tags.len(), "loaded workspace tags");
        self.tags = Some(tags.clone());
        Ok(tags)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, PortError> {
        let response = self
            .http
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, PortError> {
        let response = self
            .http
            .post(url)
            .header("X-Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }
}

#[async_trait]
impl TimeTrackingSink for ClockifyClient {
    async fn list_projects(&mut self) -> Result<Vec<Project>, PortError> {
        self.cached_projects().await
    }

    async fn resolve_project_id(&mut self, name: &str) -> Result<Option<String>, PortError> {
        Ok(self
            .cached_projects()
            .await?
            .into_iter()
            .find(|project| !project.archived && project.name.eq_ignore_ascii_case(name))
            .map(|project| project.id))
    }

    async fn find_tag(&mut self, name: &str) -> Result<Option<String>, PortError> {
        Ok(self
            .cached_tags()
            .await?
            .into_iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.id))
    }

    async fn ensure_tag(&mut self, name: &str) -> Result<String, PortError> {
        if let Some(id) = self.find_tag(name).await? {
            return Ok(id);
        }
        let created: ApiTag = self
            .post_json(
                self.workspace_url("tags"),
                &serde_json::json!({ "name": name }),
            )
            .await?;
        tracing::info!(tag = %created.id, name = %created.name, "created tag");
        if let Some(tags) = &mut self.tags {
            tags.push(Tag {
                id: created.id.clone(),
                name: created.name,
            });
        }
        Ok(created.id)
    }

    async fn list_entries(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>, PortError> {
        let user_id = self.user_id().await?;
        let entries: Vec<ApiTimeEntry> = self
            .get_json(
                self.workspace_url(&format!("user/{user_id}/time-entries")),
                &[
                    ("start", rfc3339(start)),
                    ("end", rfc3339(end)),
                    ("page-size", PAGE_SIZE.to_string()),
                ],
            )
            .await?;
        // Running timers have no end yet; they are never bot-created and
        // cannot collide with a concrete interval.
        Ok(entries
            .into_iter()
            .filter_map(ApiTimeEntry::into_entry)
            .collect())
    }

    async fn create_entry(&mut self, entry: NewTimeEntry) -> Result<TimeEntry, PortError> {
        let request = CreateEntryRequest {
            start: rfc3339(entry.start),
            end: rfc3339(entry.end),
            description: entry.description,
            project_id: entry.project_id,
            tag_ids: entry.tag_ids,
        };
        let created: ApiTimeEntry = self
            .post_json(self.workspace_url("time-entries"), &request)
            .await?;
        created.into_entry().ok_or_else(|| {
            PortError::InvalidResponse("created entry has no end timestamp".to_string())
        })
    }

    async fn delete_entry(&mut self, id: &str) -> Result<(), PortError> {
        let response = self
            .http
            .delete(self.workspace_url(&format!("time-entries/{id}")))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(transport)?;
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(())
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn transport(err: reqwest::Error) -> PortError {
    PortError::Transport(err.to_string())
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PortError> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(api_error(status.as_u16(), &body));
    }
    serde_json::from_str(&body).map_err(|err| PortError::InvalidResponse(err.to_string()))
}

fn api_error(status: u16, body: &str) -> PortError {
    #[derive(Deserialize)]
    struct ErrorPayload {
        message: String,
    }

    let message = serde_json::from_str::<ErrorPayload>(body)
        .map_or_else(|_| body.to_string(), |payload| payload.message);
    PortError::Api { status, message }
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiProject {
    id: String,
    name: String,
    #[serde(default)]
    archived: bool,
}

#[derive(Debug, Deserialize)]
struct ApiTag {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTimeEntry {
    id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    tag_ids: Option<Vec<String>>,
    time_interval: ApiTimeInterval,
}

#[derive(Debug, Deserialize)]
struct ApiTimeInterval {
    start: DateTime<Utc>,
    #[serde(default)]
    end: Option<DateTime<Utc>>,
}

impl ApiTimeEntry {
    fn into_entry(self) -> Option<TimeEntry> {
        let end = self.time_interval.end?;
        Some(TimeEntry {
            id: self.id,
            start: self.time_interval.start,
            end,
            description: self.description,
            project_id: self.project_id,
            tag_ids: self.tag_ids.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateEntryRequest {
    start: String,
    end: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tag_ids: Vec<String>,
}
