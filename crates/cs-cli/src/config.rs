//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub google: GoogleConfig,
    pub clockify: ClockifyConfig,
    #[serde(default)]
    pub exclusions: ExclusionSettings,
    /// Path to the rules file.
    #[serde(default = "default_rules_path")]
    pub rules_path: PathBuf,
    /// Append-mode diagnostic log for triaging skips and warnings after
    /// a run.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    /// Consult the rules file's `default` entry when no domain matches.
    #[serde(default)]
    pub use_default_fallback: bool,
}

/// Calendar source credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub access_token: String,
    pub calendar_id: String,
}

/// Time-tracking sink credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClockifyConfig {
    pub api_key: String,
    pub workspace_id: String,
}

/// Classifier settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExclusionSettings {
    #[serde(default)]
    pub ignored_emails: Vec<String>,
    #[serde(default)]
    pub self_email: Option<String>,
    /// Suffix identifying organization members, e.g. `@corp.com`.
    #[serde(default)]
    pub organization_domain: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("google.calendar_id", &self.google.calendar_id)
            .field("clockify.workspace_id", &self.clockify.workspace_id)
            .field("exclusions", &self.exclusions)
            .field("rules_path", &self.rules_path)
            .field("log_path", &self.log_path)
            .field("use_default_fallback", &self.use_default_fallback)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Layering, later wins: default config location, the given file,
    /// `CALSYNC_*` environment variables (`__` separates sections, e.g.
    /// `CALSYNC_CLOCKIFY__API_KEY`).
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::new();

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (CALSYNC_*)
        figment = figment.merge(Env::prefixed("CALSYNC_").split("__"));

        figment.extract()
    }

    /// The classifier's view of the exclusion settings.
    pub fn exclusion_config(&self) -> cs_core::ExclusionConfig {
        cs_core::ExclusionConfig {
            ignored_emails: self.exclusions.ignored_emails.clone(),
            self_email: self.exclusions.self_email.clone(),
            organization_domain: self.exclusions.organization_domain.clone(),
        }
    }
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("rules.yaml")
}

fn default_log_path() -> PathBuf {
    dirs_state_path()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("calsync.log")
}

/// Returns the platform-specific config directory for calsync.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("calsync"))
}

/// Returns the platform-specific state directory for calsync.
///
/// On Linux: `~/.local/state/calsync`
pub fn dirs_state_path() -> Option<PathBuf> {
    dirs::state_dir().map(|p| p.join("calsync"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const MINIMAL: &str = r#"
[google]
access_token = "token-1"
calendar_id = "primary"

[clockify]
api_key = "key-1"
workspace_id = "ws-1"
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let file = write_config(MINIMAL);
        let config = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(config.google.calendar_id, "primary");
        assert_eq!(config.clockify.workspace_id, "ws-1");
        assert_eq!(config.rules_path, PathBuf::from("rules.yaml"));
        assert!(!config.use_default_fallback);
        assert!(config.exclusions.ignored_emails.is_empty());
    }

    #[test]
    fn full_config_overrides_defaults() {
        let file = write_config(
            r#"
rules_path = "/etc/calsync/rules.yaml"
use_default_fallback = true

[google]
access_token = "token-1"
calendar_id = "work@corp.com"

[clockify]
api_key = "key-1"
workspace_id = "ws-1"

[exclusions]
ignored_emails = ["spam@y.com"]
self_email = "me@corp.com"
organization_domain = "@corp.com"
"#,
        );
        let config = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(config.exclusions.self_email.as_deref(), Some("me@corp.com"));
        assert_eq!(config.exclusions.organization_domain, "@corp.com");
        assert_eq!(config.rules_path, PathBuf::from("/etc/calsync/rules.yaml"));
        assert!(config.use_default_fallback);

        let exclusions = config.exclusion_config();
        assert_eq!(exclusions.ignored_emails, vec!["spam@y.com".to_string()]);
    }

    #[test]
    fn missing_credentials_fail_to_load() {
        let file = write_config("[google]\naccess_token = \"token-1\"\n");
        assert!(Config::load_from(Some(file.path())).is_err());
    }

    #[test]
    fn config_debug_redacts_credentials() {
        let file = write_config(MINIMAL);
        let config = Config::load_from(Some(file.path())).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("token-1"));
        assert!(!debug.contains("key-1"));
    }
}
