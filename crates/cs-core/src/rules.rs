//! Domain-to-project rule sets.

use std::collections::HashMap;

/// Reserved rules-file key naming the fallback project.
pub const DEFAULT_RULE_KEY: &str = "default";

/// Mapping from attendee email domains to project names.
///
/// Loaded once per run from a flat map (the rules file); immutable
/// during processing. Domain keys are lowercased on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    domains: HashMap<String, String>,
    default: Option<String>,
    use_default_fallback: bool,
}

impl RuleSet {
    /// Builds a rule set from a flat mapping as loaded from the rules
    /// file. The reserved `default` key names the fallback project;
    /// every other key is an email domain.
    pub fn from_map(map: HashMap<String, String>) -> Self {
        let mut domains = HashMap::new();
        let mut default = None;
        for (key, project) in map {
            if key.eq_ignore_ascii_case(DEFAULT_RULE_KEY) {
                default = Some(project);
            } else {
                domains.insert(key.to_lowercase(), project);
            }
        }
        Self {
            domains,
            default,
            use_default_fallback: false,
        }
    }

    /// Enables or disables consulting the `default` entry when no domain
    /// rule matches. Disabled unless explicitly requested.
    #[must_use]
    pub fn with_default_fallback(mut self, enabled: bool) -> Self {
        self.use_default_fallback = enabled;
        self
    }

    /// Looks up the project mapped to an email domain.
    pub fn project_for_domain(&self, domain: &str) -> Option<&str> {
        self.domains.get(&domain.to_lowercase()).map(String::as_str)
    }

    /// Returns the fallback project when fallback is both enabled and
    /// configured.
    pub fn fallback(&self) -> Option<&str> {
        if self.use_default_fallback {
            self.default.as_deref()
        } else {
            None
        }
    }

    /// Returns true when no domain rules are configured.
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
