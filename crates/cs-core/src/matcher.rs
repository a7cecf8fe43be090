//! Project matching for calendar events.

use std::sync::LazyLock;

use regex::Regex;

use crate::event::CalendarEvent;
use crate::rules::RuleSet;

/// Inline description marker that overrides every other matching rule:
/// `#proj <name>`, the rest of the line taken verbatim.
static PROJECT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#proj[ \t]+([^\r\n]+)").expect("marker pattern is valid"));

/// Resolves the project name for an event.
///
/// Resolution order, first hit wins:
/// 1. a `#proj <name>` marker in the description
/// 2. the domain of the resolved external actor; no further fallback
///    once that field is present
/// 3. the first attendee, in original order, whose email domain has a
///    rule
/// 4. the rule set's `default` entry, only when fallback is enabled
///
/// Pure function: no I/O, no mutation, deterministic given its inputs.
pub fn match_project(event: &CalendarEvent, rules: &RuleSet) -> Option<String> {
    if let Some(description) = &event.description {
        if let Some(captures) = PROJECT_MARKER.captures(description) {
            return Some(captures[1].trim().to_string());
        }
    }

    if let Some(actor) = &event.external_actor_email {
        return domain_of(actor)
            .and_then(|domain| rules.project_for_domain(domain))
            .map(str::to_string);
    }

    for attendee in &event.attendees {
        if let Some(project) =
            domain_of(&attendee.email).and_then(|domain| rules.project_for_domain(domain))
        {
            return Some(project.to_string());
        }
    }

    rules.fallback().map(str::to_string)
}

/// Returns the part after the last `@`, or `None` for malformed
/// addresses.
fn domain_of(email: &str) -> Option<&str> {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
}
