//! Rules file loading.
//!
//! The rules file is a flat YAML mapping from email domain to project
//! name; the reserved `default` key names the fallback project:
//!
//! ```yaml
//! acme.com: Acme Retainer
//! example.org: Example
//! default: General
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use cs_core::RuleSet;

/// Loads the rule set from a YAML rules file.
pub fn load_rules(path: &Path, use_default_fallback: bool) -> Result<RuleSet> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file {}", path.display()))?;
    let map: HashMap<String, String> = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse rules file {}", path.display()))?;
    Ok(RuleSet::from_map(map).with_default_fallback(use_default_fallback))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_rules(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_flat_domain_mapping() {
        let file = write_rules("acme.com: Acme\nExample.ORG: Example\ndefault: General\n");
        let rules = load_rules(file.path(), false).unwrap();

        assert_eq!(rules.project_for_domain("acme.com"), Some("Acme"));
        assert_eq!(rules.project_for_domain("example.org"), Some("Example"));
        assert_eq!(rules.fallback(), None);
    }

    #[test]
    fn fallback_flag_is_threaded_through() {
        let file = write_rules("default: General\n");
        let rules = load_rules(file.path(), true).unwrap();
        assert_eq!(rules.fallback(), Some("General"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rules(&dir.path().join("missing.yaml"), false).unwrap_err();
        assert!(err.to_string().contains("failed to read rules file"));
    }

    #[test]
    fn non_mapping_file_is_an_error() {
        let file = write_rules("- just\n- a\n- list\n");
        assert!(load_rules(file.path(), false).is_err());
    }
}
