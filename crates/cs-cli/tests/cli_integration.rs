//! Integration tests for the calsync CLI.
//!
//! These drive the built binary directly. Everything here fails before
//! any network call would be made: argument parsing, configuration
//! loading, range validation, rules loading.

use std::io::Write;
use std::process::Command;

use tempfile::TempDir;

fn calsync() -> Command {
    Command::new(env!("CARGO_BIN_EXE_calsync"))
}

/// Writes a config with fake credentials and a valid rules file into a
/// temp dir, returning the dir and the config path.
fn fixture() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();

    let rules_path = dir.path().join("rules.yaml");
    std::fs::write(&rules_path, "acme.com: Acme\n").unwrap();

    let log_path = dir.path().join("calsync.log");
    let config_path = dir.path().join("config.toml");
    let mut config = std::fs::File::create(&config_path).unwrap();
    writeln!(
        config,
        r#"
rules_path = "{}"
log_path = "{}"

[google]
access_token = "fake-token"
calendar_id = "primary"

[clockify]
api_key = "fake-key"
workspace_id = "ws-1"
"#,
        rules_path.display(),
        log_path.display(),
    )
    .unwrap();

    (dir, config_path)
}

#[test]
fn help_lists_subcommands() {
    let output = calsync().arg("--help").output().expect("run calsync --help");

    assert!(output.status.success());
    let help_text = String::from_utf8_lossy(&output.stdout);
    assert!(help_text.contains("sync"), "expected 'sync' in: {help_text}");
    assert!(
        help_text.contains("projects"),
        "expected 'projects' in: {help_text}"
    );
}

#[test]
fn sync_help_shows_range_and_mode_flags() {
    let output = calsync()
        .arg("sync")
        .arg("--help")
        .output()
        .expect("run calsync sync --help");

    assert!(output.status.success());
    let help_text = String::from_utf8_lossy(&output.stdout);
    for flag in ["--start", "--end", "--simulate", "--purge", "--rules"] {
        assert!(help_text.contains(flag), "expected {flag} in: {help_text}");
    }
}

#[test]
fn sync_rejects_malformed_dates() {
    let output = calsync()
        .arg("sync")
        .arg("--start")
        .arg("not-a-date")
        .arg("--end")
        .arg("2025-03-01")
        .output()
        .expect("run calsync sync");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid value"),
        "expected clap parse error in: {stderr}"
    );
}

#[test]
fn sync_rejects_reversed_range() {
    let (_dir, config_path) = fixture();
    let output = calsync()
        .arg("--config")
        .arg(&config_path)
        .arg("sync")
        .arg("--start")
        .arg("2025-03-02")
        .arg("--end")
        .arg("2025-03-01")
        .output()
        .expect("run calsync sync");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid date range"),
        "expected range error in: {stderr}"
    );
}

#[test]
fn sync_rejects_overlong_range() {
    let (_dir, config_path) = fixture();
    let output = calsync()
        .arg("--config")
        .arg(&config_path)
        .arg("sync")
        .arg("--start")
        .arg("2025-03-01")
        .arg("--end")
        .arg("2025-04-15")
        .output()
        .expect("run calsync sync");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid date range"),
        "expected range error in: {stderr}"
    );
}

#[test]
fn sync_requires_a_readable_rules_file() {
    let (dir, config_path) = fixture();
    std::fs::remove_file(dir.path().join("rules.yaml")).unwrap();

    let output = calsync()
        .arg("--config")
        .arg(&config_path)
        .arg("sync")
        .arg("--start")
        .arg("2025-03-01")
        .arg("--end")
        .arg("2025-03-01")
        .output()
        .expect("run calsync sync");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to read rules file"),
        "expected rules error in: {stderr}"
    );
}

#[test]
fn missing_configuration_fails_before_any_work() {
    let dir = TempDir::new().unwrap();
    let output = calsync()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("sync")
        .arg("--start")
        .arg("2025-03-01")
        .arg("--end")
        .arg("2025-03-01")
        .env_remove("CALSYNC_GOOGLE__ACCESS_TOKEN")
        .env_remove("CALSYNC_CLOCKIFY__API_KEY")
        .output()
        .expect("run calsync sync");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to load configuration"),
        "expected configuration error in: {stderr}"
    );
}
