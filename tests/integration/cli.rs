//! Flag parsing and exit codes of the helper binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn helper() -> Command {
    let mut cmd = Command::cargo_bin("update-helper-cli").unwrap();
    cmd.env_remove("UPDATE_HELPER_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_flags() {
    helper()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--kill"))
        .stdout(predicate::str::contains("--rename"))
        .stdout(predicate::str::contains("--cleanup"))
        .stdout(predicate::str::contains("--execute"));
}

#[test]
fn test_version() {
    helper().arg("--version").assert().success().stdout(predicate::str::contains("update-helper-cli"));
}

#[test]
fn test_unknown_flag_is_usage_error() {
    helper()
        .args(["--source", "a", "--target", "b", "--bogus"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage error"))
        .stderr(predicate::str::contains("--help"));
}

#[test]
fn test_positional_argument_is_rejected() {
    helper().args(["--source", "a", "--target", "b", "extra"]).assert().code(1);
}

#[test]
fn test_execute_and_open_conflict() {
    helper()
        .args(["-s", "a", "-t", "b", "-e", "true", "-o", "b"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage error"));
}

#[test]
fn test_missing_source_is_configuration_error() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("target.txt");
    std::fs::write(&target, "OLD").unwrap();

    helper()
        .arg("--target")
        .arg(&target)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("source"));

    // Nothing was touched
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "OLD");
}

#[test]
fn test_unreadable_source_is_permission_error() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("target.txt");
    std::fs::write(&target, "OLD").unwrap();

    helper()
        .arg("--source")
        .arg(temp.path().join("missing.txt"))
        .arg("--target")
        .arg(&target)
        .arg("--rename")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Permission denied"));

    assert_eq!(std::fs::read_to_string(&target).unwrap(), "OLD");
    assert!(!temp.path().join("target.txt.old").exists());
}

#[test]
fn test_invalid_config_file_fails() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("helper.toml");
    std::fs::write(&config, "post_action_grace_ms = \"soon\"").unwrap();

    helper()
        .env("UPDATE_HELPER_CONFIG", &config)
        .args(["--source", "a", "--target", "b"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config"));
}
