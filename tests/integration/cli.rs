//! Tests for the `archipel-installer` binary

use super::common::installer_command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_help_lists_options() {
    let temp = TempDir::new().unwrap();
    installer_command(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--silent"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--no-close"))
        .stdout(predicate::str::contains("--path"));
}

#[test]
fn test_invalid_forced_path_exits_with_path_error() {
    let temp = TempDir::new().unwrap();
    let home = temp.path().join("home");

    installer_command(&home)
        .arg("--silent")
        .arg("--path")
        .arg(temp.path().join("does-not-exist"))
        .assert()
        .code(3);

    // The run still wrote its log file
    let logs: Vec<_> = fs::read_dir(home.join("logs")).unwrap().collect();
    assert_eq!(logs.len(), 1);
    let log = fs::read_to_string(logs[0].as_ref().unwrap().path()).unwrap();
    assert!(log.contains("[ERROR]"));
    assert!(!home.join("config.json").exists());
}

#[test]
fn test_unknown_flag_is_rejected() {
    let temp = TempDir::new().unwrap();
    installer_command(temp.path())
        .arg("--frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--frobnicate"));
}
