//! Binary smoke tests

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `td` with HOME and XDG dirs pointed into a scratch directory so no real
/// config is read and logs land in the sandbox
fn td(sandbox: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("td").expect("td binary should build");
    cmd.current_dir(sandbox.path())
        .env("HOME", sandbox.path())
        .env("XDG_CONFIG_HOME", sandbox.path().join("config"))
        .env("XDG_DATA_HOME", sandbox.path().join("data"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let sandbox = TempDir::new().unwrap();
    td(&sandbox)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("submit"))
        .stdout(predicate::str::contains("workers"));
}

#[test]
fn test_config_prints_defaults() {
    let sandbox = TempDir::new().unwrap();
    td(&sandbox)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("127.0.0.1:8080"))
        .stdout(predicate::str::contains("lru-capacity: 10"))
        .stdout(predicate::str::contains("selector: per-submission"));
}

#[test]
fn test_config_reads_explicit_file() {
    let sandbox = TempDir::new().unwrap();
    let path = sandbox.path().join("custom.yml");
    fs::write(&path, "queue:\n  capacity: 7\nscheduler:\n  default-mechanism: LRU\n").unwrap();

    td(&sandbox)
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("capacity: 7"))
        .stdout(predicate::str::contains("default-mechanism: LRU"));
}

#[test]
fn test_config_reads_project_local_file() {
    let sandbox = TempDir::new().unwrap();
    fs::write(sandbox.path().join(".taskdispatch.yml"), "server:\n  bind: 127.0.0.1:9999\n").unwrap();

    td(&sandbox)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("127.0.0.1:9999"));
}

#[test]
fn test_logs_written_under_data_dir() {
    let sandbox = TempDir::new().unwrap();
    td(&sandbox).arg("config").assert().success();
    assert!(sandbox.path().join("data/taskdispatch/logs/taskdispatch.log").exists());
}

#[test]
fn test_submit_without_server_fails() {
    let sandbox = TempDir::new().unwrap();
    td(&sandbox)
        .args(["--server", "http://127.0.0.1:1", "submit", "build", "--stream", "ci"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to reach server"));
}

#[test]
fn test_task_rejects_malformed_id() {
    let sandbox = TempDir::new().unwrap();
    td(&sandbox)
        .args(["task", "not-a-uuid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid task id"));
}
