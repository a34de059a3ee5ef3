// ABOUTME: Integration tests for the cricheck CLI commands.
// ABOUTME: Validates --help output, init behavior, and selfcheck runs.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn cricheck_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("cricheck"))
}

#[test]
fn help_shows_commands() {
    cricheck_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("selfcheck"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn init_creates_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("cricheck.yml");

    cricheck_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .success();

    assert!(config_path.exists(), "cricheck.yml should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("socket:"), "config should have socket field");
    assert!(
        content.contains("poll_interval:"),
        "config should have polling fields"
    );
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("cricheck.yml");

    fs::write(&config_path, "existing: config").unwrap();

    cricheck_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_force_overwrites() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("cricheck.yml");

    fs::write(&config_path, "existing: config").unwrap();

    cricheck_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--force"])
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("socket:"));
}

#[test]
fn selfcheck_passes_against_the_fake_backend() {
    let temp_dir = tempfile::tempdir().unwrap();

    cricheck_cmd()
        .current_dir(temp_dir.path())
        .arg("selfcheck")
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS"));
}

#[test]
fn selfcheck_json_emits_a_report() {
    let temp_dir = tempfile::tempdir().unwrap();

    let assert = cricheck_cmd()
        .current_dir(temp_dir.path())
        .args(["--json", "selfcheck"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let last_line = stdout.lines().last().expect("json output expected");
    let report: serde_json::Value = serde_json::from_str(last_line).expect("final line is JSON");
    assert!(report["scenarios"].is_array());
    assert!(
        report["scenarios"]
            .as_array()
            .unwrap()
            .iter()
            .all(|s| s["status"] == "passed"),
        "all selfcheck scenarios should pass: {report}"
    );
}

#[test]
fn run_fails_cleanly_when_socket_is_unreachable() {
    let temp_dir = tempfile::tempdir().unwrap();

    cricheck_cmd()
        .current_dir(temp_dir.path())
        .args(["run", "--socket", "/nonexistent/engine.sock"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
