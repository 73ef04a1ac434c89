//! Operator CLI tests
//!
//! Each test runs the `stageboard` binary against a board file in its own
//! temporary directory, so no configuration from the working tree leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn stageboard(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stageboard").unwrap();
    cmd.current_dir(dir.path())
        .env("RUST_LOG", "error")
        .arg("--board")
        .arg(dir.path().join("board.json"));
    cmd
}

#[test]
fn test_no_subcommand_shows_getting_started() {
    let dir = TempDir::new().unwrap();
    stageboard(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("stageboard watch --audio"))
        .stdout(predicate::str::contains("stageboard add <tag>"));
}

#[test]
fn test_add_enqueue_advance_then_list() {
    let dir = TempDir::new().unwrap();
    stageboard(&dir)
        .args(["add", "A-12", "--category", "small"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added #1 A-12 (small) to barn"));
    stageboard(&dir)
        .args(["enqueue", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#1 A-12: barn -> queued"));
    stageboard(&dir)
        .args(["advance", "#1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("queued -> processing"));

    stageboard(&dir)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PROCESSING"))
        .stdout(predicate::str::contains("(large 0, small 1)"));
}

#[test]
fn test_rejected_transition_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    stageboard(&dir).args(["add", "B-1"]).assert().success();
    stageboard(&dir)
        .args(["dequeue", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot dequeue"));
    stageboard(&dir)
        .args(["advance", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_announce_requires_text() {
    let dir = TempDir::new().unwrap();
    stageboard(&dir)
        .args(["announce", "   "])
        .assert()
        .failure();
    stageboard(&dir)
        .args(["announce", "Dock 3 closed", "--duration-secs", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("for 30s"));
}

#[test]
fn test_custom_sound_needs_reference() {
    let dir = TempDir::new().unwrap();
    stageboard(&dir).args(["sound", "custom"]).assert().failure();
    stageboard(&dir)
        .args(["sound", "custom", "/srv/sounds/gong.wav"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/srv/sounds/gong.wav"));
}

#[test]
fn test_list_json_has_every_column() {
    let dir = TempDir::new().unwrap();
    stageboard(&dir).args(["add", "C-2"]).assert().success();
    let output = stageboard(&dir).args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["columns"].as_array().unwrap().len(), 6);
    assert_eq!(value["columns"][0]["stage"], "barn");
}
