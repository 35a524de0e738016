//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_pomogrande-cli"))
        .args(args)
        .env("POMOGRANDE_DATA_DIR", data_dir)
        .env("POMOGRANDE_LOG", "off")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (code, stdout, stderr) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("output is JSON")
}

#[test]
fn test_settings_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["settings", "set", "workTime", "1800000"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let value = run_json(dir.path(), &["settings", "get", "workTime"]);
    assert_eq!(value, 1_800_000);
}

#[test]
fn test_settings_reject_lifecycle_fields() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["settings", "set", "isRunning", "true"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_settings_reject_bad_values() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["settings", "set", "soundVolume", "1.5"]);
    assert_ne!(code, 0);
    let (code, _, _) = run_cli(dir.path(), &["settings", "set", "noSuchField", "1"]);
    assert_ne!(code, 0);
    let (code, stdout, stderr) = run_cli(dir.path(), &["settings", "set", "workTime", "0"]);
    assert_ne!(code, 0);
    assert!(stdout.is_empty());
    assert!(stderr.contains("greater than zero"));
}

#[test]
fn test_settings_list_has_only_settings() {
    let dir = tempfile::tempdir().unwrap();
    let settings = run_json(dir.path(), &["settings", "list"]);
    let settings = settings.as_object().unwrap();
    assert!(settings.contains_key("workTime"));
    assert!(settings.contains_key("isAutoStartEnabled"));
    assert!(!settings.contains_key("time"));
    assert!(!settings.contains_key("pomodoroHistory"));
}

#[test]
fn test_todo_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let todo = run_json(dir.path(), &["todo", "add", "Write report"]);
    let id = todo["id"].as_str().unwrap().to_string();
    assert_eq!(todo["isCompleted"], false);

    let done = run_json(dir.path(), &["todo", "done", &id]);
    assert_eq!(done["isCompleted"], true);

    let list = run_json(dir.path(), &["todo", "list"]);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (code, _, _) = run_cli(dir.path(), &["todo", "remove", &id]);
    assert_eq!(code, 0);
    let list = run_json(dir.path(), &["todo", "list"]);
    assert!(list.as_array().unwrap().is_empty());

    let (code, _, _) = run_cli(dir.path(), &["todo", "done", &id]);
    assert_ne!(code, 0);
}

#[test]
fn test_sites_block_and_check() {
    let dir = tempfile::tempdir().unwrap();
    let list = run_json(dir.path(), &["sites", "block", "www.example.com"]);
    assert!(list["blockedSites"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("example.com")));

    let (_, stdout, _) = run_cli(dir.path(), &["sites", "check", "https://www.example.com/a"]);
    assert_eq!(stdout.trim(), "blocked");

    run_json(dir.path(), &["sites", "allow", "https://example.com/docs"]);
    let (_, stdout, _) = run_cli(dir.path(), &["sites", "check", "https://example.com/docs"]);
    assert_eq!(stdout.trim(), "allowed");

    run_json(dir.path(), &["sites", "unblock", "example.com"]);
    let (_, stdout, _) = run_cli(dir.path(), &["sites", "check", "https://example.com/a"]);
    assert_eq!(stdout.trim(), "allowed");
}

#[test]
fn test_sites_default_list() {
    let dir = tempfile::tempdir().unwrap();
    let list = run_json(dir.path(), &["sites", "list"]);
    assert_eq!(list["blockedSites"].as_array().unwrap().len(), 8);
}

#[test]
fn test_timer_commands_are_queued() {
    let dir = tempfile::tempdir().unwrap();
    let queued = run_json(dir.path(), &["timer", "start"]);
    assert_eq!(queued["queued"], "start-timer");

    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["phase"]["state"], "idle");
    assert_eq!(status["clock"], "25:00");
}

#[test]
fn test_stats_on_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run_json(dir.path(), &["stats", "all"]);
    assert_eq!(summary["all_time"]["pomodoros"], 0);

    let history = run_json(dir.path(), &["stats", "history", "--days", "7"]);
    assert!(history.as_array().unwrap().is_empty());
}

#[test]
fn test_config_get_set_reset() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.tick_interval_ms"]);
    assert_eq!(stdout.trim(), "1000");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "defaults.work_min", "50"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "defaults.work_min"]);
    assert_eq!(stdout.trim(), "50");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "defaults.work_min", "0"]);
    assert_ne!(code, 0);

    run_cli(dir.path(), &["config", "reset"]);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "defaults.work_min"]);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Unknown configuration key"));
}

#[test]
fn test_completions() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("pomogrande-cli"));
}
