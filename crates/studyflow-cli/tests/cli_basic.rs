//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Each test
//! points HOME at its own temp dir so the user's config is never touched.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command with optional stdin and return (code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str], stdin: &str) -> (i32, String, String) {
    let mut child = Command::new("cargo")
        .args(["run", "-q", "-p", "studyflow-cli", "--"])
        .args(args)
        .env("HOME", home)
        .env_remove("STUDYFLOW_ENV")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .expect("stdin piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");
    let output = child.wait_with_output().expect("Failed to wait for CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);
    (code, stdout, stderr)
}

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

#[test]
fn test_config_get_default() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "timer.focus_minutes"], "");
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_config_set_persists() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "set", "timer.daily_goal", "6"], "");
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "timer.daily_goal"], "");
    assert_eq!(stdout.trim(), "6");
}

#[test]
fn test_config_set_rejects_zero_duration() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["config", "set", "timer.focus_minutes", "0"], "");
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_unknown_key_fails() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "get", "timer.nope"], "");
    assert_ne!(code, 0);
}

#[test]
fn test_config_list_json() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "list"], "");
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["timer"]["long_break_minutes"], 15);
}

#[test]
fn test_timer_preview_uses_overrides() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["timer", "preview", "--focus", "50"], "");
    assert_eq!(code, 0);
    let snap: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(snap["phase"], "focus");
    assert_eq!(snap["formatted_remaining"], "50:00");
    assert_eq!(snap["state"], "idle");
}

#[test]
fn test_timer_run_rejects_zero_override() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["timer", "run", "--short-break", "0"], "");
    assert_ne!(code, 0);
    assert!(stderr.contains("short_break_minutes"));
}

#[test]
fn test_timer_run_skip_emits_completion() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli(
        home.path(),
        &["timer", "run", "--json"],
        "start\nskip\nstatus\nquit\n",
    );
    assert_eq!(code, 0, "stderr: {stderr}");

    let lines = json_lines(&stdout);
    assert!(lines.iter().any(|v| v["type"] == "timer_started"));
    let completed = lines
        .iter()
        .find(|v| v["type"] == "phase_completed")
        .expect("phase_completed event");
    assert_eq!(completed["completed"], "focus");
    assert_eq!(completed["next"], "short_break");
    assert_eq!(completed["skipped"], true);

    let last = lines.last().unwrap();
    assert_eq!(last["phase"], "short_break");
    assert_eq!(last["completed_focus_count"], 1);

    assert!(stderr.contains("Time for a break!"));
}

#[test]
fn test_timer_run_human_output() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["timer", "run"], "toggle\ntoggle\nreset\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("Focus started"));
    assert!(stdout.contains("paused at"));
    assert!(stdout.contains("Focus reset to 25:00"));
}

#[test]
fn test_timer_run_unknown_command_keeps_running() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli(home.path(), &["timer", "run", "--json"], "dance\nstatus\n");
    assert_eq!(code, 0);
    assert!(stderr.contains("unknown command"));
    assert!(json_lines(&stdout).iter().all(|v| v["phase"] == "focus" || v.get("type").is_some()));
}
