//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with an isolated data directory and
//! verify outputs.

use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command against `data_dir` and return (stdout, stderr, code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_breathwork"))
        .args(args)
        .env("BREATHWORK_DATA_DIR", data_dir)
        .env("BREATHWORK_LOG", "off")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

fn parse_json(s: &str) -> serde_json::Value {
    serde_json::from_str(s).expect("Failed to parse JSON output")
}

#[test]
fn test_pattern_list_includes_presets() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(dir.path(), &["pattern", "list", "--json"]);
    let list = parse_json(&out);
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"box"));
    assert!(names.contains(&"relax"));
}

#[test]
fn test_pattern_save_use_and_remove() {
    let dir = tempfile::tempdir().unwrap();
    run_cli_success(
        dir.path(),
        &["pattern", "save", "evening", "--inhale", "4", "--exhale", "6", "--pause", "2"],
    );

    let shown = parse_json(&run_cli_success(dir.path(), &["pattern", "show", "evening"]));
    assert_eq!(shown["pattern"]["exhale"], 6.0);
    assert_eq!(shown["builtin"], false);

    run_cli_success(dir.path(), &["pattern", "use", "evening"]);
    run_cli_success(dir.path(), &["pattern", "remove", "evening"]);
    let (_, _, code) = run_cli(dir.path(), &["pattern", "show", "evening"]);
    assert_ne!(code, 0);
}

#[test]
fn test_pattern_save_rejects_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        dir.path(),
        &["pattern", "save", "nothing", "--inhale", "0", "--exhale", "0"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));

    let (_, _, code) = run_cli(
        dir.path(),
        &["pattern", "save", "box", "--inhale", "1", "--exhale", "1"],
    );
    assert_ne!(code, 0, "preset names are reserved");
}

#[test]
fn test_session_runs_to_completion_and_records_history() {
    let dir = tempfile::tempdir().unwrap();
    run_cli_success(
        dir.path(),
        &["pattern", "save", "quick", "--inhale", "0.3", "--exhale", "0.3"],
    );

    let out = run_cli_success(
        dir.path(),
        &["session", "start", "--pattern", "quick", "--cycles", "2", "--json"],
    );
    let events: Vec<serde_json::Value> = out.lines().map(parse_json).collect();
    assert_eq!(events.first().unwrap()["type"], "session_started");
    let last = events.last().unwrap();
    assert_eq!(last["type"], "session_completed");
    assert_eq!(last["summary"]["cycles_completed"], 2);
    assert_eq!(
        events.iter().filter(|e| e["type"] == "cycle_completed").count(),
        2
    );

    let status = parse_json(&run_cli_success(dir.path(), &["session", "status"]));
    assert_eq!(status["resumable"], false);

    let history = parse_json(&run_cli_success(dir.path(), &["history", "list", "--json"]));
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["exercise"], "quick");
    assert_eq!(entries[0]["cycles"], 2);

    let stats = parse_json(&run_cli_success(dir.path(), &["history", "stats"]));
    assert_eq!(stats["total_sessions"], 1);
    assert_eq!(stats["current_streak_days"], 1);
}

#[test]
fn test_session_accepts_inline_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(
        dir.path(),
        &["session", "start", "--pattern", "0.2-0-0.2-0", "--cycles", "1", "--quiet"],
    );
    let summary = parse_json(&out);
    assert_eq!(summary["cycles_completed"], 1);
    assert!(summary.get("pattern_name").is_none());
}

#[test]
fn test_session_rejects_unknown_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["session", "start", "--pattern", "nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown pattern"));
}

#[test]
fn test_resume_without_saved_session_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["session", "resume"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("no session to resume"));

    let out = run_cli_success(dir.path(), &["session", "discard"]);
    assert!(out.contains("No saved session"));
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(dir.path(), &["config", "get", "session.default_cycles"]);
    assert_eq!(out.trim(), "10");

    run_cli_success(dir.path(), &["config", "set", "session.default_cycles", "6"]);
    let out = run_cli_success(dir.path(), &["config", "get", "session.default_cycles"]);
    assert_eq!(out.trim(), "6");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "session.bogus", "1"]);
    assert_ne!(code, 0);

    run_cli_success(dir.path(), &["config", "reset"]);
    let out = run_cli_success(dir.path(), &["config", "get", "session.default_cycles"]);
    assert_eq!(out.trim(), "10");
}

#[test]
fn test_completions() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(dir.path(), &["completions", "bash"]);
    assert!(out.contains("breathwork"));
}
