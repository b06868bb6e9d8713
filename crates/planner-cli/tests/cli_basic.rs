//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with PLANNER_HOME pointed at a fresh temp
//! directory and verify outputs. Stdin is closed, so interactive commands
//! quit right away.

use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_planner"))
        .args(args)
        .env("PLANNER_HOME", home)
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("Failed to parse JSON output")
}

fn names(home: &Path) -> Vec<String> {
    let list = json(&run_ok(home, &["job", "list", "--json"]));
    list.as_array()
        .unwrap()
        .iter()
        .map(|job| job["name"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_job_add_and_rank() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["job", "add", "minor", "--priority", "1"]);
    let added = json(&run_ok(
        home.path(),
        &["job", "add", "major", "--priority", "9", "--duration", "45"],
    ));
    assert_eq!(added["rank"], 0);
    assert_eq!(added["type"], "task");
    assert_eq!(added["duration"], 45);
    assert_eq!(names(home.path()), ["major", "minor"]);
}

#[test]
fn test_pending_document_layout() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["job", "add", "essay", "--priority", "3"]);
    let raw = std::fs::read_to_string(home.path().join("cache").join("pending_jobs.json")).unwrap();
    let doc = json(&raw);
    let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["settings", "essay"]);
    assert_eq!(doc["settings"]["FOCUSED_TIME"], 30);
    assert_eq!(doc["essay"]["priority"], 3);
}

#[test]
fn test_invalid_fields_are_rejected() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        home.path(),
        &["job", "add", "bad", "--priority", "high", "--duration", "soon"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("priority, duration"), "stderr: {stderr}");
    assert!(names(home.path()).is_empty());
}

#[test]
fn test_reserved_name_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["job", "add", "settings"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("reserved"));
}

#[test]
fn test_stale_rank_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["job", "delete", "3"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("out of bounds"), "stderr: {stderr}");
}

#[test]
fn test_edit_keeps_unspecified_fields() {
    let home = tempfile::tempdir().unwrap();
    run_ok(
        home.path(),
        &["job", "add", "essay", "--priority", "3", "--duration", "50"],
    );
    let edited = json(&run_ok(
        home.path(),
        &["job", "edit", "0", "--name", "long essay", "--priority", "6"],
    ));
    assert_eq!(edited["name"], "long essay");
    assert_eq!(edited["priority"], 6);
    assert_eq!(edited["duration"], 50);
}

#[test]
fn test_complete_drops_job_from_pending() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["job", "add", "essay"]);
    let finished = json(&run_ok(home.path(), &["job", "complete", "0"]));
    assert_eq!(finished["type"], "finished_task");
    assert_eq!(finished["factual_priority"], -2);
    assert!(names(home.path()).is_empty());
}

#[test]
fn test_project_minitasks() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["job", "add", "attic", "--project"]);
    run_ok(home.path(), &["project", "add", "0", "sweep", "--duration", "15"]);
    let board = json(&run_ok(
        home.path(),
        &["project", "add", "0", "sort", "--at", "0"],
    ));
    assert_eq!(board["minitasks"][0]["name"], "sort");
    assert_eq!(board["minitasks"][1]["name"], "sweep");
    assert_eq!(board["done"], false);

    let board = json(&run_ok(home.path(), &["project", "complete", "0", "1"]));
    assert_eq!(board["completed_minitasks"], 1);
    assert_eq!(board["minitasks"][1]["type"], "finished_minitask");

    let (_, _, code) = run_cli(home.path(), &["project", "show", "5"]);
    assert_eq!(code, 1);
}

#[test]
fn test_session_plan() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["job", "add", "essay", "--duration", "45"]);
    let out = json(&run_ok(home.path(), &["session", "plan", "0"]));
    let plan = out["plan"].as_array().unwrap();
    assert_eq!(plan.len(), 3);
    assert_eq!(plan[0]["kind"], "focus");
    assert_eq!(plan[0]["minutes"], 30);
    assert_eq!(plan[1]["kind"], "rest");
    assert_eq!(plan[2]["minutes"], 15);
    assert_eq!(out["target"]["kind"], "task");
}

#[test]
fn test_session_run_quits_on_closed_stdin() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["job", "add", "essay"]);
    let stdout = run_ok(home.path(), &["session", "run", "0"]);
    let first = stdout.lines().next().unwrap();
    assert_eq!(json(first)["type"], "interval_dispatched");
    assert!(stdout.contains("\"done\": false"));
    assert_eq!(names(home.path()), ["essay"]);
}

#[test]
fn test_settings_round_trip() {
    let home = tempfile::tempdir().unwrap();
    let set = json(&run_ok(home.path(), &["settings", "set", "--focus", "25"]));
    assert_eq!(set["FOCUSED_TIME"], 25);
    assert_eq!(set["REST_TIME"], 5);
    let shown = json(&run_ok(home.path(), &["settings", "show"]));
    assert_eq!(shown, set);

    let (_, _, code) = run_cli(home.path(), &["settings", "set", "--focus", "0"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_get_set() {
    let home = tempfile::tempdir().unwrap();
    assert_eq!(
        run_ok(home.path(), &["config", "get", "ranking.strategy"]).trim(),
        "priority"
    );
    run_ok(
        home.path(),
        &["config", "set", "ranking.strategy", "relative_priority"],
    );
    assert_eq!(
        run_ok(home.path(), &["config", "get", "ranking.strategy"]).trim(),
        "relative_priority"
    );
    let (_, _, code) = run_cli(home.path(), &["config", "set", "ranking.strategy", "fifo"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(home.path(), &["config", "get", "nope"]);
    assert_eq!(code, 1);
}

#[test]
fn test_timer_run_without_queue_aborts() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(home.path(), &["timer", "run"]);
    assert_eq!(code, 134);
    assert!(stdout.is_empty());
    assert!(stderr.contains("hand-off"), "stderr: {stderr}");
}

#[test]
fn test_timer_queue_is_consumed_by_run() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["timer", "queue", "25"]);
    let peek = json(&run_ok(home.path(), &["timer", "peek"]));
    assert_eq!(peek["queued"], 25);

    let stdout = run_ok(home.path(), &["timer", "run"]);
    assert!(stdout.contains("\"duration_minutes\": 25"));
    assert!(stdout.contains("\"completed\": false"));

    let (_, _, code) = run_cli(home.path(), &["timer", "run"]);
    assert_eq!(code, 134);
}

#[test]
fn test_timer_run_reports_completion() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["timer", "queue", "0"]);
    let stdout = run_ok(home.path(), &["timer", "run"]);
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .filter(|line| line.starts_with('{') && line.ends_with('}'))
        .map(json)
        .collect();
    assert_eq!(events[0]["type"], "timer_started");
    assert_eq!(events[1]["type"], "timer_completed");
    assert!(stdout.contains("\"completed\": true"));
}

#[test]
fn test_completions() {
    let home = tempfile::tempdir().unwrap();
    let script = run_ok(home.path(), &["completions", "bash"]);
    assert!(script.contains("planner"));
}
