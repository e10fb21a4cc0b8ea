//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a throwaway data
//! directory and verify the JSON they print.

use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command as `u1` and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "pact-cli", "--", "--user", "u1"])
        .args(args)
        .env("PACT_DATA_DIR", data_dir)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn unlocked_keys(value: &Value) -> Vec<String> {
    value["unlocked"]
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(|n| n["key"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_goal_lifecycle() {
    let dir = TempDir::new().unwrap();
    let data = dir.path();

    let created = run_json(data, &["goal", "add", "Write a book", "--difficulty", "hard", "--score", "200"]);
    assert!(unlocked_keys(&created).contains(&"first_goal".to_string()));
    let goal_id = created["goal"]["id"].as_str().unwrap().to_string();

    let step = run_json(data, &["goal", "step-add", &goal_id, "Outline"]);
    let step_id = step["id"].as_str().unwrap().to_string();
    run_json(data, &["goal", "step-add", &goal_id, "Draft"]);

    let done = run_json(data, &["goal", "step-complete", &step_id]);
    assert_eq!(done["step"]["status"], "completed");
    let again = run_json(data, &["goal", "step-complete", &step_id]);
    assert_eq!(again["already_completed"], true);

    run_json(data, &["rank", "add", "Novice", "0"]);
    run_json(data, &["rank", "add", "Scribe", "100"]);

    // 200 * 1/2 * 0.5
    let rank = run_json(data, &["rank", "show"]);
    assert_eq!(rank["current_xp"], 50);
    assert_eq!(rank["current_rank"]["name"], "Novice");

    let completed = run_json(data, &["goal", "complete", &goal_id]);
    assert_eq!(completed["goal"]["status"], "fully_completed");
    assert!(unlocked_keys(&completed).contains(&"speed_hard".to_string()));
    let repeat = run_json(data, &["goal", "complete", &goal_id]);
    assert_eq!(repeat["already_completed"], true);
    assert!(unlocked_keys(&repeat).is_empty());

    let rank = run_json(data, &["rank", "show"]);
    assert_eq!(rank["current_xp"], 200);
    assert_eq!(rank["current_rank"]["name"], "Scribe");
}

#[test]
fn test_insights_empty_state() {
    let dir = TempDir::new().unwrap();
    let insights = run_json(dir.path(), &["insights", "--date", "2024-01-01"]);
    let items = insights.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "empty-state");
}

#[test]
fn test_checkin_streak() {
    let dir = TempDir::new().unwrap();
    let data = dir.path();
    run_json(data, &["checkin", "--date", "2024-01-01"]);
    let second = run_json(data, &["checkin", "--date", "2024-01-02"]);
    assert_eq!(second["outcome"]["streak"]["current_streak"], 2);

    let repeat = run_json(data, &["checkin", "--date", "2024-01-02"]);
    assert_eq!(repeat["outcome"]["counted"], false);
}

#[test]
fn test_pact_set_then_edit() {
    let dir = TempDir::new().unwrap();
    let data = dir.path();
    let first = run_json(data, &["pact", "set", "Summer", "--start", "2024-06-01"]);
    assert_eq!(first["created"], true);
    assert!(unlocked_keys(&first).contains(&"pact_sealed".to_string()));

    let second = run_json(data, &["pact", "set", "Summer II"]);
    assert_eq!(second["created"], false);
    assert_eq!(second["pact"]["start_date"], "2024-06-01");
    assert!(unlocked_keys(&second).contains(&"pact_revised".to_string()));
}

#[test]
fn test_promo_redeem() {
    let dir = TempDir::new().unwrap();
    let data = dir.path();
    run_json(data, &["promo", "add", "launch", "gems", "25"]);
    let ok = run_json(data, &["promo", "redeem", "LAUNCH"]);
    assert_eq!(ok["success"], true);
    let dup = run_json(data, &["promo", "redeem", "launch"]);
    assert_eq!(dup["error"], "already_redeemed");
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    let data = dir.path();
    let (stdout, _, code) = run_cli(data, &["config", "get", "insights.max_insights"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "3");

    let (_, _, code) = run_cli(data, &["config", "set", "progression.in_progress_damping", "0.25"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(data, &["config", "get", "progression.in_progress_damping"]);
    assert_eq!(stdout.trim(), "0.25");

    let (_, stderr, code) = run_cli(data, &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_missing_step_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["goal", "step-complete", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not found"));
}
