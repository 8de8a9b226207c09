mod common;

use common::{assert_contains_all, assert_contains_any, TestEnvironment};
use std::process::Command;

/// Integration tests for mirrorsort CLI commands
/// These tests run the actual binary and verify its behavior

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_mirrorsort"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    // Verify help contains expected commands
    assert_contains_all(&stdout, &["init", "run", "doctor"]);
}

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_mirrorsort"))
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mirrorsort"));
}

#[test]
fn test_run_moves_files_into_categories() {
    let env = TestEnvironment::new();
    env.create_minimal_config();
    env.target_file("Lot1/a.jpg");
    env.target_file("Lot1/b.jpg");
    env.reference_file("Lot1/Cracked/a.jpg");
    env.reference_file("Lot1/Over Review/b.jpg");

    let output = env
        .command()
        .arg("run")
        .output()
        .expect("Failed to execute command");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains_all(
        &stdout,
        &[
            "Progress: 1/1, estimated time remaining: 0s",
            "Comparison complete",
        ],
    );

    assert!(env.target.join("Lot1/Cracked/a.jpg").is_file());
    // Marked category is left for review by default
    assert!(env.target.join("Lot1/b.jpg").is_file());
}

#[test]
fn test_run_include_marked_with_explicit_roots() {
    let env = TestEnvironment::new();
    env.create_test_config("reconcile:\n  completion_delay_ms: 0\n");
    env.target_file("Lot1/b.jpg");
    env.reference_file("Lot1/Over Review/b.jpg");

    let output = env
        .command()
        .arg("run")
        .arg(&env.target)
        .arg(&env.reference)
        .arg("--include-marked")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(env.target.join("Lot1/Over Review/b.jpg").is_file());
}

#[test]
fn test_run_dry_run_leaves_files() {
    let env = TestEnvironment::new();
    env.create_minimal_config();
    env.target_file("Lot1/a.jpg");
    env.reference_file("Lot1/Pass/a.jpg");

    let output = env
        .command()
        .args(["run", "--dry-run"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains_all(&stdout, &["Dry run", "Would move: 1"]);
    assert!(env.target.join("Lot1/a.jpg").is_file());
    assert!(!env.target.join("Lot1/Pass").exists());
}

#[test]
fn test_run_json_summary() {
    let env = TestEnvironment::new();
    env.create_minimal_config();
    env.target_file("Lot1/a.jpg");
    env.target_file("Lot1/orphan.jpg");
    env.reference_file("Lot1/Pass/a.jpg");

    let output = env
        .command()
        .args(["run", "--json"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is a JSON summary");
    assert_eq!(summary["moved"], 1);
    assert_eq!(summary["unmatched"], 1);
    assert_eq!(summary["directories"][0]["name"], "Lot1");
}

#[test]
fn test_run_missing_root_fails() {
    let env = TestEnvironment::new();
    env.create_minimal_config();
    let missing = env.temp_dir.path().join("missing");

    let output = env
        .command()
        .arg("run")
        .arg(&missing)
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_contains_any(&stderr, &["failed to start", "Cannot read"]);
}

#[test]
fn test_run_without_roots_fails() {
    let env = TestEnvironment::new();
    env.create_test_config("reconcile:\n  completion_delay_ms: 0\n");

    let output = env
        .command()
        .arg("run")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("mirrorsort init"));
}

#[test]
fn test_doctor_command() {
    let env = TestEnvironment::new();
    env.create_minimal_config();

    let output = env
        .command()
        .arg("doctor")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    // Verify doctor output contains diagnostic information
    assert_contains_all(
        &stdout,
        &["System Diagnostics", "Target Root", "Reference Root", "Version"],
    );
    assert!(stdout.contains("All checks passed"));
}

#[test]
fn test_init_writes_config() {
    let env = TestEnvironment::new();

    let output = env
        .command()
        .arg("init")
        .arg("--target")
        .arg(&env.target)
        .arg("--reference")
        .arg(&env.reference)
        .output()
        .expect("Failed to execute command");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let written = std::fs::read_to_string(&env.config_path).expect("config written");
    let config: mirrorsort::Config = serde_yaml::from_str(&written).expect("valid config");
    assert_eq!(
        config.target_root.as_deref(),
        Some(env.target.to_string_lossy().as_ref())
    );
    assert_eq!(config.reconcile.exclusion_marker, "over");
}
