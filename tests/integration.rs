//! Integration tests for the sigtally CLI.
//!
//! These tests exercise the binary end-to-end: real forks, real queued
//! signals, real reaping. The unit tests deliberately avoid forking, so
//! everything process-related is covered here.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the sigtally binary.
fn sigtally() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("sigtally").unwrap()
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays() {
    sigtally()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("forked workers"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_version_displays() {
    sigtally()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sigtally"))
        .stdout(predicate::str::is_match(r"\d+\.\d+\.\d+").unwrap());
}

#[test]
fn test_run_help() {
    sigtally()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--array-len"))
        .stdout(predicate::str::contains("--shares"))
        .stdout(predicate::str::contains("--rt-offset"))
        .stdout(predicate::str::contains("--format"));
}

// ============================================================================
// Run Command Tests
// ============================================================================

#[test]
fn test_run_default_total() {
    // 4096 elements in 4 shares: 3 workers plus the coordinator's own share.
    sigtally()
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("final total = 8390656"));
}

#[test]
fn test_run_small_vector() {
    sigtally()
        .args(["run", "-n", "10", "-p", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("final total = 55"));
}

#[test]
fn test_run_single_share() {
    // One share means no workers at all; the coordinator sums everything.
    sigtally()
        .args(["run", "-n", "100", "-p", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("final total = 5050"));
}

#[test]
fn test_run_two_shares() {
    sigtally()
        .args(["run", "-n", "10000", "-p", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("final total = 50005000"));
}

#[test]
fn test_run_many_workers() {
    sigtally()
        .args(["run", "-n", "1000", "-p", "8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("final total = 500500"));
}

#[test]
fn test_run_one_element_per_share() {
    sigtally()
        .args(["run", "-n", "8", "-p", "8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("final total = 36"));
}

#[test]
fn test_run_is_deterministic() {
    // Delivery order may vary between runs; the total must not.
    for _ in 0..3 {
        sigtally()
            .args(["run", "-n", "10", "-p", "3"])
            .assert()
            .success()
            .stdout(predicate::str::contains("final total = 55"));
    }
}

#[test]
fn test_run_alternate_rt_offset() {
    sigtally()
        .args(["run", "-n", "10", "-p", "3", "--rt-offset", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("final total = 55"));
}

#[test]
fn test_run_env_var_config() {
    sigtally()
        .arg("run")
        .env("SIGTALLY_ARRAY_LEN", "10")
        .env("SIGTALLY_SHARES", "3")
        .assert()
        .success()
        .stdout(predicate::str::contains("final total = 55"));
}

#[test]
fn test_run_json_report() {
    let output = sigtally()
        .args(["run", "--format", "json"])
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("Output should be valid JSON");

    assert_eq!(parsed["total"], 8390656);
    assert_eq!(parsed["array_len"], 4096);
    assert_eq!(parsed["shares"], 4);
    assert_eq!(parsed["workers_spawned"], 3);
    assert_eq!(parsed["clean_exits"], 3);
    assert_eq!(parsed["abnormal_exits"], 0);
    assert_eq!(parsed["arrivals"], 3);
}

// ============================================================================
// Worker Failure Tests
// ============================================================================

#[test]
fn test_run_survives_abnormal_worker() {
    // Worker 0 dies before sending; its share (1+2+3 = 6) is absent and the
    // run still completes cleanly with the remaining shares summed.
    let output = sigtally()
        .args(["run", "-n", "10", "-p", "3", "--format", "json"])
        .env("SIGTALLY_FAIL_WORKER", "0")
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("Output should be valid JSON");

    assert_eq!(parsed["total"], 49);
    assert_eq!(parsed["workers_spawned"], 2);
    assert_eq!(parsed["clean_exits"], 1);
    assert_eq!(parsed["abnormal_exits"], 1);
    assert_eq!(parsed["arrivals"], 1);
}

#[test]
fn test_abnormal_worker_is_reported() {
    sigtally()
        .args(["run", "-n", "10", "-p", "3"])
        .env("SIGTALLY_FAIL_WORKER", "1")
        .env("SIGTALLY_LOG", "info")
        .assert()
        .success()
        .stdout(predicate::str::contains("final total = 40"))
        .stderr(predicate::str::contains("Worker terminated abnormally"))
        .stderr(predicate::str::contains("may be missing"));
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_run_rejects_zero_length() {
    sigtally()
        .args(["run", "-n", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("array length"));
}

#[test]
fn test_run_rejects_excess_shares() {
    sigtally()
        .args(["run", "-n", "4", "-p", "8"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("share count"));
}

#[test]
fn test_run_rejects_bad_rt_offset() {
    sigtally()
        .args(["run", "--rt-offset", "10000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("signal offset"));
}

#[test]
fn test_run_rejects_overflowing_rt_offset() {
    sigtally()
        .args(["run", "--rt-offset", "2147483647"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("signal offset"));
}

#[test]
fn test_plan_rejects_zero_shares() {
    sigtally()
        .args(["plan", "-p", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("share count"));
}

// ============================================================================
// Plan Command Tests
// ============================================================================

#[test]
fn test_plan_output() {
    sigtally()
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("[0, 1023]"))
        .stdout(predicate::str::contains("[3072, 4095]"))
        .stdout(predicate::str::contains("coordinator"));
}

#[test]
fn test_plan_uneven_split() {
    sigtally()
        .args(["plan", "-n", "10", "-p", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[0, 2]"))
        .stdout(predicate::str::contains("[3, 5]"))
        .stdout(predicate::str::contains("[6, 9]"));
}

#[test]
fn test_plan_json_output() {
    let output = sigtally()
        .args(["plan", "--format", "json"])
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("Output should be valid JSON");

    assert_eq!(parsed["array_len"], 4096);
    assert_eq!(parsed["shares"], 4);
    assert_eq!(parsed["worker_ranges"].as_array().unwrap().len(), 3);
    assert_eq!(parsed["coordinator_range"]["start"], 3072);
    assert_eq!(parsed["coordinator_range"]["end"], 4095);
}

// ============================================================================
// Logging Tests
// ============================================================================

#[test]
fn test_arrival_notices_logged() {
    sigtally()
        .args(["run", "-n", "10", "-p", "3"])
        .env("SIGTALLY_LOG", "info")
        .assert()
        .success()
        .stderr(predicate::str::contains("Received payload"))
        .stderr(predicate::str::contains("Reaped worker"));
}

#[test]
fn test_quiet_suppresses_notices() {
    sigtally()
        .args(["--quiet", "run", "-n", "10", "-p", "3"])
        .env_remove("SIGTALLY_LOG")
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stdout(predicate::str::contains("final total = 55"))
        .stderr(predicate::str::contains("Received payload").not());
}

// ============================================================================
// Completions Tests
// ============================================================================

#[test]
fn test_completions_bash() {
    sigtally()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sigtally"));
}

#[test]
fn test_completions_zsh() {
    sigtally()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sigtally"));
}
