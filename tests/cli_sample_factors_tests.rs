// Integration tests for `huella sample` and `huella factors`
#![allow(deprecated)] // Command::cargo_bin is deprecated but still functional

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_sample_default_is_valid_input() {
    let output = Command::cargo_bin("huella").unwrap().arg("sample").output().unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = parsed.as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["volume"], 50.0);
}

#[test]
fn test_sample_round_trip_through_compute() {
    let dir = TempDir::new().unwrap();
    let sample = dir.path().join("sample.json");

    Command::cargo_bin("huella")
        .unwrap()
        .args(["sample", "--complexity", "high", "-o"])
        .arg(&sample)
        .assert()
        .success();

    Command::cargo_bin("huella")
        .unwrap()
        .args(["compute", "--group-by", "material"])
        .arg(&sample)
        .assert()
        .success()
        .stdout(predicate::str::contains("concrete"))
        .stdout(predicate::str::contains("glass"))
        .stdout(predicate::str::contains("steel"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_factors_lists_builtin_table() {
    Command::cargo_bin("huella")
        .unwrap()
        .arg("factors")
        .assert()
        .success()
        .stdout(predicate::str::contains("concrete"))
        .stdout(predicate::str::contains("high_performance"))
        .stdout(predicate::str::contains("carbon_fiber"))
        .stdout(predicate::str::contains("Fallback factor for unknown pairs: 0.5"));
}

#[test]
fn test_factors_rejects_bad_table() {
    let dir = TempDir::new().unwrap();
    let factors = dir.path().join("bad.toml");
    std::fs::write(&factors, "[[material]]\nname = \"x\"\nfactor = -2\n").unwrap();

    Command::cargo_bin("huella")
        .unwrap()
        .arg("factors")
        .arg("--factors")
        .arg(&factors)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid factor table"));
}

#[test]
fn test_version_flag() {
    Command::cargo_bin("huella")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("huella"));
}
