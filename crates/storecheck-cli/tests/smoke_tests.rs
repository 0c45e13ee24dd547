//! Smoke tests for the storecheck CLI

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn storecheck() -> Command {
    let mut cmd = Command::cargo_bin("storecheck").expect("storecheck binary should exist");
    cmd.env_remove("STORECHECK_ENV")
        .env_remove("STORECHECK_API_URL")
        .env_remove("STORECHECK_BASE_URL");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    storecheck()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_subcommands() {
    storecheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("api"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_fails() {
    storecheck().assert().failure();
}

// ============================================================================
// generate
// ============================================================================

#[test]
fn test_generate_users_json() {
    let output = storecheck()
        .args(["generate", "user", "-n", "2", "--seed", "9"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let users: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(users.as_array().unwrap().len(), 2);
    assert!(users[0]["email"].as_str().unwrap().contains('@'));
}

#[test]
fn test_generate_signup() {
    storecheck()
        .args(["generate", "signup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TestSuite"));
}

#[test]
fn test_generate_zero_count() {
    storecheck()
        .args(["generate", "email", "-n", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--count"));
}

#[test]
fn test_generate_unknown_kind() {
    storecheck().args(["generate", "pet"]).assert().failure();
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_production() {
    storecheck()
        .args(["-q", "config", "--env", "production"])
        .assert()
        .success()
        .stdout(predicate::str::contains("environment: production"));
}

#[test]
fn test_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("suite.yaml");
    fs::write(&path, "environment: local\nretries: 5\n").unwrap();
    storecheck()
        .args(["-q", "config", "--file"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("retries: 5"));
}

#[test]
fn test_config_unknown_env() {
    storecheck()
        .args(["config", "--env", "moon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("moon"));
}

#[test]
fn test_config_env_and_file_conflict() {
    storecheck()
        .args(["config", "--env", "local", "--file", "x.yaml"])
        .assert()
        .failure();
}

// ============================================================================
// api
// ============================================================================

#[test]
fn test_api_unreachable_fails() {
    storecheck()
        .args(["api", "--api-url", "http://127.0.0.1:9", "products"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}
