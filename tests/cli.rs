//! End-to-end CLI tests: argument parsing and early failure paths that need
//! no network access.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn help_lists_all_subcommands() {
    let mut cmd = Command::cargo_bin("autocourse").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("produce"))
        .stdout(predicate::str::contains("authorize"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn produce_fails_cleanly_on_missing_config() {
    let mut cmd = Command::cargo_bin("autocourse").unwrap();
    cmd.args(["produce", "--config", "definitely_not_here.yml"])
        .env_remove("GOOGLE_API_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn produce_fails_cleanly_without_api_key() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.yml");
    fs::write(
        &config,
        "presenter: Chaitanya\nseries: AI for Developers\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("autocourse").unwrap();
    cmd.args(["produce", "--config"])
        .arg(&config)
        .env_remove("GOOGLE_API_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GOOGLE_API_KEY"));
}

#[test]
fn authorize_fails_cleanly_on_missing_client_secrets() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.yml");
    fs::write(
        &config,
        format!(
            "presenter: Chaitanya\nseries: AI for Developers\nupload:\n  client_secrets_file: {}\n",
            dir.path().join("no_secrets.json").display()
        ),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("autocourse").unwrap();
    cmd.args(["authorize", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authorization failed"));
}

#[test]
fn unknown_subcommand_is_rejected() {
    let mut cmd = Command::cargo_bin("autocourse").unwrap();
    cmd.arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
