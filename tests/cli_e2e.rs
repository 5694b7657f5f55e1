//! CLI end-to-end tests for argument handling and configuration errors.
//!
//! Network-dependent behavior is covered by `session_integration.rs`; these
//! tests exercise the binary boundary only.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn exporter() -> Command {
    Command::cargo_bin("imdb-exporter").expect("binary builds")
}

/// Points settings and HOME at an empty temp dir so remembered paths from the
/// developer machine never leak into a test.
fn isolated(cmd: &mut Command, temp: &TempDir) {
    cmd.env("XDG_CONFIG_HOME", temp.path());
    cmd.env("HOME", temp.path());
}

#[test]
fn help_describes_manifest_and_mode() {
    exporter()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("manifest"))
        .stdout(predicate::str::contains("--mode"))
        .stdout(predicate::str::contains("--overwrite"));
}

#[test]
fn version_prints_package_version() {
    exporter()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn zero_concurrency_is_rejected_before_startup() {
    let temp = TempDir::new().unwrap();
    let mut cmd = exporter();
    isolated(&mut cmd, &temp);
    cmd.args(["manifest.csv", "-c", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn missing_manifest_with_no_history_is_a_config_error() {
    let temp = TempDir::new().unwrap();
    let mut cmd = exporter();
    isolated(&mut cmd, &temp);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no manifest path"));
}

#[test]
fn malformed_cookie_file_halts_before_downloading() {
    let temp = TempDir::new().unwrap();
    let manifest = temp.path().join("manifest.csv");
    std::fs::write(
        &manifest,
        "List Name,URL\nalice,http://www.imdb.com/user/ur1234567/\n",
    )
    .unwrap();
    let cookie_file = temp.path().join("cookies.txt");
    std::fs::write(&cookie_file, "malformed").unwrap();

    let mut cmd = exporter();
    isolated(&mut cmd, &temp);
    cmd.arg(&manifest)
        .arg("-o")
        .arg(temp.path().join("out"))
        .arg("--cookies")
        .arg(&cookie_file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid cookie file"));
}

#[test]
fn unreadable_manifest_is_a_config_error() {
    let temp = TempDir::new().unwrap();
    let mut cmd = exporter();
    isolated(&mut cmd, &temp);
    cmd.arg(temp.path().join("does-not-exist.csv"))
        .arg("-o")
        .arg(temp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open manifest"));
}

#[test]
fn retry_forever_conflicts_with_max_retries() {
    let temp = TempDir::new().unwrap();
    let mut cmd = exporter();
    isolated(&mut cmd, &temp);
    cmd.args(["manifest.csv", "--retry-forever", "-r", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
