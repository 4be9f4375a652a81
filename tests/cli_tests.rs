//! Integration tests for the dupix CLI

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn sample_image() -> RgbImage {
    RgbImage::from_fn(64, 64, |x, _| {
        if x < 32 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

fn write_duplicate_pair(root: &Path) {
    let original = root.join("original.png");
    sample_image().save(&original).unwrap();
    fs::copy(&original, root.join("copy.png")).unwrap();
}

/// Test CLI binary exists and responds to --help
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("dupix").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("duplicate"));
}

/// Test CLI responds to --version
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("dupix").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dupix"));
}

/// Test invalid subcommand shows error
#[test]
fn test_invalid_subcommand() {
    let mut cmd = Command::cargo_bin("dupix").unwrap();
    cmd.arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test scanning a missing root fails with a clear message
#[test]
fn test_scan_missing_root() {
    let mut cmd = Command::cargo_bin("dupix").unwrap();
    cmd.args(["scan", "/no/such/tree", "--review", "keep-both"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

/// Test a non-interactive scan removes a byte-identical copy
#[test]
fn test_scan_removes_exact_duplicate() {
    let root = TempDir::new().unwrap();
    write_duplicate_pair(root.path());

    let mut cmd = Command::cargo_bin("dupix").unwrap();
    cmd.arg("scan")
        .arg(root.path())
        .args(["--review", "keep-both"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scan summary"));

    let original = root.path().join("original.png");
    let copy = root.path().join("copy.png");
    assert!(original.exists() ^ copy.exists());
}

/// Test the JSON report format
#[test]
fn test_scan_json_report() {
    let root = TempDir::new().unwrap();
    write_duplicate_pair(root.path());

    let mut cmd = Command::cargo_bin("dupix").unwrap();
    cmd.arg("scan")
        .arg(root.path())
        .args(["--review", "keep-both", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"files_deleted\": 1"));
}

/// Test that --backup copies the tree before anything is deleted
#[test]
fn test_scan_backup_preserves_originals() {
    let parent = TempDir::new().unwrap();
    let photos = parent.path().join("photos");
    fs::create_dir(&photos).unwrap();
    write_duplicate_pair(&photos);

    let mut cmd = Command::cargo_bin("dupix").unwrap();
    cmd.arg("scan")
        .arg(&photos)
        .args(["--backup", "--review", "keep-both"])
        .assert()
        .success();

    // One of the originals is gone, but the backup still holds both.
    let backup = parent.path().join("photos_backup");
    assert!(backup.join("original.png").exists());
    assert!(backup.join("copy.png").exists());
    assert!(photos.join("original.png").exists() ^ photos.join("copy.png").exists());
}

/// Test config show renders the merged TOML
#[test]
fn test_config_show() {
    let mut cmd = Command::cargo_bin("dupix").unwrap();
    cmd.args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[scan]"));
}

/// Test config show supports JSON output
#[test]
fn test_config_show_json() {
    let mut cmd = Command::cargo_bin("dupix").unwrap();
    cmd.args(["config", "show", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"workers\""));
}

/// Test config validation passes on the defaults
#[test]
fn test_config_validate() {
    let mut cmd = Command::cargo_bin("dupix").unwrap();
    cmd.args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration is valid"));
}

/// Test a custom config file overrides the defaults
#[test]
fn test_custom_config_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("custom.toml");
    fs::write(&config_path, "[scan]\nworkers = 7\n").unwrap();

    let mut cmd = Command::cargo_bin("dupix").unwrap();
    cmd.arg("--config")
        .arg(&config_path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("workers = 7"));
}

/// Test a JSON custom config file is read as JSON
#[test]
fn test_custom_json_config_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("custom.json");
    fs::write(&config_path, r#"{"scan": {"workers": 9}}"#).unwrap();

    let mut cmd = Command::cargo_bin("dupix").unwrap();
    cmd.arg("--config")
        .arg(&config_path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("workers = 9"));
}

/// Test that a scan refuses config values the engine cannot run with
#[test]
fn test_scan_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("photos");
    fs::create_dir(&root).unwrap();
    let config_path = dir.path().join("custom.toml");
    fs::write(&config_path, "[hash]\nsize = 0\n").unwrap();

    let mut cmd = Command::cargo_bin("dupix").unwrap();
    cmd.arg("--config")
        .arg(&config_path)
        .arg("scan")
        .arg(&root)
        .args(["--review", "keep-both"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("hash.size"));
}
