//! # Modbuild CLI Main Integration Tests
//!
//! File: cli/tests/main_tests.rs
//!
//! ## Overview
//!
//! Verifies the top-level behavior of the `modbuild` command-line interface:
//! standard flags like `--version` and `--help`, and argument errors.
//!

// Declare and use the common module for helpers like `modbuild_cmd()`
mod common;
use common::*;
use predicates::prelude::*;

#[test]
fn test_version_flag() {
    modbuild_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_build() {
    modbuild_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build").and(predicate::str::contains("--config")));
}

#[test]
fn test_build_help_lists_options() {
    modbuild_cmd()
        .args(["build", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--dest")
                .and(predicate::str::contains("--release-name"))
                .and(predicate::str::contains("--force")),
        );
}

#[test]
fn test_missing_subcommand_fails() {
    modbuild_cmd().assert().failure();
}

#[test]
fn test_unknown_subcommand_fails() {
    modbuild_cmd()
        .arg("deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
