//! # Modbuild CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Each `.rs` file in
//! this directory (other than this module) is compiled as a separate test crate
//! that drives the compiled `modbuild` binary.
//!

// Allow potentially unused code in this common module, as different test files might use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// # Get Modbuild Command (`modbuild_cmd`)
///
/// An `assert_cmd::Command` for the compiled `modbuild` binary. `RUST_LOG` is
/// cleared so output does not depend on the caller's environment.
///
/// ## Panics
/// Panics if the `modbuild` binary cannot be found via `Command::cargo_bin`.
pub fn modbuild_cmd() -> Command {
    let mut cmd = Command::cargo_bin("modbuild").expect("Failed to find modbuild binary for testing");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// A throwaway module: `metadata.json` and `manifests/init.pp` under
/// `<tmp>/mymod`, plus an empty user config at `<tmp>/user.toml`.
pub struct TestModule {
    pub dir: TempDir,
    pub source: PathBuf,
    pub user_config: PathBuf,
}

impl TestModule {
    pub fn new(name: &str, version: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let base = dir.path().canonicalize().expect("Failed to resolve temp dir");
        let source = base.join("mymod");
        fs::create_dir_all(source.join("manifests")).expect("Failed to create module");
        fs::write(
            source.join("metadata.json"),
            format!(r#"{{"name":"{}","version":"{}"}}"#, name, version),
        )
        .expect("Failed to write metadata.json");
        fs::write(source.join("manifests/init.pp"), "class mymod {}\n")
            .expect("Failed to write init.pp");
        let user_config = base.join("user.toml");
        fs::write(&user_config, "").expect("Failed to write user config");
        Self {
            dir,
            source,
            user_config,
        }
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.source.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(path, content).expect("Failed to write module file");
    }

    /// `modbuild build <source>` isolated from the real user config.
    pub fn build_cmd(&self) -> Command {
        let mut cmd = modbuild_cmd();
        cmd.env("MODBUILD_CONFIG", &self.user_config)
            .arg("build")
            .arg(&self.source);
        cmd
    }
}

/// Entry paths of a `.tar.gz`, in archive order.
pub fn archive_paths(package: &Path) -> Vec<String> {
    let file = File::open(package).expect("Failed to open package");
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive
        .entries()
        .expect("Failed to read package")
        .map(|entry| {
            let entry = entry.expect("Failed to read package entry");
            let path = entry.path().expect("Entry without a path");
            path.to_string_lossy().replace('\\', "/")
        })
        .collect()
}
