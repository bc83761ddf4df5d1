//! # Modbuild Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module loads the optional TOML configuration of `modbuild`, merges the
//! user-level and project-level files, and validates the result. Everything in
//! it is optional: with no files at all the builder runs on defaults.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Command-line flags (applied by the command handler, not here)
//! 2. Project-specific `.modbuild.toml` in the module source directory
//! 3. User-specific config: the file given with `--config` / `MODBUILD_CONFIG`,
//!    else `config.toml` in the platform config directory (`~/.config/modbuild/`
//!    on Linux)
//! 4. Default values defined in the code
//!
//! Scalar settings from the project file replace the user's. Ignore rule lists
//! are concatenated, user rules first, so a project can add to the rules a user
//! applies everywhere. `~` in paths is expanded with `shellexpand`.
//!
//! A missing optional file is skipped. A file that exists but cannot be read or
//! parsed, or a `--config` file that does not exist, is a
//! `ModbuildError::Config`.
//!
//! ## Examples
//!
//! ```toml
//! [build]
//! destination = "~/packages"
//! ignore = ["/tmp/", "*.bak"]
//! ```
//!
//! ```rust
//! let cfg = config::load_config(Path::new("."), None)?;
//! let extra_rules = &cfg.build.ignore;
//! let destination = cfg.build.destination_path();
//! ```
//!
use crate::core::error::{ModbuildError, Result};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// File name of the project-level configuration inside a module.
pub const PROJECT_CONFIG_FILENAME: &str = ".modbuild.toml";

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)] // Error if unknown fields are in TOML
pub struct Config {
    #[serde(default)]
    pub build: BuildConfig,
}

/// Settings for `modbuild build`.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Directory packages are written to (can use ~). Defaults to `<source>/pkg`.
    pub destination: Option<String>,
    /// Extra ignore rules, evaluated after the module's ignore file.
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl BuildConfig {
    /// The configured destination as a path, if any.
    pub fn destination_path(&self) -> Option<PathBuf> {
        self.destination.as_deref().map(PathBuf::from)
    }
}

/// # Load Configuration (`load_config`)
///
/// Loads, merges, expands, and validates the configuration for a build of
/// the module at `source`. `user_config` is an explicitly requested user
/// config file; when `None`, the platform default location is tried.
///
/// # Errors
///
/// Returns a `ModbuildError::Config` if an explicit `user_config` does not
/// exist, if any present file cannot be read or parsed, or if validation fails.
pub fn load_config(source: &Path, user_config: Option<&Path>) -> Result<Config> {
    let user = match user_config {
        Some(path) => Some(load_explicit_config(path)?),
        None => load_user_config()?,
    };
    let project = load_project_config(source)?;
    let mut merged = merge_configs(user.unwrap_or_default(), project);
    expand_config_paths(&mut merged);
    validate_config(&merged).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged);
    Ok(merged)
}

/// Location of the default user config file, if the platform has one.
pub fn default_user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "Modbuild", "modbuild")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn load_explicit_config(path: &Path) -> Result<Config> {
    if !path.is_file() {
        return Err(anyhow!(ModbuildError::Config(format!(
            "Configuration file '{}' does not exist or is not a file.",
            path.display()
        ))));
    }
    info!("Loading user configuration from: {}", path.display());
    load_config_from_path(path)
}

fn load_user_config() -> Result<Option<Config>> {
    match default_user_config_path() {
        Some(config_path) if config_path.exists() => {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        }
        Some(config_path) => {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
        None => {
            warn!("Could not determine user config directory.");
            Ok(None)
        }
    }
}

fn load_project_config(source: &Path) -> Result<Option<Config>> {
    let project_config_path = source.join(PROJECT_CONFIG_FILENAME);
    if project_config_path.is_file() {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!(
            "No project configuration file ({}) found in {}",
            PROJECT_CONFIG_FILENAME,
            source.display()
        );
        Ok(None)
    }
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        anyhow!(ModbuildError::Config(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        )))
    })?;
    toml::from_str(&content).map_err(|e| {
        anyhow!(ModbuildError::Config(format!(
            "Failed to parse TOML from file {}: {}",
            path.display(),
            e
        )))
    })
}

fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project_cfg = match project {
        Some(p) => p,
        None => return user,
    };
    let mut merged = Config::default();
    merged.build.destination = project_cfg.build.destination.or(user.build.destination);
    merged.build.ignore = user
        .build
        .ignore
        .into_iter()
        .chain(project_cfg.build.ignore)
        .collect();
    merged
}

fn expand_config_paths(config: &mut Config) {
    if let Some(destination) = config.build.destination.as_mut() {
        *destination = shellexpand::tilde(destination.as_str()).into_owned();
        debug!("Expanded destination directory: {}", destination);
    }
}

fn validate_config(config: &Config) -> Result<()> {
    if let Some(destination) = &config.build.destination {
        if destination.trim().is_empty() {
            return Err(anyhow!(ModbuildError::Config(
                "build.destination cannot be empty.".to_string()
            )));
        }
        let dest = Path::new(destination);
        if dest.exists() && !dest.is_dir() {
            return Err(anyhow!(ModbuildError::Config(format!(
                "Configured destination '{}' exists but is not a directory.",
                dest.display()
            ))));
        }
    }
    for rule in &config.build.ignore {
        if rule.contains('\n') || rule.contains('\r') {
            return Err(anyhow!(ModbuildError::Config(format!(
                "Ignore rule {:?} must be a single line.",
                rule
            ))));
        }
    }
    Ok(())
}
