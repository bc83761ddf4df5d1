//! # Modbuild Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout the module builder.
//! Errors fall into three groups:
//!
//! - **Configuration errors** (`ModbuildError::Config`): the source directory,
//!   `metadata.json`, or a TOML config file cannot be used. Raised before any
//!   staging happens.
//! - **Path errors** (`ModbuildError::UnpackablePath`): a single entry of the
//!   module cannot be represented in the package. The message names the path and
//!   tells the user how to get rid of it.
//! - **Filesystem errors**: plain I/O failures, carried as `anyhow` errors with
//!   context naming the path involved.
//!
//! Non-fatal conditions (symlinks, permission normalization) are not errors at
//! all; they are logged with `tracing::warn!`.
//!
//! ## Examples
//!
//! ```rust
//! // Return a specific error type
//! if !source.is_dir() {
//!     return Err(ModbuildError::Config(format!("'{}' is not a directory", source.display())))?;
//! }
//!
//! // Discriminate on the error kind
//! match builder.build() {
//!     Err(e) if matches!(e.downcast_ref::<ModbuildError>(), Some(ModbuildError::Config(_))) => {
//!         eprintln!("Fix your configuration: {}", e);
//!     }
//!     other => { other?; }
//! }
//! ```
//!
use crate::common::archive::ustar::PathError;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for the module builder.
#[derive(Error, Debug)]
pub enum ModbuildError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Filesystem error: {0}")]
    FileSystem(String),

    #[error("Package '{}' already exists. Use --force to overwrite it.", path.display())]
    PackageExists { path: PathBuf },

    #[error(
        "{source} Rename the file or exclude it from the package by adding it to the .pdkignore file in your module."
    )]
    UnpackablePath {
        #[from]
        source: PathError,
    },
}

/// Type alias for Result using anyhow::Error for broad compatibility.
/// Anyhow allows for easy context addition and flexible error handling.
pub type Result<T> = anyhow::Result<T>;
