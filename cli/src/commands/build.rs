//! # Modbuild Build Command
//!
//! File: cli/src/commands/build.rs
//!
//! ## Overview
//!
//! This module implements `modbuild build`, which packages a module source
//! directory into `{destination}/{name}-{version}.tar.gz`.
//!
//! ## Architecture
//!
//! The command flow follows these steps:
//! 1. Validate the source directory (defaults to the current directory).
//! 2. Load configuration for that source (user file, then `.modbuild.toml`).
//! 3. Resolve the destination: `--dest`, else `build.destination`, else
//!    `<source>/pkg`.
//! 4. Refuse to overwrite an existing package unless `--force` is given.
//! 5. Run the `ModuleBuilder` and print the package path.
//!
//! ## Examples
//!
//! ```bash
//! # Package the module in the current directory into ./pkg
//! modbuild build
//!
//! # Package another module into a shared directory, replacing an old build
//! modbuild build ~/src/mymod --dest ~/packages --force
//!
//! # Use a custom release name
//! modbuild build --release-name mymod-1.2.0-rc1
//! ```
//!
use crate::core::builder::ModuleBuilder;
use crate::core::config;
use crate::core::error::{ModbuildError, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// # Build Arguments (`BuildArgs`)
///
/// Command-line arguments accepted by `modbuild build`.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Path to the module source directory.
    #[arg(default_value = ".")]
    source: PathBuf,

    /// Directory to write the package to. Defaults to `build.destination` from
    /// the configuration, or `<SOURCE>/pkg`.
    #[arg(short, long)]
    dest: Option<PathBuf>,

    /// Release name used for the top-level archive directory and the package
    /// file name, instead of `{name}-{version}` from metadata.json.
    #[arg(long)]
    release_name: Option<String>,

    /// Overwrite an existing package.
    #[arg(short, long)]
    force: bool,
}

/// # Handle Build Command (`handle_build`)
///
/// Builds the package described by `args`. `config_path` is the user config
/// file named with the global `--config` flag, if any.
///
/// ## Returns
///
/// * `Result<PathBuf>`: the package path.
///
/// ## Errors
///
/// - `ModbuildError::Config` for an unusable source, metadata, or configuration.
/// - `ModbuildError::PackageExists` if the package exists and `--force` was not
///   given.
/// - Any error from staging or writing the package.
pub fn handle_build(args: BuildArgs, config_path: Option<&Path>) -> Result<PathBuf> {
    info!("Handling build command...");
    debug!("Build args: {:?}", args);

    let builder = ModuleBuilder::new(&args.source);
    let source = builder.source()?.to_path_buf();

    let cfg = config::load_config(&source, config_path)?;
    let destination = args.dest.or_else(|| cfg.build.destination_path());
    let mut builder = builder
        .with_destination(destination)
        .with_ignore_rules(cfg.build.ignore);
    if let Some(release_name) = args.release_name {
        builder = builder.with_release_name(release_name);
    }

    let package_file = builder.package_file()?;
    if builder.package_already_exists()? {
        if !args.force {
            return Err(ModbuildError::PackageExists { path: package_file }.into());
        }
        info!("Overwriting existing package {}", package_file.display());
    }

    let package = builder.build().map_err(|e| {
        debug!("Build stopped during {:?}", builder.phase());
        e
    })?;
    println!("Built package: {}", package.display());
    Ok(package)
}
