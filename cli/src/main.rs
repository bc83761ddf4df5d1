//! # Modbuild Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! This file serves as the main entry point for the `modbuild` CLI, which
//! packages a module source directory into a distributable `.tar.gz`.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the command handlers
//!
//! ## Architecture
//!
//! - Each top-level command is a variant in the `Commands` enum, mapped to a
//!   handler in `commands::`
//! - The reusable engines (ignore rules, staging, archive writing) live in
//!   `common::`; orchestration, configuration, and errors in `core::`
//! - All errors are propagated to this level for consistent handling
//!
//! ## Examples
//!
//! ```bash
//! # Get help
//! modbuild --help
//!
//! # Build the module in the current directory, showing each staging decision
//! modbuild -vv build
//! ```
//!
//! Command processing flow:
//! 1. Parse command-line args via Clap
//! 2. Configure logging based on verbosity level
//! 3. Route to the command handler
//! 4. Print any error and exit with status 1
//!
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

// Declare the top-level modules of the CLI crate.
mod commands; // Subcommand argument parsing and handlers
mod common; // Ignore engine, staging, archive writing
mod core; // Builder, configuration, errors, metadata

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "modbuild",
    about = "Build distributable packages from module source directories",
    long_about = "Stage a module's files (honouring .pdkignore/.pmtignore/.gitignore rules)\n\
                  and write them as a ustar .tar.gz named after metadata.json.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// User configuration file (defaults to the platform config directory).
    #[arg(long, global = true, env = "MODBUILD_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Enum defining all available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    /// Build a package from a module source directory.
    #[command(alias = "b")]
    Build(commands::build::BuildArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Build(args) => {
            commands::build::handle_build(args, cli.config.as_deref()).map(|_| ())
        }
    };

    if let Err(e) = command_result {
        tracing::debug!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
