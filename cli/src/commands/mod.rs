//! # Modbuild Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the subcommands of the `modbuild` CLI and makes them
//! accessible to the main application entry point (`main.rs`).
//!
//! ## Commands
//!
//! - `build`: Package a module source directory into a `.tar.gz`
//!
//! Each command defines its own arguments structure and handler function.
//!

/// Packages a module. Defines `BuildArgs` and `handle_build`.
pub mod build;
