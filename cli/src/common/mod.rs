//! # Modbuild Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!

//! ## Overview
//!
//! This module is the root of the reusable engines behind `modbuild build`.
//! Command handlers (`commands::`) and the build orchestration (`core::builder`)
//! import from here; nothing in `common` knows about the CLI.
//!
//! ## Architecture
//!
//! - **`ignore`**: The gitignore-style pattern engine. Compiles ignore-file lines,
//!   configured rules, and the built-in defaults into an `IgnoreMatcher`.
//! - **`fs`**: The `TreeWalker` and `Stager` that copy the non-ignored part of a
//!   module into the build directory, plus symlink inspection and I/O helpers.
//! - **`archive`**: Ustar path encoding and the `ArchiveAssembler` that writes the
//!   final `.tar.gz`.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::{archive, fs, ignore};
//! use crate::core::error::Result;
//! use std::path::Path;
//!
//! # fn run_example(source: &Path, parent: &Path) -> Result<()> {
//! let matcher = ignore::module_matcher(source, &[], &[])?;
//! let build_dir = parent.join("mymod-1.2.0");
//! fs::io::ensure_dir_exists(&build_dir)?;
//! let stager = fs::copy::Stager::new(source, &build_dir);
//! fs::walk::TreeWalker::new(source, &matcher).stage_into(&stager)?;
//! archive::tar::ArchiveAssembler::new(parent, "mymod-1.2.0")
//!     .assemble(&parent.join("mymod-1.2.0.tar.gz"))?;
//! # Ok(())
//! # }
//! ```
//!

/// Ustar path encoding and `.tar.gz` package writing.
pub mod archive;
/// Source tree walking, staging copies, symlink inspection, and I/O helpers.
pub mod fs;
/// Gitignore-style ignore rules and the module rule set.
pub mod ignore;
