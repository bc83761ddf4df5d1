//! # Modbuild Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//!

//! ## Overview
//!
//! This module groups the filesystem side of building a package: walking the
//! module source, copying the entries that survive the ignore rules into the
//! build directory, and the small helpers both of those rely on.
//!
//! ## Architecture
//!
//! Functionality is delegated to the following submodules:
//!
//! - **`walk`**: `TreeWalker`, the pruning pre-order traversal of the module source and the deferred directory mtime pass.
//! - **`copy`**: `Stager`, which replicates one entry (directory, file, or skipped symlink) into the build directory.
//! - **`links`**: Inspects symlinks so the user can be warned about what was left out.
//! - **`io`**: Basic helpers such as `ensure_dir_exists`, `remove_dir_if_exists`, `resolve_dir_path`, and `set_modified_time`.
//!
//! The current structure requires importing from the specific submodule (e.g., `crate::common::fs::io::ensure_dir_exists`).
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::fs::{copy::Stager, walk::TreeWalker};
//! use crate::common::ignore::IgnoreMatcher;
//!
//! # fn run_example(source: &std::path::Path, build_dir: &std::path::Path) -> crate::core::error::Result<()> {
//! let matcher = IgnoreMatcher::from_patterns(["/spec/"]);
//! let stager = Stager::new(source, build_dir);
//! let summary = TreeWalker::new(source, &matcher).stage_into(&stager)?;
//! println!("Staged {} files", summary.files);
//! # Ok(())
//! # }
//! ```
//!

/// Contains the `Stager`, which copies single entries into the build directory.
pub mod copy;
/// Contains basic file I/O operations (e.g., `ensure_dir_exists`, `resolve_dir_path`, `set_modified_time`).
pub mod io;
/// Contains functions for inspecting symbolic links (e.g., `describe_symlink`).
pub mod links;
/// Contains the `TreeWalker`, the filtered traversal of the module source.
pub mod walk;
