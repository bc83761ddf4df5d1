//! # Modbuild Filesystem Link Operations
//!
//! File: cli/src/common/fs/links.rs
//!

//! ## Overview
//!
//! Symbolic links cannot be represented in a module package, so they are never
//! staged. This module describes a symlink found in the module so the user can
//! be told exactly what was left out:
//!
//! - **`describe_symlink`**: resolves the link and expresses both ends relative
//!   to the module root.
//!
//! A dangling link cannot be canonicalized; its raw target text is reported
//! instead.
//!
use crate::core::error::Result;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// Both ends of a symlink, relative to the module root where possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymlinkDescription {
    pub link: PathBuf,
    pub target: PathBuf,
}

/// # Describe a Symlink (`describe_symlink`)
///
/// Returns the link path and its resolved target, both relative to `root`
/// (which must already be canonical).
///
/// # Errors
///
/// Returns an `Err` if the link itself cannot be read.
pub fn describe_symlink(path: &Path, root: &Path) -> Result<SymlinkDescription> {
    let link = path.strip_prefix(root).unwrap_or(path).to_path_buf();

    let target = match path.canonicalize() {
        Ok(resolved) => pathdiff::diff_paths(&resolved, root).unwrap_or(resolved),
        Err(_) => fs::read_link(path)
            .with_context(|| format!("Failed to read symlink {:?}", path))?,
    };

    Ok(SymlinkDescription { link, target })
}
