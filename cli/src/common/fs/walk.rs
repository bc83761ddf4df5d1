//! # Modbuild Tree Walker
//!
//! File: cli/src/common/fs/walk.rs
//!

//! ## Overview
//!
//! Walks a module source tree depth-first, in pre-order and sorted by file
//! name, deciding for every entry whether it is part of the package.
//!
//! ## Architecture
//!
//! - [`TreeWalker::walk`] is the traversal primitive. For each entry below the
//!   root it asks the [`IgnoreMatcher`]; an ignored directory yields
//!   [`Visit::Prune`] and its subtree is skipped through
//!   `walkdir::IntoIter::skip_current_dir`, so none of its children is ever
//!   tested or handed on. Symlinks are reported, never followed.
//! - [`TreeWalker::stage_into`] drives a [`Stager`] over the walk, records every
//!   staged directory (the root included), and once the walk is done restores
//!   their modification times from the source. Copying children into a
//!   directory bumps its mtime, so this pass has to come last.
//!
use crate::common::fs::copy::{EntryKind, Stager};
use crate::common::ignore::IgnoreMatcher;
use crate::core::error::Result;
use anyhow::Context;
use std::ffi::OsString;
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};
use tracing::debug;
use walkdir::WalkDir;

/// Decision for one visited entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Keep the entry; for directories, also walk into it.
    Descend,
    /// Drop the entry and, for directories, everything below it.
    Prune,
}

/// Counts reported by [`TreeWalker::stage_into`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkSummary {
    pub directories: usize,
    pub files: usize,
    pub skipped: usize,
    pub pruned: usize,
}

/// Filtered traversal of a module source tree.
#[derive(Debug)]
pub struct TreeWalker<'a> {
    source: &'a Path,
    matcher: &'a IgnoreMatcher,
}

impl<'a> TreeWalker<'a> {
    /// `source` must be the canonical module root.
    pub fn new(source: &'a Path, matcher: &'a IgnoreMatcher) -> Self {
        Self { source, matcher }
    }

    /// Asks the matcher about `path`. Directories are presented with a
    /// trailing separator so directory-only rules apply to them.
    pub fn decide(&self, path: &Path, is_dir: bool) -> Visit {
        let mut probe = OsString::from(path.as_os_str());
        if is_dir {
            probe.push(MAIN_SEPARATOR_STR);
        }
        if self.matcher.matches(Path::new(&probe), self.source) {
            Visit::Prune
        } else {
            Visit::Descend
        }
    }

    /// # Walk the Source Tree (`walk`)
    ///
    /// Calls `on_entry` for every non-ignored entry below the root, parents
    /// before children. Returns how many entries were pruned.
    ///
    /// # Errors
    ///
    /// Propagates directory read errors and any error from `on_entry`; the walk
    /// stops at the first one.
    pub fn walk<F>(&self, mut on_entry: F) -> Result<usize>
    where
        F: FnMut(&walkdir::DirEntry) -> Result<()>,
    {
        let mut pruned = 0;
        let mut entries = WalkDir::new(self.source)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = entries.next() {
            let entry = entry.with_context(|| {
                format!("Failed to walk module source {}", self.source.display())
            })?;
            let is_dir = entry.file_type().is_dir();

            match self.decide(entry.path(), is_dir) {
                Visit::Prune => {
                    debug!("Ignoring {} from the build", entry.path().display());
                    pruned += 1;
                    // Only directories may be skipped; on a file this would
                    // skip the rest of its parent.
                    if is_dir {
                        entries.skip_current_dir();
                    }
                }
                Visit::Descend => {
                    debug!("Staging {} for the build", entry.path().display());
                    on_entry(&entry)?;
                }
            }
        }

        Ok(pruned)
    }

    /// Stages every non-ignored entry with `stager`, then restores directory
    /// modification times.
    pub fn stage_into(&self, stager: &Stager) -> Result<WalkSummary> {
        let mut summary = WalkSummary::default();
        let mut directories: Vec<PathBuf> = vec![self.source.to_path_buf()];

        let pruned = self.walk(|entry| {
            let staged = stager.stage(entry.path())?;
            debug!(
                "Staged {} as {:?} (mode {:o}, {} bytes, modified {:?})",
                staged.relative.display(),
                staged.kind,
                staged.mode,
                staged.size,
                staged.modified
            );
            match staged.kind {
                EntryKind::Directory => {
                    directories.push(entry.path().to_path_buf());
                    summary.directories += 1;
                }
                EntryKind::File => summary.files += 1,
                EntryKind::Symlink | EntryKind::Special => summary.skipped += 1,
            }
            Ok(())
        })?;
        summary.pruned = pruned;

        for directory in &directories {
            stager.copy_mtime(directory)?;
        }

        debug!("Staging finished: {:?}", summary);
        Ok(summary)
    }
}
