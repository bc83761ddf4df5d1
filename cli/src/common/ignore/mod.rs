//! # Modbuild Ignore Rules (`common::ignore`)
//!
//! File: cli/src/common/ignore/mod.rs
//!
//! ## Overview
//!
//! Decides which paths of a module are left out of its package. The engine is
//! split in two submodules:
//!
//! - **`pattern`**: compiles gitignore-style globs (`*`, `?`, `[...]`, `**`) into
//!   path segments and matches them.
//! - **`matcher`**: turns ignore lines into rules (negation, anchoring,
//!   directory-only) and evaluates them last-match-wins.
//!
//! This module adds the module-level policy on top:
//!
//! 1. Pick the ignore file in the module root: the first of `.pdkignore`,
//!    `.pmtignore`, `.gitignore` that exists and can be read.
//! 2. Append extra rules from configuration.
//! 3. Append self-exclusion rules for the package destination.
//! 4. Append [`DEFAULT_IGNORED`] last.
//!
//! Because the defaults come last, a negation in the ignore file cannot
//! re-include something a default rule excludes.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::ignore;
//!
//! let matcher = ignore::module_matcher(source, &config.build.ignore, &["/pkg/".into()])?;
//! if matcher.is_ignored("spec/fixtures", true) {
//!     // prune
//! }
//! ```
//!
pub mod matcher;
pub mod pattern;

pub use matcher::{IgnoreMatcher, IgnoreRule};

use crate::common::fs::io::read_file_to_string;
use crate::core::error::Result;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Candidate ignore files, most preferred first.
pub const IGNORE_FILES: [&str; 3] = [".pdkignore", ".pmtignore", ".gitignore"];

/// Rules appended after everything else.
pub const DEFAULT_IGNORED: &[&str] = &[
    // Version control metadata
    "/.git/",
    "/.svn/",
    "/.hg/",
    "/.bzr/",
    // Build output and vendored dependencies
    "/pkg/",
    "/vendor/",
    "/coverage/",
    "/spec/fixtures/modules/",
    // Checksum and revision files
    "/checksums.json",
    "/REVISION",
    // Project configuration for this tool
    "/.modbuild.toml",
    // Editor backups
    "*~",
    ".*.sw[op]",
];

/// Returns the ignore file to use for `source`, if any.
pub fn find_ignore_file(source: &Path) -> Option<PathBuf> {
    IGNORE_FILES
        .iter()
        .map(|name| source.join(name))
        .find(|path| path.is_file() && File::open(path).is_ok())
}

/// Escapes glob metacharacters so `text` matches only itself when used as
/// part of a rule.
pub fn escape_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '?' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// # Build a Module Matcher (`module_matcher`)
///
/// Assembles the full rule list for the module rooted at `source`, in
/// evaluation order: ignore file lines, `extra` rules, `self_exclusions`,
/// then [`DEFAULT_IGNORED`].
///
/// ## Errors
///
/// Returns an `Err` if the selected ignore file cannot be read as UTF-8 text.
pub fn module_matcher(
    source: &Path,
    extra: &[String],
    self_exclusions: &[String],
) -> Result<IgnoreMatcher> {
    let file_content = match find_ignore_file(source) {
        Some(path) => {
            debug!("Using ignore file {}", path.display());
            read_file_to_string(&path)?
        }
        None => {
            debug!("No ignore file found in {}", source.display());
            String::new()
        }
    };

    let mut matcher = IgnoreMatcher::from_patterns(file_content.lines());
    matcher.extend(extra);
    matcher.extend(self_exclusions);
    matcher.extend(DEFAULT_IGNORED);

    for rule in matcher.rules() {
        debug!(
            "Ignore rule {:?} (negated: {}, anchored: {}, directory only: {})",
            rule.line, rule.negated, rule.anchored, rule.dir_only
        );
    }
    Ok(matcher)
}
