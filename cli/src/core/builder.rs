//! # Modbuild Package Builder
//!
//! File: cli/src/core/builder.rs
//!
//! ## Overview
//!
//! [`ModuleBuilder`] turns a module source directory into
//! `{destination}/{name}-{version}.tar.gz`. It sequences the engines in
//! `common`: validating the source, reading metadata, compiling the ignore
//! rules, staging the module into a temporary build directory, and assembling
//! the archive.
//!
//! ## Architecture
//!
//! A build moves through [`BuildPhase`]s:
//!
//! `Created → SourceValidated → Staging → Assembling → Done`
//!
//! - **Source validation** happens on first access. The source must be a
//!   readable directory; it is canonicalized once and cached.
//! - **Metadata and release name** are read lazily and memoized. Problems with
//!   either are configuration errors raised before anything is written.
//! - **Staging** recreates `{destination}/{release}` from scratch, then runs the
//!   `TreeWalker` with a `Stager`.
//! - **Assembling** writes the package with the `ArchiveAssembler`.
//!
//! The build directory is owned by a [`BuildDirGuard`]. Its `Drop` removes the
//! directory, so it is cleaned up whether staging or assembly succeeds, fails,
//! or panics.
//!
//! The package destination defaults to `<source>/pkg`. When it lies inside the
//! source, ignore rules excluding it are added so a module never packages its
//! own output.
//!
use crate::common::archive::tar::ArchiveAssembler;
use crate::common::archive::ustar::to_slash_path;
use crate::common::fs::copy::Stager;
use crate::common::fs::io::{
    ensure_dir_exists, is_readable_dir, remove_dir_if_exists, resolve_dir_path,
};
use crate::common::fs::walk::TreeWalker;
use crate::common::ignore::{escape_literal, module_matcher, IgnoreMatcher};
use crate::core::error::{ModbuildError, Result};
use crate::core::metadata::{read_metadata, ModuleMetadata};
use anyhow::{anyhow, Context};
use std::cell::{Cell, OnceCell};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the default destination directory inside the module source.
pub const DEFAULT_DESTINATION: &str = "pkg";

/// Where a build is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Created,
    SourceValidated,
    Staging,
    Assembling,
    Done,
}

/// The staging root and the release-named directory inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub parent_dir: PathBuf,
    pub build_dir_name: String,
}

impl BuildContext {
    pub fn build_dir(&self) -> PathBuf {
        self.parent_dir.join(&self.build_dir_name)
    }

    pub fn package_file(&self) -> PathBuf {
        self.parent_dir.join(format!("{}.tar.gz", self.build_dir_name))
    }
}

/// Removes the build directory when dropped.
#[derive(Debug)]
pub struct BuildDirGuard {
    path: PathBuf,
}

impl BuildDirGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BuildDirGuard {
    fn drop(&mut self) {
        match remove_dir_if_exists(&self.path) {
            Ok(()) => debug!("Cleaned up build directory {:?}", self.path),
            Err(e) => warn!("Failed to clean up build directory {:?}: {:#}", self.path, e),
        }
    }
}

/// Builds a package from a module source directory.
#[derive(Debug)]
pub struct ModuleBuilder {
    source: PathBuf,
    destination: Option<PathBuf>,
    extra_ignore: Vec<String>,
    validated_source: OnceCell<PathBuf>,
    metadata: OnceCell<ModuleMetadata>,
    release_name: OnceCell<String>,
    phase: Cell<BuildPhase>,
}

impl ModuleBuilder {
    /// A builder for the module at `source`. Nothing is checked until first use.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: None,
            extra_ignore: Vec::new(),
            validated_source: OnceCell::new(),
            metadata: OnceCell::new(),
            release_name: OnceCell::new(),
            phase: Cell::new(BuildPhase::Created),
        }
    }

    /// Output directory for the package. `None` means `<source>/pkg`.
    pub fn with_destination(mut self, destination: Option<PathBuf>) -> Self {
        self.destination = destination;
        self
    }

    /// Extra ignore rules, evaluated after the module's ignore file.
    pub fn with_ignore_rules(mut self, rules: Vec<String>) -> Self {
        self.extra_ignore = rules;
        self
    }

    /// Replaces the `{name}-{version}` release name.
    pub fn with_release_name(mut self, release_name: impl Into<String>) -> Self {
        self.release_name = OnceCell::from(release_name.into());
        self
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase.get()
    }

    /// # Validated Source Directory (`source`)
    ///
    /// The canonical module source path, checked and resolved on first call.
    ///
    /// # Errors
    ///
    /// Returns a `ModbuildError::Config` if the source is not a readable
    /// directory.
    pub fn source(&self) -> Result<&Path> {
        if let Some(source) = self.validated_source.get() {
            return Ok(source);
        }

        let invalid = || {
            anyhow!(ModbuildError::Config(format!(
                "Module source '{}' does not exist as a directory or is not readable.",
                self.source.display()
            )))
        };
        if !is_readable_dir(&self.source) {
            return Err(invalid());
        }
        let canonical = self.source.canonicalize().map_err(|_| invalid())?;
        debug!("Validated module source {:?}", canonical);

        self.phase.set(BuildPhase::SourceValidated);
        Ok(self.validated_source.get_or_init(|| canonical))
    }

    /// The module's parsed `metadata.json`, read once.
    pub fn metadata(&self) -> Result<&ModuleMetadata> {
        if let Some(metadata) = self.metadata.get() {
            return Ok(metadata);
        }
        let metadata = read_metadata(self.source()?)?;
        Ok(self.metadata.get_or_init(|| metadata))
    }

    /// `{name}-{version}` unless overridden.
    pub fn release_name(&self) -> Result<&str> {
        if let Some(name) = self.release_name.get() {
            return Ok(name);
        }
        let name = self.metadata()?.release_name();
        Ok(self.release_name.get_or_init(|| name))
    }

    /// The resolved destination directory (which may not exist yet).
    pub fn destination(&self) -> Result<PathBuf> {
        match &self.destination {
            Some(destination) => resolve_dir_path(destination),
            None => Ok(self.source()?.join(DEFAULT_DESTINATION)),
        }
    }

    /// # Build Context (`build_context`)
    ///
    /// The destination and release name the build will use.
    ///
    /// # Errors
    ///
    /// Returns a `ModbuildError::Config` if the build directory is the module
    /// source or one of its ancestors. Nothing is removed in that case.
    pub fn build_context(&self) -> Result<BuildContext> {
        let context = BuildContext {
            parent_dir: self.destination()?,
            build_dir_name: self.release_name()?.to_string(),
        };
        let build_dir = context.build_dir();
        if self.source()?.starts_with(&build_dir) {
            return Err(anyhow!(ModbuildError::Config(format!(
                "Build directory '{}' would overwrite the module source. Choose another destination or release name.",
                build_dir.display()
            ))));
        }
        Ok(context)
    }

    /// Path the package will be written to.
    pub fn package_file(&self) -> Result<PathBuf> {
        Ok(self.build_context()?.package_file())
    }

    pub fn package_already_exists(&self) -> Result<bool> {
        Ok(self.package_file()?.exists())
    }

    /// Rules keeping the destination out of the package when it lies inside
    /// the source.
    pub fn self_exclusions(&self) -> Result<Vec<String>> {
        let source = self.source()?;
        let destination = self.destination()?;

        if destination == source {
            let release = escape_literal(self.release_name()?);
            return Ok(vec![
                format!("/{}/", release),
                format!("/{}.tar.gz", release),
            ]);
        }
        match destination.strip_prefix(source) {
            Ok(relative) => Ok(vec![format!(
                "/{}/",
                escape_literal(&to_slash_path(relative))
            )]),
            Err(_) => Ok(Vec::new()),
        }
    }

    /// The complete rule set for this module.
    pub fn ignore_matcher(&self) -> Result<IgnoreMatcher> {
        module_matcher(self.source()?, &self.extra_ignore, &self.self_exclusions()?)
    }

    /// # Build the Package (`build`)
    ///
    /// Stages the module and writes the package, replacing any existing file.
    /// Returns the package path.
    ///
    /// # Errors
    ///
    /// - `ModbuildError::Config` for source or metadata problems, before any
    ///   file is written.
    /// - `ModbuildError::UnpackablePath` if a file cannot be packaged.
    /// - Filesystem errors while staging or writing.
    ///
    /// On error no package is left at the output path and the build directory
    /// is removed.
    pub fn build(&self) -> Result<PathBuf> {
        let source = self.source()?.to_path_buf();
        let context = self.build_context()?;
        let build_dir = context.build_dir();
        let package_file = context.package_file();
        info!("Building {} from {}", context.build_dir_name, source.display());

        remove_dir_if_exists(&build_dir)
            .with_context(|| format!("Failed to clear build directory {:?}", build_dir))?;
        ensure_dir_exists(&build_dir)?;
        let guard = BuildDirGuard::new(&build_dir);

        self.phase.set(BuildPhase::Staging);
        let matcher = self.ignore_matcher()?;
        let stager = Stager::new(&source, guard.path());
        let summary = TreeWalker::new(&source, &matcher).stage_into(&stager)?;
        info!(
            "Staged {} files and {} directories ({} ignored, {} skipped)",
            summary.files, summary.directories, summary.pruned, summary.skipped
        );

        self.phase.set(BuildPhase::Assembling);
        ArchiveAssembler::new(&context.parent_dir, &context.build_dir_name)
            .assemble(&package_file)?;

        self.phase.set(BuildPhase::Done);
        info!("Wrote package {}", package_file.display());
        Ok(package_file)
    }
}
