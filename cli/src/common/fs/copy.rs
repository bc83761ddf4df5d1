//! # Modbuild Staging Copy Operations
//!
//! File: cli/src/common/fs/copy.rs
//!

//! ## Overview
//!
//! The [`Stager`] replicates single entries of a module source tree into the
//! parallel location under the temporary build directory. It never walks on its
//! own; the tree walker hands it one path at a time.
//!
//! ## Architecture
//!
//! Every path is first made relative to the source root and checked for pure
//! ASCII. Then, per entry kind:
//!
//! - **Directory**: created (idempotently) with the source directory's
//!   permission bits plus owner write, so a read-only source directory can
//!   still receive its children. The archive widens directory modes to
//!   `0755` anyway.
//! - **Symlink**: never copied or followed. A warning names the link and its
//!   target, both relative to the source root, and the entry is skipped.
//! - **Regular file**: the relative path must also fit the ustar header; the
//!   file is then copied byte-for-byte with its permission bits and timestamps.
//! - Anything else (sockets, FIFOs, devices) is skipped with a warning.
//!
//! Path problems surface as `ModbuildError::UnpackablePath`, whose message tells
//! the user to rename the file or add it to the ignore file.
//!
//! Directory modification times cannot be final until all children are copied,
//! so [`Stager::copy_mtime`] is a separate step the walker runs afterwards.
//!
use crate::common::archive::ustar::{split_ustar_path, to_slash_path, validate_path_encoding};
use crate::common::fs::io::{permission_bits, set_modified_time};
use crate::common::fs::links::{describe_symlink, SymlinkDescription};
use crate::core::error::{ModbuildError, Result};
use anyhow::Context;
use std::fs::{self, File, FileTimes, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// What the stager did with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    /// Symlink left out of the package.
    Symlink,
    /// Socket, FIFO, or device left out of the package.
    Special,
}

/// One entry handled by the stager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEntry {
    pub relative: PathBuf,
    pub kind: EntryKind,
    pub mode: u32,
    pub modified: Option<SystemTime>,
    /// Byte size for files, 0 otherwise.
    pub size: u64,
}

/// Copies source entries into the build directory.
#[derive(Debug)]
pub struct Stager<'a> {
    source: &'a Path,
    build_dir: &'a Path,
}

impl<'a> Stager<'a> {
    /// `source` must be canonical; `build_dir` must already exist.
    pub fn new(source: &'a Path, build_dir: &'a Path) -> Self {
        Self { source, build_dir }
    }

    /// Path of `path` relative to the source root.
    pub fn relative_path(&self, path: &Path) -> Result<PathBuf> {
        path.strip_prefix(self.source)
            .map(Path::to_path_buf)
            .map_err(|_| {
                anyhow::anyhow!(ModbuildError::FileSystem(format!(
                    "{:?} is not inside the module source {:?}",
                    path, self.source
                )))
            })
    }

    /// # Stage One Entry (`stage`)
    ///
    /// Replicates `path` (which must be inside the source root) into the build
    /// directory according to its kind.
    ///
    /// # Errors
    ///
    /// - `ModbuildError::UnpackablePath` if the relative path is not ASCII or,
    ///   for regular files, does not fit the ustar header.
    /// - Filesystem errors while inspecting or copying the entry.
    pub fn stage(&self, path: &Path) -> Result<StagedEntry> {
        let relative = self.relative_path(path)?;
        validate_path_encoding(&relative).map_err(ModbuildError::from)?;

        let dest = self.build_dir.join(&relative);
        let meta = fs::symlink_metadata(path)
            .with_context(|| format!("Failed to read metadata of {:?}", path))?;
        let file_type = meta.file_type();

        let mut entry = StagedEntry {
            relative,
            kind: EntryKind::Special,
            mode: permission_bits(&meta),
            modified: meta.modified().ok(),
            size: 0,
        };

        if file_type.is_symlink() {
            self.warn_symlink(path)?;
            entry.kind = EntryKind::Symlink;
        } else if file_type.is_dir() {
            fs::create_dir_all(&dest)
                .with_context(|| format!("Failed to create directory {:?}", dest))?;
            fs::set_permissions(&dest, writable_dir_permissions(&meta))
                .with_context(|| format!("Failed to set permissions of {:?}", dest))?;
            entry.kind = EntryKind::Directory;
        } else if file_type.is_file() {
            split_ustar_path(&to_slash_path(&entry.relative)).map_err(ModbuildError::from)?;
            copy_file(path, &dest, &meta)?;
            entry.kind = EntryKind::File;
            entry.size = meta.len();
        } else {
            warn!(
                "{} is not a regular file, directory, or symlink and will not be included in the package.",
                entry.relative.display()
            );
        }

        Ok(entry)
    }

    /// Restores the modification time of the staged copy of `path` from the
    /// source.
    pub fn copy_mtime(&self, path: &Path) -> Result<()> {
        let relative = self.relative_path(path)?;
        validate_path_encoding(&relative).map_err(ModbuildError::from)?;

        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .with_context(|| format!("Failed to read modification time of {:?}", path))?;
        set_modified_time(&self.build_dir.join(&relative), modified)
    }

    fn warn_symlink(&self, path: &Path) -> Result<()> {
        let SymlinkDescription { link, target } = describe_symlink(path, self.source)?;
        warn!(
            "Symlinks in modules are not supported and will not be included in the package. Please investigate symlink {} -> {}.",
            link.display(),
            target.display()
        );
        Ok(())
    }
}

/// Source directory permissions with the owner write bit set.
#[cfg(unix)]
fn writable_dir_permissions(meta: &Metadata) -> fs::Permissions {
    use std::os::unix::fs::PermissionsExt;
    fs::Permissions::from_mode(meta.permissions().mode() | 0o200)
}

#[cfg(not(unix))]
fn writable_dir_permissions(meta: &Metadata) -> fs::Permissions {
    meta.permissions()
}

/// Copies content, timestamps, then permissions, all through the new handle
/// so that a read-only source mode does not block the later steps.
fn copy_file(src: &Path, dest: &Path, meta: &Metadata) -> Result<()> {
    let mut reader = File::open(src).with_context(|| format!("Failed to open {:?}", src))?;
    let mut writer = File::create(dest).with_context(|| format!("Failed to create {:?}", dest))?;
    io::copy(&mut reader, &mut writer)
        .with_context(|| format!("Failed to copy {:?} to {:?}", src, dest))?;

    let mut times = FileTimes::new();
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }
    writer
        .set_times(times)
        .with_context(|| format!("Failed to set timestamps of {:?}", dest))?;
    writer
        .set_permissions(meta.permissions())
        .with_context(|| format!("Failed to set permissions of {:?}", dest))?;

    debug!("Copied {:?} to {:?}", src, dest);
    Ok(())
}
