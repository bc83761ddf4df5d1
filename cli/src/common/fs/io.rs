//! # Modbuild Filesystem I/O Operations
//!
//! File: cli/src/common/fs/io.rs
//!

//! ## Overview
//!
//! This module centralizes small filesystem helpers used by the builder:
//!
//! - **`ensure_dir_exists`**: `mkdir -p`, failing if the path is a file.
//! - **`remove_dir_if_exists`**: `rm -rf` of a directory, a no-op if it is absent.
//! - **`is_readable_dir`**: the directory exists and can be listed.
//! - **`resolve_dir_path`**: canonicalizes a path whose tail may not exist yet.
//! - **`read_file_to_string`**: `fs::read_to_string` with context.
//! - **`set_modified_time`**: sets the modification time of a file or directory.
//!
//! All of them wrap `std::fs` errors with `anyhow::Context` naming the path.
//!
use crate::core::error::{ModbuildError, Result}; // Use standard Result and custom Error types
use anyhow::Context; // For adding context to errors
use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug; // Logging utilities

/// Ensures that a directory exists at the specified path.
///
/// If the path does not exist, this function attempts to create the directory,
/// including any necessary parent directories (similar to `mkdir -p`).
/// If the path already exists but is not a directory (e.g., it's a file),
/// an error (`ModbuildError::FileSystem`) is returned.
///
/// # Errors
///
/// Returns an `Err` if:
/// - The path exists but is not a directory.
/// - Creating the directory fails (e.g., due to permissions).
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {:?}", path))?;
        debug!("Created directory: {:?}", path);
    } else if !path.is_dir() {
        anyhow::bail!(ModbuildError::FileSystem(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Recursively removes `path` if it exists. Symlinks are removed, never followed.
pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(path)
                .with_context(|| format!("Failed to remove directory {:?}", path))?;
            debug!("Removed directory: {:?}", path);
        }
        Ok(_) => {
            fs::remove_file(path).with_context(|| format!("Failed to remove {:?}", path))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("Failed to inspect {:?}", path)),
    }
    Ok(())
}

/// Whether `path` is a directory that the current user can list.
pub fn is_readable_dir(path: &Path) -> bool {
    path.is_dir() && fs::read_dir(path).is_ok()
}

/// # Resolve a Possibly Missing Path (`resolve_dir_path`)
///
/// Like `fs::canonicalize`, but the last components of `path` do not have to
/// exist: the longest existing ancestor is canonicalized and the missing tail
/// is appended unchanged. Relative paths are resolved against the current
/// directory first.
pub fn resolve_dir_path(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(path)
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(resolved) = existing.canonicalize() {
            let mut resolved = resolved;
            resolved.extend(missing.iter().rev());
            return Ok(resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            // Nothing along the path resolves (e.g. `..` past the root).
            _ => return Ok(absolute),
        }
    }
}

/// Reads the entire content of a file into a string.
///
/// This is a simple wrapper around `std::fs::read_to_string` that adds
/// contextual information to the error message if reading fails.
pub fn read_file_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
}

/// Sets the modification time of `path`, which may be a file or a directory.
pub fn set_modified_time(path: &Path, modified: SystemTime) -> Result<()> {
    let handle = open_for_times(path)
        .with_context(|| format!("Failed to open {:?} to set its modification time", path))?;
    handle
        .set_times(FileTimes::new().set_modified(modified))
        .with_context(|| format!("Failed to set modification time of {:?}", path))?;
    Ok(())
}

/// Permission bits of an entry (`0o7777` mask on Unix).
///
/// Platforms without Unix modes report `0o444` for read-only entries and
/// `0o644` otherwise.
pub fn permission_bits(meta: &fs::Metadata) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o7777
    }
    #[cfg(not(unix))]
    {
        if meta.permissions().readonly() {
            0o444
        } else {
            0o644
        }
    }
}

#[cfg(unix)]
fn open_for_times(path: &Path) -> std::io::Result<File> {
    // A read-only handle is enough for futimens.
    File::open(path)
}

#[cfg(windows)]
fn open_for_times(path: &Path) -> std::io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;
    const FILE_FLAG_BACKUP_SEMANTICS: u32 = 0x0200_0000;
    fs::OpenOptions::new()
        .write(true)
        .custom_flags(FILE_FLAG_BACKUP_SEMANTICS)
        .open(path)
}

#[cfg(not(any(unix, windows)))]
fn open_for_times(path: &Path) -> std::io::Result<File> {
    fs::OpenOptions::new().write(true).open(path)
}

// --- Unit Tests ---
// Tests for the filesystem I/O utilities.
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Test `ensure_dir_exists` when the directory needs to be created, including parents.
    #[test]
    fn test_ensure_dir_exists_creates_new() -> Result<()> {
        let base_dir = tempdir()?;
        let new_dir = base_dir.path().join("new/subdir");
        assert!(!new_dir.exists());
        ensure_dir_exists(&new_dir)?;
        assert!(new_dir.is_dir());
        Ok(())
    }

    /// Test `ensure_dir_exists` when the target path exists but is a file.
    #[test]
    fn test_ensure_dir_exists_path_is_file() -> Result<()> {
        let base_dir = tempdir()?;
        let file_path = base_dir.path().join("a_file.txt");
        fs::write(&file_path, "hello")?;
        let result = ensure_dir_exists(&file_path);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Path exists but is not a directory"));
        Ok(())
    }

    #[test]
    fn test_remove_dir_if_exists() -> Result<()> {
        let base_dir = tempdir()?;
        let target = base_dir.path().join("build/nested");
        fs::create_dir_all(&target)?;
        fs::write(target.join("file.txt"), "x")?;

        remove_dir_if_exists(&base_dir.path().join("build"))?;
        assert!(!base_dir.path().join("build").exists());

        // Second call is a no-op.
        remove_dir_if_exists(&base_dir.path().join("build"))?;
        Ok(())
    }

    #[test]
    fn test_resolve_dir_path_with_missing_tail() -> Result<()> {
        let base_dir = tempdir()?;
        let canonical_base = base_dir.path().canonicalize()?;
        let resolved = resolve_dir_path(&base_dir.path().join("pkg/out"))?;
        assert_eq!(resolved, canonical_base.join("pkg").join("out"));

        let resolved = resolve_dir_path(base_dir.path())?;
        assert_eq!(resolved, canonical_base);
        Ok(())
    }

    #[test]
    fn test_is_readable_dir() -> Result<()> {
        let base_dir = tempdir()?;
        let file_path = base_dir.path().join("file.txt");
        fs::write(&file_path, "x")?;
        assert!(is_readable_dir(base_dir.path()));
        assert!(!is_readable_dir(&file_path));
        assert!(!is_readable_dir(&base_dir.path().join("missing")));
        Ok(())
    }

    #[test]
    fn test_set_modified_time_on_directory() -> Result<()> {
        let base_dir = tempdir()?;
        let dir = base_dir.path().join("dir");
        fs::create_dir(&dir)?;
        let past = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);
        set_modified_time(&dir, past)?;
        assert_eq!(fs::metadata(&dir)?.modified()?, past);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_bits() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let base_dir = tempdir()?;
        let file_path = base_dir.path().join("script.sh");
        fs::write(&file_path, "#!/bin/sh")?;
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o750))?;
        assert_eq!(permission_bits(&fs::metadata(&file_path)?), 0o750);
        Ok(())
    }

    /// Test `read_file_to_string` when the target file does not exist.
    #[test]
    fn test_read_file_not_found() -> Result<()> {
        let base_dir = tempdir()?;
        let file_path = base_dir.path().join("nonexistent.txt");
        let result = read_file_to_string(&file_path);
        assert!(result.is_err());
        Ok(())
    }
}
