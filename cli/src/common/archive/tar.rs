//! # Modbuild TAR Archive Operations (`common::archive::tar`)
//!
//! File: cli/src/common/archive/tar.rs
//!
//! ## Overview
//!
//! Serializes a staged build directory into the final `.tar.gz` package. The
//! archive is strictly ustar: every header is built by hand from
//! [`encode_entry_path`], so the `tar` crate never falls back to GNU long-name
//! or PAX records.
//!
//! ## Architecture
//!
//! - The `tar` crate writes headers and data, `flate2` compresses the stream.
//! - Output goes to a `tempfile::NamedTempFile` in the destination directory
//!   and is only persisted under its final name after both the tar trailer and
//!   the gzip footer have been written. A failure at any point drops the
//!   temporary file.
//! - The build directory is walked in sorted pre-order, starting with the
//!   release-named directory itself, so extracting the package yields a single
//!   top-level folder.
//! - Permission bits are normalized with [`normalize_mode`]: bits are only
//!   added, never removed.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive::tar::ArchiveAssembler;
//! # use std::path::Path;
//!
//! # fn main() -> crate::core::error::Result<()> {
//! let assembler = ArchiveAssembler::new(Path::new("/tmp/mymod/pkg"), "mymod-1.2.0");
//! let written = assembler.assemble(Path::new("/tmp/mymod/pkg/mymod-1.2.0.tar.gz"))?;
//! println!("Wrote {} entries", written);
//! # Ok(())
//! # }
//! ```
//!
use crate::common::archive::ustar::encode_entry_path;
use crate::common::fs::io::permission_bits;
use crate::core::error::{ModbuildError, Result};
use anyhow::Context;
use flate2::{write::GzEncoder, Compression};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::UNIX_EPOCH;
use tar::{EntryType, Header};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Minimum mode of a packaged directory.
pub const DEFAULT_DIR_MODE: u32 = 0o755;
/// Minimum mode of a packaged file.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Adds the default bits for the entry kind to `mode`.
pub fn normalize_mode(mode: u32, is_dir: bool) -> u32 {
    let default = if is_dir {
        DEFAULT_DIR_MODE
    } else {
        DEFAULT_FILE_MODE
    };
    mode | default
}

/// Writes a staged build directory as a gzipped ustar archive.
#[derive(Debug)]
pub struct ArchiveAssembler<'a> {
    parent_dir: &'a Path,
    build_dir_name: &'a str,
}

impl<'a> ArchiveAssembler<'a> {
    /// `parent_dir` is the staging root; `build_dir_name` the release-named
    /// directory inside it. Entry names are relative to `parent_dir`.
    pub fn new(parent_dir: &'a Path, build_dir_name: &'a str) -> Self {
        Self {
            parent_dir,
            build_dir_name,
        }
    }

    /// # Assemble the Package (`assemble`)
    ///
    /// Replaces `output_path` with a gzip-compressed tar of the build
    /// directory. Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// - `ModbuildError::UnpackablePath` if an entry name cannot be ustar-encoded.
    /// - Any I/O error while reading the build directory or writing the archive.
    ///   In every error case nothing is left at `output_path`.
    pub fn assemble(&self, output_path: &Path) -> Result<usize> {
        if output_path.exists() {
            fs::remove_file(output_path)
                .with_context(|| format!("Failed to remove existing package {:?}", output_path))?;
            debug!("Removed existing package {:?}", output_path);
        }

        let out_dir = match output_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(out_dir)
            .with_context(|| format!("Failed to create a temporary file in {:?}", out_dir))?;

        let encoder = GzEncoder::new(BufWriter::new(temp.as_file()), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let written = self.append_entries(&mut builder)?;

        let encoder = builder
            .into_inner()
            .context("Failed to finalize tar archive structure")?;
        encoder
            .finish()
            .context("Failed to finish gzip compression stream")?
            .flush()
            .context("Failed to flush package contents")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))
                .with_context(|| format!("Failed to set permissions of {:?}", temp.path()))?;
        }

        temp.persist(output_path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to write package {:?}", output_path))?;
        debug!("Wrote {} entries to {:?}", written, output_path);
        Ok(written)
    }

    fn append_entries<W: Write>(&self, builder: &mut tar::Builder<W>) -> Result<usize> {
        let build_dir = self.parent_dir.join(self.build_dir_name);
        let mut written = 0;

        for entry in WalkDir::new(&build_dir)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry
                .with_context(|| format!("Failed to walk build directory {:?}", build_dir))?;
            let path = entry.path();
            let file_type = entry.file_type();
            if !file_type.is_dir() && !file_type.is_file() {
                warn!("Skipping {:?}: not a regular file or directory", path);
                continue;
            }
            let is_dir = file_type.is_dir();

            let relative = path
                .strip_prefix(self.parent_dir)
                .with_context(|| format!("{:?} is outside {:?}", path, self.parent_dir))?;
            let meta = entry
                .metadata()
                .with_context(|| format!("Failed to read metadata of {:?}", path))?;

            let original = permission_bits(&meta);
            let mode = normalize_mode(original, is_dir);
            if mode != original {
                warn!(
                    "Updated permissions of packaged '{}' to {:o}",
                    relative.display(),
                    mode
                );
            }

            let mut header = self.header_for(relative, is_dir)?;
            header.set_mode(mode);
            header.set_size(if is_dir { 0 } else { meta.len() });
            let mtime = meta
                .modified()
                .ok()
                .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or(0);
            header.set_mtime(mtime);
            header.set_uid(0);
            header.set_gid(0);
            header.set_cksum();

            let appended = if is_dir {
                builder.append(&header, io::empty())
            } else {
                let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
                builder.append(&header, file)
            };
            appended.with_context(|| format!("Failed to add {:?} to the archive", relative))?;

            debug!("Added {} to the archive", relative.display());
            written += 1;
        }

        Ok(written)
    }

    /// Ustar header with the name and prefix fields filled in and the entry
    /// type set.
    fn header_for(&self, relative: &Path, is_dir: bool) -> Result<Header> {
        let encoded = encode_entry_path(relative).map_err(ModbuildError::from)?;

        let mut header = Header::new_ustar();
        header.set_entry_type(if is_dir {
            EntryType::Directory
        } else {
            EntryType::Regular
        });
        let ustar = header.as_ustar_mut().ok_or_else(|| {
            anyhow::anyhow!(ModbuildError::FileSystem(
                "tar header is not in ustar format".to_string()
            ))
        })?;
        ustar.name[..encoded.name.len()].copy_from_slice(encoded.name.as_bytes());
        ustar.prefix[..encoded.prefix.len()].copy_from_slice(encoded.prefix.as_bytes());
        Ok(header)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::path::PathBuf;
    use tar::Archive;
    use tempfile::{tempdir, TempDir};

    struct Listed {
        path: String,
        mode: u32,
        is_dir: bool,
        raw_name: Vec<u8>,
        raw_prefix: Vec<u8>,
    }

    fn read_back(package: &Path) -> Result<Vec<Listed>> {
        let mut archive = Archive::new(GzDecoder::new(File::open(package)?));
        let mut listed = Vec::new();
        for entry in archive.entries()? {
            let entry = entry?;
            let header = entry.header();
            let ustar = header.as_ustar().context("not a ustar header")?;
            let trim = |field: &[u8]| -> Vec<u8> {
                field.iter().copied().take_while(|b| *b != 0).collect()
            };
            listed.push(Listed {
                path: entry.path()?.to_string_lossy().replace('\\', "/"),
                mode: header.mode()?,
                is_dir: header.entry_type() == EntryType::Directory,
                raw_name: trim(&ustar.name),
                raw_prefix: trim(&ustar.prefix),
            });
        }
        Ok(listed)
    }

    fn staged_tree() -> Result<(TempDir, PathBuf)> {
        let dir = tempdir()?;
        let parent = dir.path().canonicalize()?;
        let build = parent.join("mymod-1.2.0");
        fs::create_dir_all(build.join("manifests"))?;
        fs::write(build.join("metadata.json"), r#"{"name":"mymod","version":"1.2.0"}"#)?;
        fs::write(build.join("manifests/init.pp"), "class mymod {}")?;
        Ok((dir, parent))
    }

    #[test]
    fn test_normalize_mode() {
        assert_eq!(normalize_mode(0o600, false), 0o644);
        assert_eq!(normalize_mode(0o755, false), 0o755);
        assert_eq!(normalize_mode(0o700, true), 0o755);
        assert_eq!(normalize_mode(0o4750, false), 0o4754);
    }

    #[test]
    fn test_assemble_writes_release_directory_first() -> Result<()> {
        let (_dir, parent) = staged_tree()?;
        let package = parent.join("mymod-1.2.0.tar.gz");

        let written = ArchiveAssembler::new(&parent, "mymod-1.2.0").assemble(&package)?;
        assert_eq!(written, 4);

        let listed = read_back(&package)?;
        let paths: Vec<&str> = listed.iter().map(|l| l.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "mymod-1.2.0",
                "mymod-1.2.0/manifests",
                "mymod-1.2.0/manifests/init.pp",
                "mymod-1.2.0/metadata.json",
            ]
        );
        assert!(listed[0].is_dir);
        assert!(!listed[0].raw_name.ends_with(b"/"));
        assert!(!listed[3].is_dir);
        Ok(())
    }

    #[test]
    fn test_assemble_splits_long_names_into_prefix() -> Result<()> {
        let (_dir, parent) = staged_tree()?;
        let deep = parent
            .join("mymod-1.2.0")
            .join("a".repeat(60))
            .join("b".repeat(60));
        fs::create_dir_all(&deep)?;
        fs::write(deep.join("file.txt"), "x")?;
        let package = parent.join("out.tar.gz");

        ArchiveAssembler::new(&parent, "mymod-1.2.0").assemble(&package)?;

        let listed = read_back(&package)?;
        let long = listed
            .iter()
            .find(|l| l.path.ends_with("file.txt"))
            .context("long entry missing")?;
        assert!(!long.raw_prefix.is_empty());
        assert!(long.raw_name.len() <= 100);
        assert_eq!(
            long.path,
            format!("mymod-1.2.0/{}/{}/file.txt", "a".repeat(60), "b".repeat(60))
        );
        Ok(())
    }

    #[test]
    fn test_assemble_replaces_existing_package() -> Result<()> {
        let (_dir, parent) = staged_tree()?;
        let package = parent.join("mymod-1.2.0.tar.gz");
        fs::write(&package, "stale")?;

        ArchiveAssembler::new(&parent, "mymod-1.2.0").assemble(&package)?;
        assert_eq!(read_back(&package)?.len(), 4);
        Ok(())
    }

    #[test]
    fn test_failed_assembly_leaves_no_package() -> Result<()> {
        let (_dir, parent) = staged_tree()?;
        fs::write(parent.join("mymod-1.2.0").join("x".repeat(120)), "x")?;
        let package = parent.join("mymod-1.2.0.tar.gz");

        let err = ArchiveAssembler::new(&parent, "mymod-1.2.0")
            .assemble(&package)
            .unwrap_err();
        assert!(err.to_string().contains("could not be split"));
        assert!(!package.exists());
        let leftovers: Vec<_> = fs::read_dir(&parent)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_assemble_normalizes_modes() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, parent) = staged_tree()?;
        let build = parent.join("mymod-1.2.0");
        fs::create_dir(build.join("private"))?;
        fs::write(build.join("secret.txt"), "x")?;
        fs::write(build.join("run.sh"), "#!/bin/sh")?;
        fs::set_permissions(build.join("private"), fs::Permissions::from_mode(0o700))?;
        fs::set_permissions(build.join("secret.txt"), fs::Permissions::from_mode(0o600))?;
        fs::set_permissions(build.join("run.sh"), fs::Permissions::from_mode(0o755))?;
        let package = parent.join("mymod-1.2.0.tar.gz");

        ArchiveAssembler::new(&parent, "mymod-1.2.0").assemble(&package)?;

        let listed = read_back(&package)?;
        let mode_of = |name: &str| -> Option<u32> {
            listed.iter().find(|l| l.path == name).map(|l| l.mode)
        };
        assert_eq!(mode_of("mymod-1.2.0/private"), Some(0o755));
        assert_eq!(mode_of("mymod-1.2.0/secret.txt"), Some(0o644));
        assert_eq!(mode_of("mymod-1.2.0/run.sh"), Some(0o755));
        assert_eq!(fs::metadata(&package)?.permissions().mode() & 0o777, 0o644);
        Ok(())
    }
}
