//! # Modbuild Module Metadata
//!
//! File: cli/src/core/metadata.rs
//!
//! ## Overview
//!
//! Reads the module's `metadata.json`. Only `name` and `version` matter to the
//! builder: together they form the release name (`{name}-{version}`) used for
//! the staging directory and the package file. Other fields are accepted and
//! ignored.
//!
//! Each way the file can be unusable is a distinct `ModbuildError::Config`:
//! it is missing (or not a file), it cannot be opened, or it is not valid JSON
//! with string `name` and `version` fields.
//!
use crate::core::error::{ModbuildError, Result};
use anyhow::anyhow;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Name of the metadata file in the module root.
pub const METADATA_FILENAME: &str = "metadata.json";

/// The fields of `metadata.json` the builder uses.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ModuleMetadata {
    pub name: String,
    pub version: String,
}

impl ModuleMetadata {
    /// `{name}-{version}`.
    pub fn release_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

/// # Read Module Metadata (`read_metadata`)
///
/// Parses `<source>/metadata.json`.
///
/// # Errors
///
/// Returns a `ModbuildError::Config` if the file does not exist, cannot be
/// opened or read, or does not contain valid metadata.
pub fn read_metadata(source: &Path) -> Result<ModuleMetadata> {
    let path = source.join(METADATA_FILENAME);

    if !path.is_file() {
        return Err(anyhow!(ModbuildError::Config(format!(
            "'{}' does not exist or is not a file.",
            path.display()
        ))));
    }

    let unreadable = || {
        anyhow!(ModbuildError::Config(format!(
            "Unable to open '{}' for reading.",
            path.display()
        )))
    };
    let mut content = String::new();
    File::open(&path)
        .and_then(|mut file| file.read_to_string(&mut content))
        .map_err(|_| unreadable())?;

    let metadata: ModuleMetadata = serde_json::from_str(&content).map_err(|e| {
        anyhow!(ModbuildError::Config(format!(
            "Invalid JSON in metadata.json: {}",
            e
        )))
    })?;
    debug!("Read metadata for {} {}", metadata.name, metadata.version);
    Ok(metadata)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::fs;
    use tempfile::tempdir;

    fn config_message(err: &anyhow::Error) -> Option<String> {
        match err.downcast_ref::<ModbuildError>() {
            Some(ModbuildError::Config(msg)) => Some(msg.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_read_metadata() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join(METADATA_FILENAME),
            r#"{"name":"mymod","version":"1.2.0","license":"Apache-2.0","dependencies":[]}"#,
        )?;

        let metadata = read_metadata(dir.path())?;
        assert_eq!(metadata.name, "mymod");
        assert_eq!(metadata.version, "1.2.0");
        assert_eq!(metadata.release_name(), "mymod-1.2.0");
        Ok(())
    }

    #[test]
    fn test_missing_metadata() -> Result<()> {
        let dir = tempdir()?;
        let err = read_metadata(dir.path()).unwrap_err();
        let msg = config_message(&err).context("expected a config error")?;
        assert!(msg.ends_with("does not exist or is not a file."));
        Ok(())
    }

    #[test]
    fn test_metadata_is_a_directory() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir(dir.path().join(METADATA_FILENAME))?;
        let err = read_metadata(dir.path()).unwrap_err();
        assert!(config_message(&err).is_some());
        Ok(())
    }

    #[test]
    fn test_invalid_json() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(METADATA_FILENAME), "{ not json")?;
        let err = read_metadata(dir.path()).unwrap_err();
        let msg = config_message(&err).context("expected a config error")?;
        assert!(msg.starts_with("Invalid JSON in metadata.json: "));
        Ok(())
    }

    #[test]
    fn test_missing_version_is_invalid() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(METADATA_FILENAME), r#"{"name":"mymod"}"#)?;
        let err = read_metadata(dir.path()).unwrap_err();
        let msg = config_message(&err).context("expected a config error")?;
        assert!(msg.contains("version"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_metadata() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir()?;
        let path = dir.path().join(METADATA_FILENAME);
        fs::write(&path, "{}")?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000))?;

        // Root can read anything; nothing to check there.
        if File::open(&path).is_ok() {
            return Ok(());
        }
        let err = read_metadata(dir.path()).unwrap_err();
        let msg = config_message(&err).context("expected a config error")?;
        assert!(msg.starts_with("Unable to open"));
        Ok(())
    }
}
