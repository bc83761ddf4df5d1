//! # Ustar Path Encoding (`common::archive::ustar`)
//!
//! File: cli/src/common/archive/ustar.rs
//!
//! ## Overview
//!
//! Packages are written in the POSIX.1-1998 (ustar) tar format so that every
//! consumer, including old tar implementations, can unpack them. Ustar stores
//! an entry path in two header fields:
//!
//! - `name`: up to 100 bytes
//! - `prefix`: up to 155 bytes
//!
//! A reader joins them as `prefix/name`, which gives a hard limit of 256 bytes
//! and the extra requirement that the path can be cut at a `/` so that both
//! halves fit their fields.
//!
//! This module holds the two pure checks applied to every packaged path:
//!
//! - [`validate_path_encoding`]: the path must be 7-bit ASCII.
//! - [`split_ustar_path`]: the path must fit the ustar `prefix`/`name` fields.
//!
//! [`encode_entry_path`] runs both and is what the archive writer uses.
//!
use std::path::Path;
use thiserror::Error;

/// Size of the ustar `name` header field.
pub const NAME_MAX: usize = 100;
/// Size of the ustar `prefix` header field.
pub const PREFIX_MAX: usize = 155;
/// Longest path representable as `prefix/name`.
pub const PATH_MAX: usize = 256;

/// Reasons a relative path cannot be put into a package.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error(
        "'{path}' can only include ASCII characters in its path or filename in order to be compatible with a wide range of hosts."
    )]
    NonAscii { path: String },

    #[error("The path '{path}' is longer than 256 bytes.")]
    TooLong { path: String },

    #[error(
        "'{path}' could not be split at a directory separator into two parts, the first having a maximum length of 155 bytes and the second having a maximum length of 100 bytes."
    )]
    Unsplittable { path: String },
}

/// A path cut into the two ustar header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UstarPath {
    /// Leading directories, empty when the whole path fits in `name`.
    pub prefix: String,
    /// Trailing part of the path.
    pub name: String,
}

/// Fails if `path` contains any byte outside the 7-bit ASCII range.
///
/// Works on the raw encoded bytes, so paths that are not valid UTF-8 are
/// rejected too.
pub fn validate_path_encoding(path: &Path) -> Result<(), PathError> {
    if path
        .as_os_str()
        .as_encoded_bytes()
        .iter()
        .all(|byte| byte.is_ascii())
    {
        Ok(())
    } else {
        Err(PathError::NonAscii {
            path: path.to_string_lossy().into_owned(),
        })
    }
}

/// # Split a Path into Ustar Fields (`split_ustar_path`)
///
/// Validates `path` (relative, `/`-separated) against the ustar limits and
/// returns the `prefix`/`name` pair to store in the header.
///
/// Paths of up to 100 bytes go entirely into `name`. Longer paths are cut at a
/// separator: segments are taken from the right into `name` for as long as the
/// result stays below 100 bytes, and everything left of the cut becomes the
/// `prefix`.
///
/// ## Errors
///
/// - [`PathError::TooLong`] if the path exceeds 256 bytes.
/// - [`PathError::Unsplittable`] if no cut leaves `name` ≤ 100 bytes and
///   `prefix` ≤ 155 bytes.
pub fn split_ustar_path(path: &str) -> Result<UstarPath, PathError> {
    if path.len() > PATH_MAX {
        return Err(PathError::TooLong { path: path.into() });
    }

    if path.len() <= NAME_MAX {
        return Ok(UstarPath {
            prefix: String::new(),
            name: path.to_string(),
        });
    }

    let segments: Vec<&str> = path.split('/').collect();
    // `cut` is the index of the first segment that belongs to `name`.
    let mut cut = segments.len() - 1;
    let mut name_len = segments[cut].len();
    while cut > 0 {
        let next_len = segments[cut - 1].len();
        if name_len + 1 + next_len >= NAME_MAX {
            break;
        }
        name_len += 1 + next_len;
        cut -= 1;
    }

    let name = segments[cut..].join("/");
    let prefix = segments[..cut].join("/");

    if name.len() > NAME_MAX || prefix.len() > PREFIX_MAX {
        return Err(PathError::Unsplittable { path: path.into() });
    }

    Ok(UstarPath { prefix, name })
}

/// Joins the components of `path` with `/`, whatever the platform separator.
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Validates and splits an archive entry path.
pub fn encode_entry_path(path: &Path) -> Result<UstarPath, PathError> {
    validate_path_encoding(path)?;
    split_ustar_path(&to_slash_path(path))
}
