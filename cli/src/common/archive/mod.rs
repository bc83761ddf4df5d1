//! # Modbuild Archive Utilities Module (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//!
//! ## Overview
//!
//! Everything needed to turn a staged build directory into a package file.
//! Packages are gzip-compressed tarballs restricted to the POSIX ustar header
//! format, so every entry name must fit the 100-byte name and 155-byte prefix
//! fields.
//!
//! ## Architecture
//!
//! - **`ustar`**: Pure path checks. Validates that a path is ASCII and splits it
//!   into the ustar prefix/name fields, or reports why it cannot be packaged.
//!   Used both while staging (to fail before copying) and while writing headers.
//! - **`tar`**: The `ArchiveAssembler`, which walks the build directory and
//!   writes the `.tar.gz` with normalized permission bits.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive::{tar::ArchiveAssembler, ustar};
//! use std::path::Path;
//!
//! # fn run() -> anyhow::Result<()> {
//! let split = ustar::split_ustar_path("mymod-1.2.0/manifests/init.pp")?;
//! assert!(split.prefix.is_empty());
//!
//! ArchiveAssembler::new(Path::new("pkg"), "mymod-1.2.0")
//!     .assemble(Path::new("pkg/mymod-1.2.0.tar.gz"))?;
//! # Ok(())
//! # }
//! ```
//!

pub mod tar;
pub mod ustar;
