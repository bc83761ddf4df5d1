//! # Modbuild Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the infrastructure that sits between the CLI
//! commands and the engines in `common`: configuration, error types, module
//! metadata, and the build orchestration itself.
//!
//! ## Architecture
//!
//! The core infrastructure consists of four components:
//! - `builder`: `ModuleBuilder`, which sequences validation, staging, assembly,
//!   and cleanup for one package
//! - `config`: Configuration loading, merging, and validation
//! - `error`: Error types and error handling utilities
//! - `metadata`: Reading `name` and `version` from `metadata.json`
//!
//! ## Usage
//!
//! Core infrastructure is imported by command handlers:
//!
//! ```rust
//! use crate::core::builder::ModuleBuilder; // For building packages
//! use crate::core::config; // For loading configuration
//! use crate::core::error::{ModbuildError, Result}; // For error handling
//! ```
//!
pub mod builder;
pub mod config;
pub mod error;
pub mod metadata;
