//! # diradmin-core
//!
//! Core types and utilities for directory admin configuration management.
//!
//! This crate provides the shared error type, the configuration handle used to locate an
//! installation's state, and the typed settings documents exchanged by the store and the
//! snapshot pipeline.
//!
//! ## Modules
//!
//! - [`error`] - Error types, error codes and serializable error responses
//! - [`config`] - Configuration handle and on-disk layout
//! - [`types`] - Global and per-profile settings documents

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::StoreConfig;
pub use error::{Error, FormatIssue, Result};
pub use types::{LogLevel, MainConfig, ProfileSettings};
