//! Configuration store implementations for directory admin installations.
//!
//! This crate defines the [`ConfigStore`] seam consumed by the snapshot pipeline, plus a
//! directory-backed store for real installations and an in-memory store.

#![deny(missing_docs)]

mod file;
mod memory;
mod store;

pub use file::FileConfigStore;
pub use memory::MemoryConfigStore;
#[cfg(any(test, feature = "mock"))]
pub use store::MockConfigStore;
pub use store::ConfigStore;

/// Convenient result alias that reuses the core error type.
pub type Result<T> = diradmin_core::Result<T>;
