//! Configuration snapshot export and import for directory admin installations.
//!
//! The pipeline runs in three steps:
//!
//! 1. [`Exporter`] reads a [`ConfigStore`](diradmin_store::ConfigStore) into a [`Snapshot`].
//! 2. [`StepBuilder`] turns a snapshot into a tree of [`ImportUnit`]s, all inactive.
//! 3. After the caller activates the units it wants, [`Importer`] writes them back, isolating
//!    per-profile and per-template failures into one aggregate error.

#![deny(missing_docs)]

pub mod builder;
pub mod export;
pub mod import;
pub mod snapshot;
pub mod unit;

pub use builder::{StepBuilder, UnitPlan, UnknownSectionWarning};
pub use export::Exporter;
pub use import::{ImportReport, Importer};
pub use snapshot::{Section, Snapshot, TemplateEntry};
pub use unit::{
    activate, activate_all, find_unit_mut, leaves, ContainerKind, ImportUnit, UnitIdentity,
    UnitIter, UnitKind, UnitNode,
};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = diradmin_core::Result<T>;
