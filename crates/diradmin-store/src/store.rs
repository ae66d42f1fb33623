//! The configuration store seam.

use crate::Result;
use async_trait::async_trait;
use diradmin_core::{MainConfig, ProfileSettings};
use serde_json::Value;

/// Loads and persists an installation's configuration state.
///
/// Global settings and certificates report write failures as errors. Profile and template
/// writes instead return `false` on failure: callers treat each of those writes as independent
/// and best-effort.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Reads the global settings.
    async fn load_main_config(&self) -> Result<MainConfig>;

    /// Persists the global settings.
    async fn save_main_config(&self, config: &MainConfig) -> Result<()>;

    /// Reads the server certificate bundle; empty when none is stored.
    async fn load_certificates(&self) -> Result<Vec<u8>>;

    /// Replaces the server certificate bundle; an empty slice removes it.
    async fn save_certificates(&self, certificates: &[u8]) -> Result<()>;

    /// Lists configured profile names in sorted order.
    async fn list_profiles(&self) -> Result<Vec<String>>;

    /// Reads one profile's settings.
    async fn load_profile(&self, name: &str) -> Result<ProfileSettings>;

    /// Persists one profile's settings, returning `false` if the write was rejected or failed.
    async fn save_profile(&self, name: &str, settings: &ProfileSettings) -> bool;

    /// Lists the account types enabled in `profile`.
    async fn list_active_types(&self, profile: &str) -> Result<Vec<String>>;

    /// Lists template names for an account type of a profile in sorted order.
    async fn list_templates(&self, profile: &str, type_id: &str) -> Result<Vec<String>>;

    /// Reads one account template.
    async fn load_template(&self, profile: &str, type_id: &str, name: &str) -> Result<Value>;

    /// Persists one account template, returning `false` if the write failed.
    async fn save_template(&self, profile: &str, type_id: &str, name: &str, data: &Value)
        -> bool;
}
