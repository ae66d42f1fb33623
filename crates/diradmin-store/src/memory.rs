//! In-process configuration store.

use crate::{store::ConfigStore, Result};
use async_trait::async_trait;
use diradmin_core::config::validate_name;
use diradmin_core::{Error, MainConfig, ProfileSettings};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::warn;
use validator::Validate;

type TemplateKey = (String, String, String);

#[derive(Debug, Default)]
struct MemoryState {
    main_config: MainConfig,
    certificates: Vec<u8>,
    profiles: BTreeMap<String, ProfileSettings>,
    templates: BTreeMap<TemplateKey, Value>,
}

/// Configuration store held entirely in memory.
///
/// Useful for embedding and for exercising export/import without touching disk. Writes apply the
/// same name and settings validation as [`crate::FileConfigStore`]; the `with_*` seeding builders
/// do not validate.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    state: RwLock<MemoryState>,
}

impl MemoryConfigStore {
    /// Creates an empty store with default global settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the global settings.
    #[must_use]
    pub fn with_main_config(self, config: MainConfig) -> Self {
        self.mutate(|state| state.main_config = config);
        self
    }

    /// Seeds the certificate bundle.
    #[must_use]
    pub fn with_certificates(self, certificates: impl Into<Vec<u8>>) -> Self {
        let certificates = certificates.into();
        self.mutate(|state| state.certificates = certificates);
        self
    }

    /// Seeds one profile.
    #[must_use]
    pub fn with_profile(self, name: impl Into<String>, settings: ProfileSettings) -> Self {
        let name = name.into();
        self.mutate(|state| {
            state.profiles.insert(name, settings);
        });
        self
    }

    /// Seeds one account template.
    #[must_use]
    pub fn with_template(
        self,
        profile: impl Into<String>,
        type_id: impl Into<String>,
        name: impl Into<String>,
        data: Value,
    ) -> Self {
        let key = (profile.into(), type_id.into(), name.into());
        self.mutate(|state| {
            state.templates.insert(key, data);
        });
        self
    }

    fn mutate(&self, f: impl FnOnce(&mut MemoryState)) {
        // A poisoned lock still holds consistent data: every mutation is a single assignment.
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state);
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryState) -> T) -> T {
        let state = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&state)
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load_main_config(&self) -> Result<MainConfig> {
        Ok(self.read(|state| state.main_config.clone()))
    }

    async fn save_main_config(&self, config: &MainConfig) -> Result<()> {
        config.validate()?;
        let config = config.clone();
        self.mutate(|state| state.main_config = config);
        Ok(())
    }

    async fn load_certificates(&self) -> Result<Vec<u8>> {
        Ok(self.read(|state| state.certificates.clone()))
    }

    async fn save_certificates(&self, certificates: &[u8]) -> Result<()> {
        let certificates = certificates.to_vec();
        self.mutate(|state| state.certificates = certificates);
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<String>> {
        Ok(self.read(|state| state.profiles.keys().cloned().collect()))
    }

    async fn load_profile(&self, name: &str) -> Result<ProfileSettings> {
        self.read(|state| state.profiles.get(name).cloned())
            .ok_or_else(|| Error::NotFound(format!("profile `{name}`")))
    }

    async fn save_profile(&self, name: &str, settings: &ProfileSettings) -> bool {
        let checked = validate_name(name, "Profile name")
            .and_then(|()| settings.validate().map_err(Error::from));
        if let Err(err) = checked {
            warn!(profile = %name, "rejected profile settings: {err}");
            return false;
        }
        let (name, settings) = (name.to_string(), settings.clone());
        self.mutate(|state| {
            state.profiles.insert(name, settings);
        });
        true
    }

    async fn list_active_types(&self, profile: &str) -> Result<Vec<String>> {
        Ok(self.load_profile(profile).await?.active_types)
    }

    async fn list_templates(&self, profile: &str, type_id: &str) -> Result<Vec<String>> {
        Ok(self.read(|state| {
            state
                .templates
                .keys()
                .filter(|(p, t, _)| p == profile && t == type_id)
                .map(|(_, _, name)| name.clone())
                .collect()
        }))
    }

    async fn load_template(&self, profile: &str, type_id: &str, name: &str) -> Result<Value> {
        let key = (profile.to_string(), type_id.to_string(), name.to_string());
        self.read(|state| state.templates.get(&key).cloned())
            .ok_or_else(|| Error::NotFound(format!("template `{profile}:{type_id}:{name}`")))
    }

    async fn save_template(
        &self,
        profile: &str,
        type_id: &str,
        name: &str,
        data: &Value,
    ) -> bool {
        let checked = validate_name(profile, "Profile name")
            .and_then(|()| validate_name(type_id, "Account type"))
            .and_then(|()| validate_name(name, "Template name"));
        if let Err(err) = checked {
            warn!(profile = %profile, type_id = %type_id, template = %name, "rejected template: {err}");
            return false;
        }
        let key = (profile.to_string(), type_id.to_string(), name.to_string());
        let data = data.clone();
        self.mutate(|state| {
            state.templates.insert(key, data);
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn seeded_state_is_visible() {
        let store = MemoryConfigStore::new()
            .with_certificates(b"pem".to_vec())
            .with_profile(
                "lam",
                ProfileSettings::new("ldap://ldap.example.com").with_active_types(["user"]),
            )
            .with_template("lam", "user", "default", json!({"shell": "/bin/sh"}));

        assert_eq!(store.load_certificates().await.unwrap(), b"pem".to_vec());
        assert_eq!(store.list_profiles().await.unwrap(), vec!["lam"]);
        assert_eq!(store.list_active_types("lam").await.unwrap(), vec!["user"]);
        assert_eq!(
            store.list_templates("lam", "user").await.unwrap(),
            vec!["default"]
        );
        assert_eq!(
            store.load_template("lam", "user", "default").await.unwrap(),
            json!({"shell": "/bin/sh"})
        );
    }

    #[tokio::test]
    async fn missing_entries_are_not_found() {
        let store = MemoryConfigStore::new();
        assert!(matches!(
            store.load_profile("ghost").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.load_template("ghost", "user", "x").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.list_active_types("ghost").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_profile_is_rejected() {
        let store = MemoryConfigStore::new();
        assert!(!store.save_profile("broken", &ProfileSettings::new("::")).await);
        assert!(store.list_profiles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn path_like_names_are_rejected() {
        let store = MemoryConfigStore::new();
        let settings = ProfileSettings::new("ldap://ldap.example.com");
        assert!(!store.save_profile("../x", &settings).await);
        assert!(!store.save_template("../x", "user", "t", &json!({})).await);
        assert!(!store.save_template("a", "us/er", "t", &json!({})).await);
        assert!(!store.save_template("a", "user", "", &json!({})).await);

        assert!(store.list_profiles().await.unwrap().is_empty());
        assert!(store.list_templates("../x", "user").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn templates_are_scoped_by_profile_and_type() {
        let store = MemoryConfigStore::new();
        assert!(store.save_template("a", "user", "t1", &json!(1)).await);
        assert!(store.save_template("a", "group", "t2", &json!(2)).await);
        assert!(store.save_template("b", "user", "t3", &json!(3)).await);

        assert_eq!(store.list_templates("a", "user").await.unwrap(), vec!["t1"]);
        assert_eq!(store.list_templates("a", "group").await.unwrap(), vec!["t2"]);
        assert_eq!(store.list_templates("b", "user").await.unwrap(), vec!["t3"]);
    }
}
