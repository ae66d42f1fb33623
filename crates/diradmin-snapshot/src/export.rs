//! Snapshot export.

use crate::snapshot::{
    encode_certificates, Snapshot, ACCOUNT_PROFILES_SECTION, CERTIFICATES_SECTION,
    MAIN_CONFIG_SECTION, SERVER_PROFILES_SECTION,
};
use crate::Result;
use diradmin_store::ConfigStore;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Reads live configuration state into a [`Snapshot`].
pub struct Exporter {
    store: Arc<dyn ConfigStore>,
}

impl Exporter {
    /// Creates an exporter reading from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Exports the complete configuration.
    ///
    /// Every recognized section is present in the result, empty when there is no data. The
    /// store is only read.
    ///
    /// # Errors
    ///
    /// Returns [`diradmin_core::Error::ExportError`] naming the section whose data could not be
    /// read. Missing certificates are not an error.
    pub async fn export(&self) -> Result<Snapshot> {
        let mut sections = Map::new();

        let main_config = self
            .store
            .load_main_config()
            .await
            .and_then(|config| config.to_value())
            .map_err(|e| e.in_export_section(MAIN_CONFIG_SECTION))?;
        sections.insert(MAIN_CONFIG_SECTION.to_string(), main_config);

        let certificates = self
            .store
            .load_certificates()
            .await
            .map_err(|e| e.in_export_section(CERTIFICATES_SECTION))?;
        sections.insert(
            CERTIFICATES_SECTION.to_string(),
            encode_certificates(&certificates),
        );

        let profiles = self
            .store
            .list_profiles()
            .await
            .map_err(|e| e.in_export_section(SERVER_PROFILES_SECTION))?;

        let server_profiles = self
            .export_server_profiles(&profiles)
            .await
            .map_err(|e| e.in_export_section(SERVER_PROFILES_SECTION))?;
        sections.insert(
            SERVER_PROFILES_SECTION.to_string(),
            Value::Object(server_profiles),
        );

        let account_profiles = self
            .export_account_profiles(&profiles)
            .await
            .map_err(|e| e.in_export_section(ACCOUNT_PROFILES_SECTION))?;
        sections.insert(
            ACCOUNT_PROFILES_SECTION.to_string(),
            Value::Object(account_profiles),
        );

        info!(
            profiles = profiles.len(),
            certificate_bytes = certificates.len(),
            "exported configuration snapshot"
        );
        Ok(Snapshot::from_sections(sections))
    }

    async fn export_server_profiles(&self, profiles: &[String]) -> Result<Map<String, Value>> {
        let mut exported = Map::new();
        for name in profiles {
            let settings = self.store.load_profile(name).await?;
            exported.insert(name.clone(), settings.to_value()?);
        }
        Ok(exported)
    }

    async fn export_account_profiles(&self, profiles: &[String]) -> Result<Map<String, Value>> {
        let mut exported = Map::new();
        for profile in profiles {
            let mut types = Map::new();
            for type_id in self.store.list_active_types(profile).await? {
                let mut templates = Map::new();
                for name in self.store.list_templates(profile, &type_id).await? {
                    let data = self.store.load_template(profile, &type_id, &name).await?;
                    templates.insert(name, data);
                }
                if !templates.is_empty() {
                    types.insert(type_id, Value::Object(templates));
                }
            }
            if types.is_empty() {
                debug!(profile = %profile, "no account templates to export");
            } else {
                exported.insert(profile.clone(), Value::Object(types));
            }
        }
        Ok(exported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diradmin_core::{Error, MainConfig, ProfileSettings};
    use diradmin_store::{MemoryConfigStore, MockConfigStore};
    use serde_json::json;

    fn populated_store() -> MemoryConfigStore {
        MemoryConfigStore::new()
            .with_certificates(b"CERT".to_vec())
            .with_profile(
                "lam",
                ProfileSettings::new("ldap://ldap.example.com").with_active_types(["user", "group"]),
            )
            .with_profile(
                "empty",
                ProfileSettings::new("ldap://other.example.com").with_active_types(["user"]),
            )
            .with_template("lam", "user", "default", json!({"shell": "/bin/bash"}))
            .with_template("lam", "host", "unused", json!({"inactive": true}))
    }

    #[tokio::test]
    async fn exports_every_section_in_order() {
        let exporter = Exporter::new(Arc::new(populated_store()));
        let snapshot = exporter.export().await.unwrap();

        assert_eq!(
            snapshot.section_names(),
            vec!["mainConfig", "certificates", "serverProfiles", "accountProfiles"]
        );
        assert_eq!(snapshot.section("certificates"), Some(&json!("43455254")));

        let profiles = snapshot.section("serverProfiles").unwrap().as_object().unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(
            profiles["lam"]["serverUrl"],
            json!("ldap://ldap.example.com")
        );
    }

    #[tokio::test]
    async fn exports_only_active_types_with_templates() {
        let exporter = Exporter::new(Arc::new(populated_store()));
        let snapshot = exporter.export().await.unwrap();

        let accounts = snapshot.section("accountProfiles").unwrap();
        assert_eq!(
            accounts,
            &json!({"lam": {"user": {"default": {"shell": "/bin/bash"}}}})
        );
    }

    #[tokio::test]
    async fn empty_installation_keeps_all_sections() {
        let exporter = Exporter::new(Arc::new(MemoryConfigStore::new()));
        let snapshot = exporter.export().await.unwrap();

        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.section("certificates"), Some(&json!("")));
        assert_eq!(snapshot.section("serverProfiles"), Some(&json!({})));
        assert_eq!(snapshot.section("accountProfiles"), Some(&json!({})));
        assert_eq!(
            MainConfig::from_value(snapshot.section("mainConfig").unwrap()).unwrap(),
            MainConfig::default()
        );
    }

    #[tokio::test]
    async fn read_failure_names_the_section() {
        let mut store = MockConfigStore::new();
        store
            .expect_load_main_config()
            .returning(|| Ok(MainConfig::default()));
        store.expect_load_certificates().returning(|| Ok(Vec::new()));
        store
            .expect_list_profiles()
            .returning(|| Ok(vec!["lam".to_string()]));
        store
            .expect_load_profile()
            .returning(|_| Err(Error::Io("permission denied".to_string())));

        let exporter = Exporter::new(Arc::new(store));
        let result = exporter.export().await;
        match result {
            Err(Error::ExportError { section, message }) => {
                assert_eq!(section, "serverProfiles");
                assert!(message.contains("permission denied"));
            }
            other => panic!("expected export error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn certificate_read_failure_is_fatal() {
        let mut store = MockConfigStore::new();
        store
            .expect_load_main_config()
            .returning(|| Ok(MainConfig::default()));
        store
            .expect_load_certificates()
            .returning(|| Err(Error::Io("unreadable".to_string())));

        let exporter = Exporter::new(Arc::new(store));
        let result = exporter.export().await;
        assert!(matches!(
            result,
            Err(Error::ExportError { ref section, .. }) if section == "certificates"
        ));
    }
}
