//! Directory-backed configuration store.

use crate::{store::ConfigStore, Result};
use async_trait::async_trait;
use diradmin_core::config::{validate_name, SETTINGS_FILE_EXTENSION};
use diradmin_core::{Error, MainConfig, ProfileSettings, StoreConfig};
use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use validator::Validate;

/// Configuration store that keeps each settings document in its own JSON file.
///
/// Writes are serialized through an internal lock and land atomically (temp file + rename), so
/// a reader never observes a half-written document.
pub struct FileConfigStore {
    config: Arc<StoreConfig>,
    write_lock: Mutex<()>,
}

impl FileConfigStore {
    /// Creates a store over the layout described by `config`.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config: Arc::new(config),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the configuration handle backing this store.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn write_document<T: Serialize + Sync>(&self, path: &Path, value: &T) -> Result<()> {
        let content = serde_json::to_vec_pretty(value)?;
        let _guard = self.write_lock.lock().await;
        write_atomic(path, &content).await
    }

    async fn try_save_profile(&self, name: &str, settings: &ProfileSettings) -> Result<()> {
        let path = self.config.profile_path(name)?;
        settings.validate()?;
        self.write_document(&path, settings).await
    }

    async fn try_save_template(
        &self,
        profile: &str,
        type_id: &str,
        name: &str,
        data: &Value,
    ) -> Result<()> {
        let path = self.config.template_path(profile, type_id, name)?;
        self.write_document(&path, data).await
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load_main_config(&self) -> Result<MainConfig> {
        let path = self.config.main_config_path();
        match read_optional(&path).await? {
            Some(content) => Ok(serde_json::from_slice(&content)?),
            None => {
                debug!("no global settings at {}, using defaults", path.display());
                Ok(MainConfig::default())
            }
        }
    }

    async fn save_main_config(&self, config: &MainConfig) -> Result<()> {
        config.validate()?;
        self.write_document(&self.config.main_config_path(), config)
            .await
            .map_err(|e| Error::store("save_main_config", e))
    }

    async fn load_certificates(&self) -> Result<Vec<u8>> {
        Ok(read_optional(&self.config.certificates_path())
            .await?
            .unwrap_or_default())
    }

    async fn save_certificates(&self, certificates: &[u8]) -> Result<()> {
        let path = self.config.certificates_path();
        let _guard = self.write_lock.lock().await;
        if certificates.is_empty() {
            return match fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(Error::store("save_certificates", e)),
            };
        }
        write_atomic(&path, certificates)
            .await
            .map_err(|e| Error::store("save_certificates", e))
    }

    async fn list_profiles(&self) -> Result<Vec<String>> {
        list_documents(&self.config.profiles_path()).await
    }

    async fn load_profile(&self, name: &str) -> Result<ProfileSettings> {
        let path = self.config.profile_path(name)?;
        let content = fs::read(&path)
            .await
            .map_err(|e| io_error(&path, &e))?;
        Ok(serde_json::from_slice(&content)?)
    }

    async fn save_profile(&self, name: &str, settings: &ProfileSettings) -> bool {
        match self.try_save_profile(name, settings).await {
            Ok(()) => true,
            Err(err) => {
                warn!(profile = %name, "failed to save profile: {err}");
                false
            }
        }
    }

    async fn list_active_types(&self, profile: &str) -> Result<Vec<String>> {
        Ok(self.load_profile(profile).await?.active_types)
    }

    async fn list_templates(&self, profile: &str, type_id: &str) -> Result<Vec<String>> {
        list_documents(&self.config.template_type_path(profile, type_id)?).await
    }

    async fn load_template(&self, profile: &str, type_id: &str, name: &str) -> Result<Value> {
        let path = self.config.template_path(profile, type_id, name)?;
        let content = fs::read(&path)
            .await
            .map_err(|e| io_error(&path, &e))?;
        Ok(serde_json::from_slice(&content)?)
    }

    async fn save_template(
        &self,
        profile: &str,
        type_id: &str,
        name: &str,
        data: &Value,
    ) -> bool {
        match self.try_save_template(profile, type_id, name, data).await {
            Ok(()) => true,
            Err(err) => {
                warn!(profile = %profile, type_id = %type_id, template = %name, "failed to save template: {err}");
                false
            }
        }
    }
}

/// Reads a file, mapping "does not exist" to `None`.
async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path, &e)),
    }
}

/// Lists the stems of settings documents in `dir`; a missing directory holds none.
async fn list_documents(dir: &Path) -> Result<Vec<String>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(dir, &e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(dir, &e))? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(SETTINGS_FILE_EXTENSION) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if validate_name(stem, "Document name").is_err() {
            continue;
        }
        names.push(stem.to_string());
    }
    names.sort();
    Ok(names)
}

/// Writes `content` to `path` via a temp file in the same directory and a rename.
async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(parent, &e))?;
    }

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, content)
        .await
        .map_err(|e| io_error(&temp_path, &e))?;
    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(io_error(path, &e));
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()))
}

fn io_error(path: &Path, err: &std::io::Error) -> Error {
    let message = format!("{}: {err}", path.display());
    if err.kind() == ErrorKind::NotFound {
        Error::NotFound(message)
    } else {
        Error::Io(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diradmin_core::LogLevel;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_store() -> (TempDir, FileConfigStore) {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::new(dir.path()).unwrap();
        (dir, FileConfigStore::new(config))
    }

    #[tokio::test]
    async fn main_config_defaults_when_missing() {
        let (_dir, store) = sample_store();
        let config = store.load_main_config().await.unwrap();
        assert_eq!(config, MainConfig::default());
    }

    #[tokio::test]
    async fn main_config_round_trip() {
        let (_dir, store) = sample_store();
        let mut config = MainConfig::default();
        config.log_level = LogLevel::Debug;
        config.allowed_hosts = vec!["10.0.0.1".to_string()];

        store.save_main_config(&config).await.unwrap();
        assert_eq!(store.load_main_config().await.unwrap(), config);
    }

    #[tokio::test]
    async fn main_config_rejects_invalid_settings() {
        let (_dir, store) = sample_store();
        let mut config = MainConfig::default();
        config.session_timeout = 0;

        let result = store.save_main_config(&config).await;
        assert!(matches!(result, Err(Error::ValidationError(_))));
    }

    #[tokio::test]
    async fn certificates_empty_when_missing_and_removed_on_empty_save() {
        let (dir, store) = sample_store();
        assert!(store.load_certificates().await.unwrap().is_empty());

        store.save_certificates(b"-----BEGIN CERTIFICATE-----").await.unwrap();
        assert_eq!(
            store.load_certificates().await.unwrap(),
            b"-----BEGIN CERTIFICATE-----".to_vec()
        );

        store.save_certificates(&[]).await.unwrap();
        assert!(store.load_certificates().await.unwrap().is_empty());
        assert!(!dir.path().join("serverCerts.pem").exists());
    }

    #[tokio::test]
    async fn profiles_are_listed_sorted() {
        let (_dir, store) = sample_store();
        let settings = ProfileSettings::new("ldap://ldap.example.com").with_active_types(["user"]);
        assert!(store.save_profile("zeta", &settings).await);
        assert!(store.save_profile("alpha", &settings).await);

        assert_eq!(store.list_profiles().await.unwrap(), vec!["alpha", "zeta"]);
        assert_eq!(store.load_profile("alpha").await.unwrap(), settings);
        assert_eq!(store.list_active_types("zeta").await.unwrap(), vec!["user"]);
    }

    #[tokio::test]
    async fn save_profile_reports_failure_without_error() {
        let (_dir, store) = sample_store();
        let settings = ProfileSettings::new("ldap://ldap.example.com");
        assert!(!store.save_profile("../escape", &settings).await);
        assert!(!store.save_profile("bad-url", &ProfileSettings::new("nope")).await);
        assert!(store.list_profiles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_missing_profile_is_not_found() {
        let (_dir, store) = sample_store();
        let result = store.load_profile("ghost").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn templates_round_trip() {
        let (_dir, store) = sample_store();
        let data = json!({"attributes": {"loginShell": "/bin/bash"}});
        assert!(store.save_template("lam", "user", "default", &data).await);
        assert!(store.save_template("lam", "user", "admins", &data).await);

        assert_eq!(
            store.list_templates("lam", "user").await.unwrap(),
            vec!["admins", "default"]
        );
        assert!(store.list_templates("lam", "group").await.unwrap().is_empty());
        assert_eq!(
            store.load_template("lam", "user", "default").await.unwrap(),
            data
        );
    }

    #[tokio::test]
    async fn listing_skips_foreign_files() {
        let (dir, store) = sample_store();
        let profiles = dir.path().join("profiles");
        std::fs::create_dir_all(&profiles).unwrap();
        std::fs::write(profiles.join("notes.txt"), "ignore me").unwrap();
        std::fs::write(profiles.join(".lam.json.1.tmp"), "{}").unwrap();

        assert!(store.list_profiles().await.unwrap().is_empty());
    }
}
