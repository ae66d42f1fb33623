//! Configuration handle for locating an installation's configuration state.
//!
//! A [`StoreConfig`] is passed explicitly to the store that reads and writes configuration, so
//! exports and imports never depend on process-wide state.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Default file name for the global settings.
pub const DEFAULT_MAIN_CONFIG_FILE: &str = "config.json";
/// Default file name for the server certificate bundle.
pub const DEFAULT_CERTIFICATES_FILE: &str = "serverCerts.pem";
/// Default directory holding one settings file per server profile.
pub const DEFAULT_PROFILES_DIR: &str = "profiles";
/// Default directory holding account templates, nested by profile and type.
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";
/// Extension used for profile and template files.
pub const SETTINGS_FILE_EXTENSION: &str = "json";

/// Location of an installation's configuration on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Root directory of the configuration state
    pub config_dir: PathBuf,

    /// Global settings file name, relative to `config_dir`
    #[validate(length(min = 1))]
    #[serde(default = "default_main_config_file")]
    pub main_config_file: String,

    /// Certificate bundle file name, relative to `config_dir`
    #[validate(length(min = 1))]
    #[serde(default = "default_certificates_file")]
    pub certificates_file: String,

    /// Profile directory name, relative to `config_dir`
    #[validate(length(min = 1))]
    #[serde(default = "default_profiles_dir")]
    pub profiles_dir: String,

    /// Template directory name, relative to `config_dir`
    #[validate(length(min = 1))]
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,
}

fn default_main_config_file() -> String {
    DEFAULT_MAIN_CONFIG_FILE.to_string()
}

fn default_certificates_file() -> String {
    DEFAULT_CERTIFICATES_FILE.to_string()
}

fn default_profiles_dir() -> String {
    DEFAULT_PROFILES_DIR.to_string()
}

fn default_templates_dir() -> String {
    DEFAULT_TEMPLATES_DIR.to_string()
}

impl StoreConfig {
    /// Create a configuration rooted at `config_dir` with default file layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory path is empty or validation fails.
    pub fn new(config_dir: impl Into<PathBuf>) -> Result<Self> {
        let config = Self {
            config_dir: config_dir.into(),
            main_config_file: default_main_config_file(),
            certificates_file: default_certificates_file(),
            profiles_dir: default_profiles_dir(),
            templates_dir: default_templates_dir(),
        };
        config.check()?;
        Ok(config)
    }

    /// Validate field constraints and the root directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first problem found.
    pub fn check(&self) -> Result<()> {
        if self.config_dir.as_os_str().is_empty() {
            return Err(Error::ConfigError(
                "configuration directory cannot be empty".to_string(),
            ));
        }
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))
    }

    /// Override the global settings file name.
    #[must_use]
    pub fn with_main_config_file(mut self, name: impl Into<String>) -> Self {
        self.main_config_file = name.into();
        self
    }

    /// Override the certificate bundle file name.
    #[must_use]
    pub fn with_certificates_file(mut self, name: impl Into<String>) -> Self {
        self.certificates_file = name.into();
        self
    }

    /// Override the profile directory name.
    #[must_use]
    pub fn with_profiles_dir(mut self, name: impl Into<String>) -> Self {
        self.profiles_dir = name.into();
        self
    }

    /// Override the template directory name.
    #[must_use]
    pub fn with_templates_dir(mut self, name: impl Into<String>) -> Self {
        self.templates_dir = name.into();
        self
    }

    /// Root directory of the configuration state.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the global settings file.
    #[must_use]
    pub fn main_config_path(&self) -> PathBuf {
        self.config_dir.join(&self.main_config_file)
    }

    /// Path of the certificate bundle.
    #[must_use]
    pub fn certificates_path(&self) -> PathBuf {
        self.config_dir.join(&self.certificates_file)
    }

    /// Directory that holds profile settings files.
    #[must_use]
    pub fn profiles_path(&self) -> PathBuf {
        self.config_dir.join(&self.profiles_dir)
    }

    /// Settings file of one profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if `profile` is not a single path component.
    pub fn profile_path(&self, profile: &str) -> Result<PathBuf> {
        validate_name(profile, "Profile name")?;
        Ok(self
            .profiles_path()
            .join(format!("{profile}.{SETTINGS_FILE_EXTENSION}")))
    }

    /// Directory holding the templates of one account type within a profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if either name is not a single path component.
    pub fn template_type_path(&self, profile: &str, type_id: &str) -> Result<PathBuf> {
        validate_name(profile, "Profile name")?;
        validate_name(type_id, "Account type")?;
        Ok(self
            .config_dir
            .join(&self.templates_dir)
            .join(profile)
            .join(type_id))
    }

    /// File of one account template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if any name is not a single path component.
    pub fn template_path(&self, profile: &str, type_id: &str, name: &str) -> Result<PathBuf> {
        validate_name(name, "Template name")?;
        Ok(self
            .template_type_path(profile, type_id)?
            .join(format!("{name}.{SETTINGS_FILE_EXTENSION}")))
    }
}

/// Check that `name` can be used as a single file-system component.
///
/// # Errors
///
/// Returns [`Error::InvalidName`] when the name is empty, starts with a dot, or contains a
/// separator or NUL byte.
pub fn validate_name(name: &str, what: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName(format!("{what} cannot be empty")));
    }
    if name.starts_with('.') {
        return Err(Error::InvalidName(format!(
            "{what} `{name}` cannot start with a dot"
        )));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(Error::InvalidName(format!(
            "{what} `{name}` contains a path separator"
        )));
    }
    Ok(())
}
