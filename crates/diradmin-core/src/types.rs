//! Configuration domain types.
//!
//! [`MainConfig`] holds installation-wide settings and [`ProfileSettings`] the settings of one
//! server profile. Both keep keys they do not model in a flattened `extra` map, so documents
//! written by newer versions survive a load/save cycle unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use validator::Validate;

use crate::error::{Error, Result};

/// Default session timeout in minutes
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: u32 = 30;
/// Default LDAP server URL for new profiles
pub const DEFAULT_SERVER_URL: &str = "ldap://localhost:389";
/// Default UI language for new profiles
pub const DEFAULT_LANGUAGE: &str = "en_GB.utf8";
/// Default time zone for new profiles
pub const DEFAULT_TIME_ZONE: &str = "Europe/London";

/// Verbosity of the application log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debug output
    Debug,
    /// Normal operation notices
    #[default]
    Notice,
    /// Warnings only
    Warning,
    /// Errors only
    Error,
}

impl LogLevel {
    /// Returns the level name as used in settings files.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Installation-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct MainConfig {
    /// Hash of the configuration master password
    pub password: String,

    /// Profile preselected on the login page
    pub default_profile: String,

    /// Session timeout in minutes
    #[validate(range(min = 1, max = 1440))]
    pub session_timeout: u32,

    /// Hide detailed LDAP errors on failed logins
    pub hide_login_error_details: bool,

    /// Log verbosity
    pub log_level: LogLevel,

    /// Log target (`SYSLOG`, `REMOTE:host:port` or a file path)
    #[validate(length(min = 1))]
    pub log_destination: String,

    /// Hosts allowed to access the admin interface; empty allows all
    pub allowed_hosts: Vec<String>,

    /// Minimum password length for account passwords
    #[validate(range(max = 100))]
    pub password_min_length: u32,

    /// Minimum number of character classes in account passwords
    #[validate(range(max = 4))]
    pub password_min_classes: u32,

    /// SMTP relay used for notification mails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_server: Option<String>,

    /// Settings this version does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            password: String::new(),
            default_profile: String::new(),
            session_timeout: DEFAULT_SESSION_TIMEOUT_MINUTES,
            hide_login_error_details: false,
            log_level: LogLevel::default(),
            log_destination: "SYSLOG".to_string(),
            allowed_hosts: Vec::new(),
            password_min_length: 0,
            password_min_classes: 0,
            mail_server: None,
            extra: Map::new(),
        }
    }
}

impl MainConfig {
    /// Decode global settings from a snapshot payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the payload does not have the settings shape.
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| Error::ParseError(format!("mainConfig: {e}")))
    }

    /// Encode global settings as a snapshot payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if serialization fails.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Settings of one server profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSettings {
    /// LDAP server URL
    #[validate(url)]
    pub server_url: String,

    /// Issue StartTLS after connecting
    pub use_tls: bool,

    /// Follow LDAP referrals
    pub follow_referrals: bool,

    /// Use paged results for large searches
    pub paged_results: bool,

    /// Maximum number of search results; zero means unlimited
    #[validate(range(max = 100_000))]
    pub search_limit: u32,

    /// Base DN of the directory tree
    pub tree_suffix: String,

    /// DNs allowed to log into this profile
    pub admins: Vec<String>,

    /// UI language
    pub default_language: String,

    /// Time zone used for display
    pub time_zone: String,

    /// Hash of the profile password
    pub password: String,

    /// Account types enabled in this profile, in display order
    pub active_types: Vec<String>,

    /// Per-type settings, keyed by type id
    pub type_settings: Map<String, Value>,

    /// Per-module settings, keyed by module name
    pub module_settings: Map<String, Value>,

    /// Settings this version does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            use_tls: false,
            follow_referrals: false,
            paged_results: false,
            search_limit: 0,
            tree_suffix: String::new(),
            admins: Vec::new(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            password: String::new(),
            active_types: Vec::new(),
            type_settings: Map::new(),
            module_settings: Map::new(),
            extra: Map::new(),
        }
    }
}

impl ProfileSettings {
    /// Create settings for a server URL with defaults for everything else.
    #[must_use]
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    /// Set the tree suffix.
    #[must_use]
    pub fn with_tree_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.tree_suffix = suffix.into();
        self
    }

    /// Set the enabled account types.
    #[must_use]
    pub fn with_active_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Decode profile settings from a snapshot payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the payload does not have the settings shape.
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| Error::ParseError(format!("profile settings: {e}")))
    }

    /// Encode profile settings as a snapshot payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if serialization fails.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_log_level_names() {
        assert_eq!(LogLevel::default(), LogLevel::Notice);
        assert_eq!(LogLevel::Notice.to_string(), "notice");
        assert_eq!(serde_json::to_value(LogLevel::Warning).unwrap(), json!("warning"));
    }

    #[test]
    fn test_main_config_defaults_validate() {
        let config = MainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session_timeout, DEFAULT_SESSION_TIMEOUT_MINUTES);
    }

    #[test]
    fn test_main_config_validation_ranges() {
        let mut config = MainConfig::default();
        config.session_timeout = 0;
        assert!(config.validate().is_err());

        config.session_timeout = 60;
        config.password_min_classes = 5;
        assert!(config.validate().is_err());

        config.password_min_classes = 3;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_main_config_keeps_unknown_keys() {
        let value = json!({
            "sessionTimeout": 45,
            "logLevel": "debug",
            "licenseKey": "abc",
            "mailAttribute": {"name": "mail"}
        });
        let config = MainConfig::from_value(&value).unwrap();
        assert_eq!(config.session_timeout, 45);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.extra.get("licenseKey"), Some(&json!("abc")));

        let encoded = config.to_value().unwrap();
        assert_eq!(encoded["licenseKey"], json!("abc"));
        assert_eq!(encoded["mailAttribute"]["name"], json!("mail"));
    }

    #[test]
    fn test_main_config_rejects_wrong_shape() {
        let result = MainConfig::from_value(&json!(["not", "an", "object"]));
        assert!(matches!(result, Err(Error::ParseError(_))));

        let result = MainConfig::from_value(&json!({"sessionTimeout": "soon"}));
        assert!(matches!(result, Err(Error::ParseError(_))));
    }

    #[test]
    fn test_profile_settings_builder() {
        let settings = ProfileSettings::new("ldaps://ldap.example.com:636")
            .with_tree_suffix("dc=example,dc=com")
            .with_active_types(["user", "group"]);

        assert!(settings.validate().is_ok());
        assert_eq!(settings.active_types, vec!["user", "group"]);
        assert_eq!(settings.tree_suffix, "dc=example,dc=com");
    }

    #[test]
    fn test_profile_settings_invalid_url() {
        let settings = ProfileSettings::new("not a url");
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_profile_settings_value_round_trip() {
        let mut settings =
            ProfileSettings::new("ldap://ldap.example.com").with_active_types(["user"]);
        settings
            .extra
            .insert("jobSettings".to_string(), json!({"cron": "0 3 * * *"}));

        let decoded = ProfileSettings::from_value(&settings.to_value().unwrap()).unwrap();
        assert_eq!(decoded, settings);
    }
}
