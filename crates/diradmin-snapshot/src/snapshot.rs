//! The portable snapshot document.

use crate::Result;
use diradmin_core::Error;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Section holding the global settings object.
pub const MAIN_CONFIG_SECTION: &str = "mainConfig";
/// Section holding the hex-encoded certificate bundle.
pub const CERTIFICATES_SECTION: &str = "certificates";
/// Section mapping profile names to profile settings.
pub const SERVER_PROFILES_SECTION: &str = "serverProfiles";
/// Section mapping profile names to their account templates.
pub const ACCOUNT_PROFILES_SECTION: &str = "accountProfiles";

/// Snapshot sections this version knows how to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Global settings
    MainConfig,
    /// Server certificate bundle
    Certificates,
    /// Per-profile server settings
    ServerProfiles,
    /// Per-profile account templates
    AccountProfiles,
}

impl Section {
    /// Returns the key used for this section in a snapshot document.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MainConfig => MAIN_CONFIG_SECTION,
            Self::Certificates => CERTIFICATES_SECTION,
            Self::ServerProfiles => SERVER_PROFILES_SECTION,
            Self::AccountProfiles => ACCOUNT_PROFILES_SECTION,
        }
    }

    /// Returns all recognized sections in export order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::MainConfig,
            Self::Certificates,
            Self::ServerProfiles,
            Self::AccountProfiles,
        ]
    }

    /// Looks up a recognized section by its document key (case-sensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.name() == name)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An installation's configuration as one ordered document.
///
/// Sections keep document order, including sections this version does not recognize.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    sections: Map<String, Value>,
}

impl Snapshot {
    /// Wraps an already assembled section map.
    #[must_use]
    pub fn from_sections(sections: Map<String, Value>) -> Self {
        Self { sections }
    }

    /// Decodes a snapshot from raw document bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the bytes are not JSON or the top-level value is not an
    /// object.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| Error::ParseError(format!("snapshot is not valid JSON: {e}")))?;
        match value {
            Value::Object(sections) => Ok(Self { sections }),
            other => Err(Error::ParseError(format!(
                "snapshot must be a JSON object, found {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Encodes the snapshot as compact JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if serialization fails.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.sections)?)
    }

    /// Encodes the snapshot as indented JSON, the form offered for download.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.sections)?)
    }

    /// Returns the payload of a section, if present.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    /// Iterates sections in document order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.sections.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Section names in document order.
    #[must_use]
    pub fn section_names(&self) -> Vec<String> {
        self.sections.keys().cloned().collect()
    }

    /// Number of sections, recognized or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns true if the document has no sections at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// One template inside an account profile bundle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateEntry<'a> {
    /// Account type id
    pub type_id: &'a str,
    /// Template name
    pub name: &'a str,
    /// Template payload
    pub data: &'a Value,
}

/// Flattens an account profile bundle (`type id -> template name -> data`) in document order.
///
/// # Errors
///
/// Returns [`Error::ParseError`] if the bundle or one of its type entries is not an object.
pub fn account_templates(bundle: &Value) -> Result<Vec<TemplateEntry<'_>>> {
    let types = bundle.as_object().ok_or_else(|| {
        Error::ParseError(format!(
            "account profile must be an object, found {}",
            json_type_name(bundle)
        ))
    })?;

    let mut entries = Vec::new();
    for (type_id, templates) in types {
        let templates = templates.as_object().ok_or_else(|| {
            Error::ParseError(format!(
                "templates of account type `{type_id}` must be an object, found {}",
                json_type_name(templates)
            ))
        })?;
        entries.extend(templates.iter().map(|(name, data)| TemplateEntry {
            type_id,
            name,
            data,
        }));
    }
    Ok(entries)
}

/// Decodes a certificate payload; `null` and `""` both mean "no certificates".
///
/// # Errors
///
/// Returns [`Error::ParseError`] if the payload is neither a string nor null, or is not hex.
pub fn decode_certificates(payload: &Value) -> Result<Vec<u8>> {
    match payload {
        Value::Null => Ok(Vec::new()),
        Value::String(encoded) => Ok(hex::decode(encoded)?),
        other => Err(Error::ParseError(format!(
            "certificates must be a string, found {}",
            json_type_name(other)
        ))),
    }
}

/// Encodes certificate bytes for the snapshot.
#[must_use]
pub fn encode_certificates(certificates: &[u8]) -> Value {
    Value::String(hex::encode(certificates))
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
