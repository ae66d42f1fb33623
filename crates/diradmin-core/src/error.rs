//! Error types for configuration snapshot operations.
//!
//! This module provides the error hierarchy shared by the store, exporter, step builder and
//! importer, including stable error codes and a serializable response shape for the UI layer.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Main error type for directory admin configuration operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Snapshot bytes could not be decoded into the expected document shape
    #[error("Failed to parse snapshot: {0}")]
    ParseError(String),

    /// Snapshot decoded but holds nothing importable
    #[error("Invalid snapshot format: {0}")]
    FormatError(FormatIssue),

    /// One or more profile or template writes failed during import
    #[error("Import failed for: {}", failed.join(", "))]
    AggregateImportError {
        /// Identifiers of the units that could not be persisted
        failed: Vec<String>,
    },

    /// Reading live configuration during export failed
    #[error("Export failed in section {section}: {message}")]
    ExportError {
        /// Snapshot section being assembled
        section: String,
        /// Underlying failure
        message: String,
    },

    /// A configuration store operation failed
    #[error("Store operation {operation} failed: {message}")]
    StoreError {
        /// Store operation name
        operation: String,
        /// Error message
        message: String,
    },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Profile, type or template name not usable as an identifier
    #[error("Invalid name: {0}")]
    InvalidName(String),
}

/// Reason a decoded snapshot was rejected as having no importable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatIssue {
    /// The document decoded to an empty object.
    EmptyDocument,
    /// The document has sections, none of which are recognized.
    NoRecognizedSections {
        /// Section names found in the document, in document order.
        sections: Vec<String>,
    },
}

impl fmt::Display for FormatIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDocument => write!(f, "document is empty"),
            Self::NoRecognizedSections { sections } => {
                write!(f, "no recognized sections (found: {})", sections.join(", "))
            }
        }
    }
}

/// Specialized result type for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error response for serialization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail structure.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorDetail {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Identifiers that need re-import, when the error is an aggregate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<Vec<String>>,
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ParseError(_) => "PARSE_ERROR",
            Self::FormatError(_) => "FORMAT_ERROR",
            Self::AggregateImportError { .. } => "AGGREGATE_IMPORT_ERROR",
            Self::ExportError { .. } => "EXPORT_ERROR",
            Self::StoreError { .. } => "STORE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidName(_) => "INVALID_NAME",
        }
    }

    /// Shorthand for a [`Error::StoreError`].
    #[must_use]
    pub fn store(operation: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::StoreError {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Wraps this error as an [`Error::ExportError`] for `section`.
    #[must_use]
    pub fn in_export_section(self, section: &str) -> Self {
        match self {
            Self::ExportError { .. } => self,
            other => Self::ExportError {
                section: section.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Converts the error into an `ErrorResponse`.
    #[must_use]
    pub fn into_error_response(self) -> ErrorResponse {
        let code = self.error_code().to_string();
        let message = self.to_string();
        let failed = match self {
            Self::AggregateImportError { failed } => Some(failed),
            _ => None,
        };
        ErrorResponse {
            error: ErrorDetail {
                code,
                message,
                failed,
            },
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::StoreError { .. } | Self::Io(_) | Self::ConfigError(_) | Self::ExportError { .. }
        )
    }
}

// Conversions from external error types
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(err.to_string())
        } else {
            Self::Io(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Self::ParseError(format!("certificate payload is not hex: {err}"))
    }
}
