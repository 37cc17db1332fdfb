//! Error types for the docimport pipeline.
//!
//! One enum per stage, converted upward with `From` so `?` works across
//! stage boundaries:
//!
//! - [`DecodeError`] - turning uploaded bytes into records
//! - [`SchemaError`] - loading collection and field definitions
//! - [`StoreError`] - document store operations
//! - [`RichTextError`] - markup the rich-text converter cannot handle
//! - [`ConfigError`] - environment configuration
//! - [`ImportError`] - fatal, run-aborting failures of an import
//!
//! Per-row write failures are not errors of the run; they are collected as
//! [`crate::import::RowError`] values in the import result.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// =============================================================================
// Decoding Errors
// =============================================================================

/// Errors while decoding an uploaded file into records.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Failed to read the input.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes could not be decoded as text.
    #[error("Failed to decode input: {0}")]
    Encoding(String),

    /// Invalid CSV content.
    #[error("Invalid CSV at line {line}: {message}")]
    Csv { line: u64, message: String },

    /// Invalid JSON content.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON input whose top level is not an array.
    #[error("JSON import data must be an array")]
    NotAnArray,

    /// No rows at all.
    #[error("Input contains no records")]
    Empty,

    /// Format could not be determined from the file name.
    #[error("Unsupported import format: {0}")]
    UnknownFormat(String),
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors while loading collection definitions.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The collections document violates its JSON Schema.
    #[error("Invalid collections document: {}", .errors.join("; "))]
    Invalid { errors: Vec<String> },

    /// A field definition cannot be turned into a schema node.
    #[error("Invalid field definition: {0}")]
    Field(String),

    /// Two collections share a slug.
    #[error("Duplicate collection slug: {0}")]
    DuplicateCollection(String),

    /// IO error.
    #[error("Failed to read collections: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Collections JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Store Errors
// =============================================================================

/// A field-level validation failure reported by the document store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Errors from a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document with this id.
    #[error("Document '{id}' not found in '{collection}'")]
    NotFound { collection: String, id: String },

    /// The store refused the data, optionally with per-field details.
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    /// The store refused the operation.
    #[error("{0}")]
    Rejected(String),

    /// Network or protocol failure.
    #[error("Store request failed: {0}")]
    Transport(String),

    /// IO error.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Field-level errors carried by a validation failure.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            StoreError::Validation { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Whether this is a not-found outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

// =============================================================================
// Rich Text Errors
// =============================================================================

/// Markup the rich-text converter could not parse.
#[derive(Debug, Error, PartialEq)]
pub enum RichTextError {
    /// A closing tag that does not match the innermost open tag.
    #[error("Unexpected closing tag </{found}>")]
    UnexpectedClosingTag { found: String },

    /// A tag still open at the end of the input.
    #[error("Unclosed tag <{0}>")]
    UnclosedTag(String),

    /// A `<` with no matching `>`.
    #[error("Unterminated tag at byte {0}")]
    UnterminatedTag(usize),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors in environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds an unusable value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

// =============================================================================
// Import Errors (top-level)
// =============================================================================

/// Failures that abort an import before any record is written.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The batch failed validation.
    #[error("Import validation failed: {}", .errors.join(", "))]
    Validation { errors: Vec<String> },

    /// The target collection is not defined.
    #[error("Collection with slug \"{0}\" not found")]
    UnknownCollection(String),

    /// Input decoding error.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Collection definitions error.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Store could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for schema loading.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for import runs.
pub type RunResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let decode_err = DecodeError::NotAnArray;
        let import_err: ImportError = decode_err.into();
        assert_eq!(import_err.to_string(), "JSON import data must be an array");

        let schema_err = SchemaError::Field("group without name".into());
        let import_err: ImportError = schema_err.into();
        assert!(import_err.to_string().contains("group without name"));
    }

    #[test]
    fn test_validation_error_joins_messages() {
        let err = ImportError::Validation {
            errors: vec![
                "Row 1: Missing required field \"title\"".into(),
                "Row 2: Record must be an object".into(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Import validation failed: Row 1: Missing required field \"title\", Row 2: Record must be an object"
        );
    }

    #[test]
    fn test_store_field_errors() {
        let err = StoreError::Validation {
            message: "The following field is invalid: title".into(),
            errors: vec![FieldError {
                path: Some("title".into()),
                message: Some("This field is required.".into()),
                ..Default::default()
            }],
        };
        assert_eq!(err.field_errors().len(), 1);
        assert!(!err.is_not_found());
        assert!(StoreError::Rejected("nope".into()).field_errors().is_empty());
    }
}
