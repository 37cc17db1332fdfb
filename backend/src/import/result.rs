//! Outcome of an import run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

/// A record that could not be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based position of the record in the batch
    pub row: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl RowError {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self { row, field: None, path: None, message: message.into(), value: None }
    }

    /// Describe a store failure, preferring its first field-level error.
    pub fn from_store_error(error: &StoreError, row: usize) -> Self {
        if let Some(first) = error.field_errors().first() {
            return Self {
                row,
                field: Some(
                    first
                        .path
                        .clone()
                        .or_else(|| first.field.clone())
                        .unwrap_or_else(|| "unknown".to_string()),
                ),
                path: first.path.clone(),
                message: first
                    .message
                    .clone()
                    .or_else(|| first.label.clone())
                    .unwrap_or_else(|| "validation error".to_string()),
                value: first.value.clone(),
            };
        }

        let message = error.to_string();
        if message.trim().is_empty() {
            Self::new(row, "Unknown error occurred")
        } else {
            Self::new(row, message)
        }
    }

    /// `Row {n}: {field}: {message}`, the field part only when known.
    pub fn summary(&self) -> String {
        match &self.field {
            Some(field) => format!("Row {}: {}: {}", self.row, field, self.message),
            None => format!("Row {}: {}", self.row, self.message),
        }
    }
}

/// What happened to one record.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Created,
    Updated,
    Failed(RowError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Completed,
    CompletedWithErrors,
}

/// Counts and failures of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub created: usize,
    pub updated: usize,
    pub errors: Vec<RowError>,
}

impl ImportResult {
    /// Fold one record's outcome into the result.
    pub fn tally(mut self, outcome: RowOutcome) -> Self {
        match outcome {
            RowOutcome::Created => self.created += 1,
            RowOutcome::Updated => self.updated += 1,
            RowOutcome::Failed(error) => self.errors.push(error),
        }
        self
    }

    /// Records written.
    pub fn total(&self) -> usize {
        self.created + self.updated
    }

    pub fn status(&self) -> ImportStatus {
        if self.errors.is_empty() {
            ImportStatus::Completed
        } else {
            ImportStatus::CompletedWithErrors
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use serde_json::json;

    #[test]
    fn test_row_error_from_field_error() {
        let error = StoreError::Validation {
            message: "The following field is invalid: title".into(),
            errors: vec![
                FieldError {
                    path: Some("title".into()),
                    message: Some("This field is required.".into()),
                    value: Some(json!("")),
                    ..Default::default()
                },
                FieldError { path: Some("slug".into()), ..Default::default() },
            ],
        };

        let row = RowError::from_store_error(&error, 4);
        assert_eq!(row.row, 4);
        assert_eq!(row.field.as_deref(), Some("title"));
        assert_eq!(row.path.as_deref(), Some("title"));
        assert_eq!(row.message, "This field is required.");
        assert_eq!(row.value, Some(json!("")));
        assert_eq!(row.summary(), "Row 4: title: This field is required.");
    }

    #[test]
    fn test_row_error_field_fallbacks() {
        let error = StoreError::Validation {
            message: "invalid".into(),
            errors: vec![FieldError { field: Some("price".into()), label: Some("Price".into()), ..Default::default() }],
        };
        let row = RowError::from_store_error(&error, 1);
        assert_eq!(row.field.as_deref(), Some("price"));
        assert_eq!(row.path, None);
        assert_eq!(row.message, "Price");

        let error = StoreError::Validation { message: "invalid".into(), errors: vec![FieldError::default()] };
        let row = RowError::from_store_error(&error, 1);
        assert_eq!(row.field.as_deref(), Some("unknown"));
        assert_eq!(row.message, "validation error");
    }

    #[test]
    fn test_row_error_from_plain_failure() {
        let row = RowError::from_store_error(&StoreError::Rejected("Forbidden".into()), 2);
        assert_eq!(row, RowError::new(2, "Forbidden"));
        assert_eq!(row.summary(), "Row 2: Forbidden");

        let row = RowError::from_store_error(&StoreError::Rejected(String::new()), 3);
        assert_eq!(row.message, "Unknown error occurred");
    }

    #[test]
    fn test_tally_and_status() {
        let result = [RowOutcome::Created, RowOutcome::Updated, RowOutcome::Created]
            .into_iter()
            .fold(ImportResult::default(), ImportResult::tally);
        assert_eq!((result.created, result.updated, result.total()), (2, 1, 3));
        assert_eq!(result.status(), ImportStatus::Completed);

        let result = result.tally(RowOutcome::Failed(RowError::new(4, "boom")));
        assert_eq!(result.total(), 3);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.status(), ImportStatus::CompletedWithErrors);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "created": 2, "updated": 1, "errors": [{ "row": 4, "message": "boom" }] })
        );
    }
}
