//! Batch validation of import records against a collection's field tree.
//!
//! Three checks per record:
//!
//! - required leaves must hold a non-blank value (errors)
//! - top-level keys must name a known field (warnings only)
//! - present values must fit their leaf kind (errors)
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use docimport::validation::validate;
//!
//! let result = validate(&collection.fields, &[json!({ "title": "Hello" })]);
//! assert!(result.is_valid);
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parser::coerce::js_number;
use crate::schema::{walk_record, walk_schema, Field, FieldKind, FieldPath, FieldVisitor, LeafField};

/// Top-level keys every document may carry.
pub const SYSTEM_KEYS: [&str; 3] = ["id", "createdAt", "updatedAt"];

/// Outcome of validating a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Logical field paths of a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaPaths {
    /// Every named field, containers included.
    pub valid: Vec<String>,
    /// Required leaves.
    pub required: Vec<String>,
}

impl SchemaPaths {
    /// Whether a top-level record key names a known field.
    pub fn knows(&self, key: &str) -> bool {
        self.valid.iter().any(|valid| {
            valid == key
                || valid.strip_prefix(key).is_some_and(|rest| rest.starts_with('.'))
                || key.strip_prefix(valid.as_str()).is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

impl<'s> FieldVisitor<'s> for SchemaPaths {
    fn leaf(&mut self, field: &'s LeafField, path: &FieldPath, _value: Option<&Value>) {
        let path = path.to_string();
        if field.required {
            self.required.push(path.clone());
        }
        self.valid.push(path);
    }

    fn container(&mut self, _field: &'s Field, path: &FieldPath) {
        self.valid.push(path.to_string());
    }
}

/// Collect the valid and required paths of a field tree.
pub fn field_paths(fields: &[Field]) -> SchemaPaths {
    let mut paths = SchemaPaths::default();
    walk_schema(fields, &mut paths);
    paths
}

/// Validate a batch of records.
pub fn validate(fields: &[Field], records: &[Value]) -> ValidationResult {
    let mut result = ValidationResult::default();

    if records.is_empty() {
        result.errors.push("Import data must be a non-empty array".to_string());
        return result;
    }

    let paths = field_paths(fields);

    for (index, record) in records.iter().enumerate() {
        let row = index + 1;
        let Value::Object(object) = record else {
            result.errors.push(format!("Row {}: Record must be an object", row));
            continue;
        };

        let mut checker = RowChecker { row, errors: &mut result.errors };
        walk_record(fields, object, &mut checker);

        for key in object.keys() {
            if SYSTEM_KEYS.contains(&key.as_str()) || paths.knows(key) {
                continue;
            }
            result
                .warnings
                .push(format!("Row {}: Unknown field \"{}\" will be ignored", row, key));
        }
    }

    result.is_valid = result.errors.is_empty();
    result
}

/// Per-record visitor collecting required and type errors.
struct RowChecker<'a> {
    row: usize,
    errors: &'a mut Vec<String>,
}

impl<'s> FieldVisitor<'s> for RowChecker<'_> {
    fn leaf(&mut self, field: &'s LeafField, path: &FieldPath, value: Option<&Value>) {
        let value = value.filter(|v| !is_blank(v));

        let Some(value) = value else {
            if field.required {
                self.errors
                    .push(format!("Row {}: Missing required field \"{}\"", self.row, path));
            }
            return;
        };

        let fits = match (field.has_many, value) {
            (true, Value::Array(items)) => items.iter().all(|item| fits_kind(field, item)),
            _ => fits_kind(field, value),
        };
        if !fits {
            if let Some(problem) = describe(field) {
                self.errors
                    .push(format!("Row {}: Field \"{}\" {}", self.row, path, problem));
            }
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Whether a single value fits the leaf's kind.
fn fits_kind(field: &LeafField, value: &Value) -> bool {
    match field.kind {
        FieldKind::Checkbox => matches!(value, Value::Bool(_))
            || matches!(value.as_str(), Some("true") | Some("false")),
        FieldKind::Date => value.as_str().map_or(true, is_date),
        FieldKind::Email => value.as_str().map_or(true, |s| s.contains('@')),
        FieldKind::Number => match value {
            Value::Number(_) | Value::Bool(_) => true,
            Value::String(s) => js_number(s).is_some(),
            _ => false,
        },
        FieldKind::Select | FieldKind::Radio => {
            if field.options.is_empty() {
                return true;
            }
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return false,
            };
            field.option_values().contains(&text.as_str())
        }
        _ => true,
    }
}

fn describe(field: &LeafField) -> Option<String> {
    let problem = match field.kind {
        FieldKind::Checkbox => "must be a boolean".to_string(),
        FieldKind::Date => "must be a valid date".to_string(),
        FieldKind::Email => "must be a valid email".to_string(),
        FieldKind::Number => "must be a number".to_string(),
        FieldKind::Select | FieldKind::Radio => {
            format!("must be one of: {}", field.option_values().join(", "))
        }
        _ => return None,
    };
    Some(problem)
}

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%B %d, %Y", "%d %B %Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"];

/// `YYYY` or `YYYY-MM`.
static PARTIAL_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}(-(0[1-9]|1[0-2]))?$").unwrap());

/// Whether text reads as a calendar date or timestamp.
pub fn is_date(text: &str) -> bool {
    let text = text.trim();
    let zoned = match text.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{}+00:00", rest),
        None => text.to_string(),
    };

    PARTIAL_DATE.is_match(text)
        || DateTime::parse_from_rfc3339(text).is_ok()
        || DateTime::parse_from_rfc2822(text).is_ok()
        || OFFSET_DATETIME_FORMATS
            .iter()
            .any(|f| DateTime::parse_from_str(&zoned, f).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(text, f).is_ok())
        || DATE_FORMATS.iter().any(|f| NaiveDate::parse_from_str(text, f).is_ok())
}
