//! Rebuild nested records from flat, delimiter-encoded keys.
//!
//! CSV columns name nested values by joining the path with `_`:
//!
//! ```text
//! title            -> { "title": .. }
//! meta_author      -> { "meta": { "author": .. } }
//! items_0_label    -> { "items": [ { "label": .. } ] }
//! ```
//!
//! Field names that themselves contain `_` are split as well; there is no
//! escape for the delimiter.

use serde_json::Value;

use super::coerce::{js_number, number_value};
use crate::Record;

/// Separator between path segments of a flat key.
pub const KEY_DELIMITER: char = '_';

/// Numeric segments above this are treated as plain keys.
pub const MAX_ARRAY_INDEX: usize = 100_000;

/// Rebuild a nested record from a flat one.
///
/// Empty strings and nulls are dropped. String values are coerced with
/// [`coerce_cell`]; other values are kept as they are.
pub fn unflatten(flat: Record) -> Record {
    let mut nested = Record::new();

    for (key, value) in flat {
        if value.is_null() || value.as_str() == Some("") {
            continue;
        }

        let segments: Vec<&str> = key.split(KEY_DELIMITER).filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            continue;
        }

        let value = match value {
            Value::String(text) => coerce_cell(&text),
            other => other,
        };
        insert_path(&mut nested, &segments, value);
    }

    nested
}

/// Typed value of a text cell.
///
/// Bracketed text is parsed as JSON (kept as text when malformed),
/// `true`/`false` become booleans and numeric text becomes a number.
pub fn coerce_cell(text: &str) -> Value {
    let bracketed = (text.starts_with('[') && text.ends_with(']'))
        || (text.starts_with('{') && text.ends_with('}'));
    if bracketed {
        return serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
    }

    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if !text.trim().is_empty() {
        if let Some(number) = js_number(text).and_then(number_value) {
            return number;
        }
    }

    Value::String(text.to_string())
}

fn array_index(segment: &str) -> Option<usize> {
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse::<usize>().ok().filter(|&i| i <= MAX_ARRAY_INDEX)
}

fn insert_path(target: &mut Record, segments: &[&str], value: Value) {
    let Some((key, rest)) = segments.split_first() else {
        return;
    };
    let Some(next) = rest.first() else {
        target.insert(key.to_string(), value);
        return;
    };

    match array_index(next) {
        Some(index) => {
            let slot = target
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            let Value::Array(items) = slot else { return };
            while items.len() <= index {
                items.push(Value::Object(Record::new()));
            }

            let rest = &rest[1..];
            if rest.is_empty() {
                items[index] = value;
                return;
            }
            let element = &mut items[index];
            if !element.is_object() {
                *element = Value::Object(Record::new());
            }
            if let Value::Object(object) = element {
                insert_path(object, rest, value);
            }
        }
        None => {
            let slot = target
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Record::new()));
            if !slot.is_object() {
                *slot = Value::Object(Record::new());
            }
            if let Value::Object(object) = slot {
                insert_path(object, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    /// Inverse encoding used by exports: nested keys joined with `_`, scalars as text.
    fn flatten(value: &Value, prefix: &str, out: &mut Record) {
        let join = |key: &str| {
            if prefix.is_empty() {
                key.to_string()
            } else {
                format!("{}{}{}", prefix, KEY_DELIMITER, key)
            }
        };
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    flatten(child, &join(key), out);
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    flatten(child, &join(&i.to_string()), out);
                }
            }
            Value::String(s) => {
                out.insert(prefix.to_string(), json!(s));
            }
            other => {
                out.insert(prefix.to_string(), json!(other.to_string()));
            }
        }
    }

    #[test]
    fn test_array_of_objects() {
        let result = unflatten(flat(json!({ "a_0_b": "1", "a_1_b": "2" })));
        assert_eq!(Value::Object(result), json!({ "a": [{ "b": 1 }, { "b": 2 }] }));
    }

    #[test]
    fn test_nested_objects() {
        let result = unflatten(flat(json!({
            "user_name": "John",
            "user_address_street": "123 Main St"
        })));
        assert_eq!(
            Value::Object(result),
            json!({ "user": { "name": "John", "address": { "street": "123 Main St" } } })
        );
    }

    #[test]
    fn test_sparse_indices_are_padded() {
        let result = unflatten(flat(json!({ "items_2_label": "c" })));
        assert_eq!(Value::Object(result), json!({ "items": [{}, {}, { "label": "c" }] }));
    }

    #[test]
    fn test_trailing_index_fills_slot() {
        let result = unflatten(flat(json!({ "tags_0": "red", "tags_1": "blue" })));
        assert_eq!(Value::Object(result), json!({ "tags": ["red", "blue"] }));
    }

    #[test]
    fn test_empty_values_and_segments() {
        let result = unflatten(flat(json!({
            "blank": "",
            "missing": null,
            "_": "x",
            "meta__title": "T",
            "_lead": "L"
        })));
        assert_eq!(Value::Object(result), json!({ "meta": { "title": "T" }, "lead": "L" }));
    }

    #[test]
    fn test_scalar_replaced_by_container() {
        let mut input = Record::new();
        input.insert("meta".into(), json!("flat"));
        input.insert("meta_title".into(), json!("T"));
        let result = unflatten(input);
        assert_eq!(Value::Object(result), json!({ "meta": { "title": "T" } }));
    }

    #[test]
    fn test_huge_index_is_a_key() {
        let result = unflatten(flat(json!({ "a_999999999_b": "x" })));
        assert_eq!(Value::Object(result), json!({ "a": { "999999999": { "b": "x" } } }));
    }

    #[test]
    fn test_cell_coercion() {
        assert_eq!(coerce_cell("true"), json!(true));
        assert_eq!(coerce_cell("false"), json!(false));
        assert_eq!(coerce_cell("42"), json!(42));
        assert_eq!(coerce_cell("4.5"), json!(4.5));
        assert_eq!(coerce_cell("0x10"), json!(16));
        assert_eq!(coerce_cell("[1, 2]"), json!([1, 2]));
        assert_eq!(coerce_cell("{\"k\": \"v\"}"), json!({ "k": "v" }));
        assert_eq!(coerce_cell("[not json]"), json!("[not json]"));
        assert_eq!(coerce_cell("Infinity"), json!("Infinity"));
        assert_eq!(coerce_cell("hello"), json!("hello"));
        assert_eq!(coerce_cell("   "), json!("   "));
    }

    #[test]
    fn test_non_string_values_are_kept() {
        let result = unflatten(flat(json!({ "count": 3, "flags_0": true, "nested": { "k": "v" } })));
        assert_eq!(
            Value::Object(result),
            json!({ "count": 3, "flags": [true], "nested": { "k": "v" } })
        );
    }

    #[test]
    fn test_flatten_then_unflatten_restores_record() {
        let original = json!({
            "title": "Hello",
            "views": 12,
            "published": true,
            "meta": { "author": "Ada", "score": 4.5 },
            "items": [{ "label": "a", "qty": 1 }, { "label": "b", "qty": 2 }],
            "tags": ["x", "y"]
        });
        let mut flat_record = Record::new();
        flatten(&original, "", &mut flat_record);

        assert_eq!(Value::Object(unflatten(flat_record)), original);
    }
}
