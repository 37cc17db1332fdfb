//! Nested id removal.

use serde_json::Value;

use crate::Record;

/// Remove every `id` key below the top level. The top-level `id` is kept.
pub fn strip_nested_ids(record: Record) -> Record {
    record
        .into_iter()
        .map(|(key, value)| {
            if key == "id" {
                (key, value)
            } else {
                (key, strip_ids(value))
            }
        })
        .collect()
}

fn strip_ids(value: Value) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .into_iter()
                .filter(|(key, _)| key != "id")
                .map(|(key, value)| (key, strip_ids(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_ids).collect()),
        other => other,
    }
}
