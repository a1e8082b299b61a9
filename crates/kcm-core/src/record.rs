//! Source records.
//!
//! The admin API returns loosely-typed JSON documents. Loaders only need a
//! handful of fields by name, so records stay as `serde_json::Value` and are
//! read through these accessors.

use serde_json::Value;

/// One record returned by the source API.
pub type Record = Value;

/// String field of a record, if present and a string.
pub fn str_field<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Non-empty string field of a record.
pub fn id_field<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    str_field(record, key).filter(|s| !s.is_empty())
}

/// Boolean field of a record; absent or non-boolean reads as `false`.
pub fn flag(record: &Record, key: &str) -> bool {
    record.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Embedded list of child records; absent or null reads as empty.
pub fn children<'a>(record: &'a Record, key: &str) -> &'a [Record] {
    record
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
