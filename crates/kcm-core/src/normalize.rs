//! Property normalization.
//!
//! Converts an arbitrary source record into a flat set of scalar properties
//! that Neo4j can store on a node:
//!
//! - nested objects are flattened into `parent.child` keys
//! - lists become JSON text (`[1, 2]`, non-ASCII kept as-is)
//! - booleans become `"true"` / `"false"`
//! - null becomes `""`
//! - other scalars pass through
//!
//! The output holds no objects or lists, so normalizing it again is a no-op.

use std::collections::BTreeMap;
use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;

/// Flat, scalar-only property set.
pub type Properties = BTreeMap<String, Value>;

/// Normalize `record`, skipping the top-level keys in `ignore`.
///
/// A record that is not a JSON object yields an empty property set.
pub fn clean_properties(record: &Value, ignore: &[&str]) -> Properties {
    let mut cleaned = Properties::new();
    let Some(fields) = record.as_object() else {
        return cleaned;
    };

    for (key, value) in fields {
        if ignore.contains(&key.as_str()) {
            continue;
        }
        flatten_into(&mut cleaned, key.clone(), value);
    }
    cleaned
}

fn flatten_into(out: &mut Properties, key: String, value: &Value) {
    match value {
        Value::Object(children) => {
            for (child, child_value) in children {
                flatten_into(out, format!("{key}.{child}"), child_value);
            }
        }
        Value::Array(_) => {
            out.insert(key, Value::String(list_text(value)));
        }
        Value::Bool(b) => {
            out.insert(key, Value::String(b.to_string()));
        }
        Value::Null => {
            out.insert(key, Value::String(String::new()));
        }
        scalar => {
            out.insert(key, scalar.clone());
        }
    }
}

/// JSON text with `", "` and `": "` separators.
fn list_text(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, SpacedFormatter);
    match value.serialize(&mut ser) {
        Ok(()) => String::from_utf8(buf).unwrap_or_else(|_| value.to_string()),
        Err(_) => value.to_string(),
    }
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_objects_flatten() {
        let props = clean_properties(&json!({"a": {"b": 1, "c": {"d": true}}}), &[]);
        let expected: Properties = [
            ("a.b".to_string(), json!(1)),
            ("a.c.d".to_string(), json!("true")),
        ]
        .into_iter()
        .collect();
        assert_eq!(props, expected);
    }

    #[test]
    fn test_null_list_bool_coercion() {
        let props = clean_properties(&json!({"x": null, "y": [1, 2], "z": false}), &[]);
        assert_eq!(props["x"], json!(""));
        assert_eq!(props["y"], json!("[1, 2]"));
        assert_eq!(props["z"], json!("false"));
    }

    #[test]
    fn test_list_keeps_order_and_non_ascii() {
        let props = clean_properties(
            &json!({"redirectUris": ["https://app/*", "café"], "attrs": [{"k": "v", "n": 1}]}),
            &[],
        );
        assert_eq!(props["redirectUris"], json!("[\"https://app/*\", \"café\"]"));
        assert_eq!(props["attrs"], json!("[{\"k\": \"v\", \"n\": 1}]"));
    }

    #[test]
    fn test_ignored_keys_are_dropped() {
        let record = json!({
            "id": "abc",
            "name": "app",
            "protocolMappers": [{"id": "m1"}],
            "attributes": {"id": "kept-under-prefix"}
        });
        let props = clean_properties(&record, &["id", "protocolMappers"]);
        assert!(!props.contains_key("id"));
        assert!(!props.contains_key("protocolMappers"));
        assert_eq!(props["name"], json!("app"));
        assert_eq!(props["attributes.id"], json!("kept-under-prefix"));
    }

    #[test]
    fn test_non_object_input_is_empty() {
        assert!(clean_properties(&json!([1, 2, 3]), &[]).is_empty());
        assert!(clean_properties(&json!("realm"), &[]).is_empty());
        assert!(clean_properties(&Value::Null, &[]).is_empty());
    }

    #[test]
    fn test_empty_nested_object_contributes_nothing() {
        let props = clean_properties(&json!({"attributes": {}, "enabled": true}), &[]);
        assert_eq!(props.len(), 1);
        assert_eq!(props["enabled"], json!("true"));
    }

    #[test]
    fn test_normalizing_is_deterministic_and_idempotent() {
        let record = json!({
            "username": "alice",
            "enabled": true,
            "attributes": {"dept": ["eng"], "level": 3},
            "federationLink": null
        });
        let once = clean_properties(&record, &["id"]);
        let again = clean_properties(&record, &["id"]);
        assert_eq!(once, again);

        let reapplied = clean_properties(&Value::Object(once.clone().into_iter().collect()), &["id"]);
        assert_eq!(reapplied, once);
    }
}
