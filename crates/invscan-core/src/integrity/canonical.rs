//! Canonical byte form of a record.
//!
//! Object keys are written in lexicographic order at every nesting level with
//! no insignificant whitespace, so two records with the same content always
//! produce the same bytes regardless of how their keys were inserted.

use std::io::Write;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::IntegrityError;

/// Stored digest attribute.
pub const DATA_HASH: &str = "dataHash";
/// Stored sealing timestamp attribute.
pub const HASH_GENERATED_AT: &str = "hashGeneratedAt";

/// Attributes excluded from the digest. Only stripped at the top level.
pub const HASH_FIELDS: [&str; 2] = [DATA_HASH, HASH_GENERATED_AT];

/// Canonical bytes of a record, without its hash attributes.
pub fn canonical_bytes<T: Serialize + ?Sized>(record: &T) -> Result<Vec<u8>, IntegrityError> {
    let value = serde_json::to_value(record)
        .map_err(|e| IntegrityError::Canonicalization(e.to_string()))?;

    let mut out = Vec::new();
    write_value(&value, true, &mut out)?;
    Ok(out)
}

fn write_value(value: &Value, strip_hash_fields: bool, out: &mut Vec<u8>) -> Result<(), IntegrityError> {
    match value {
        Value::Object(map) => write_object(map, strip_hash_fields, out),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, false, out)?;
            }
            out.push(b']');
            Ok(())
        }
        scalar => write_json(scalar, out),
    }
}

fn write_object(map: &Map<String, Value>, strip_hash_fields: bool, out: &mut Vec<u8>) -> Result<(), IntegrityError> {
    let mut entries: Vec<(&String, &Value)> = map
        .iter()
        .filter(|(k, _)| !(strip_hash_fields && HASH_FIELDS.contains(&k.as_str())))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    out.push(b'{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        write_json(key, out)?;
        out.push(b':');
        write_value(value, false, out)?;
    }
    out.push(b'}');
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(value: &T, out: &mut Vec<u8>) -> Result<(), IntegrityError> {
    serde_json::to_writer(&mut *out, value)
        .map_err(|e| IntegrityError::Canonicalization(e.to_string()))?;
    out.flush().map_err(|e| IntegrityError::Canonicalization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;

    fn text(value: &Value) -> String {
        String::from_utf8(canonical_bytes(value).unwrap()).unwrap()
    }

    #[test]
    fn test_keys_sorted_at_every_level() {
        let record = json!({"b": 1, "a": {"z": [3, {"y": true, "x": null}], "m": "テスト"}});
        assert_eq!(text(&record), r#"{"a":{"m":"テスト","z":[3,{"x":null,"y":true}]},"b":1}"#);
    }

    #[test]
    fn test_hash_fields_stripped_only_at_top_level() {
        let record = json!({
            "name": "A",
            "dataHash": "abc",
            "hashGeneratedAt": "2024-01-01T00:00:00.000Z",
            "client": {"dataHash": "def"}
        });
        assert_eq!(text(&record), r#"{"client":{"dataHash":"def"},"name":"A"}"#);
    }

    #[test]
    fn test_unsupported_shape_is_an_error() {
        let mut bad: HashMap<(u8, u8), u8> = HashMap::new();
        bad.insert((1, 2), 3);

        assert!(matches!(
            canonical_bytes(&bad),
            Err(IntegrityError::Canonicalization(_))
        ));
    }
}
