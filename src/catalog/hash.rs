//! Content hash used as the synthetic primary key of emitted records.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::types::PRIMARY_KEY;

/// Lowercase hex SHA-256 of `record`'s canonical JSON.
///
/// Keys are serialized in sorted order and any existing primary-key entry is ignored, so the
/// hash depends only on the record's field values.
pub fn record_hash(record: &Map<String, Value>) -> String {
    let mut canonical = Map::new();
    let mut keys: Vec<&String> = record.keys().filter(|k| k.as_str() != PRIMARY_KEY).collect();
    keys.sort();
    for key in keys {
        if let Some(v) = record.get(key) {
            canonical.insert(key.clone(), v.clone());
        }
    }

    let bytes = Value::Object(canonical).to_string();
    let digest = Sha256::digest(bytes.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Insert [`record_hash`] into `record` under the primary key.
pub fn stamp_record(record: &mut Map<String, Value>) {
    let hash = record_hash(record);
    record.insert(PRIMARY_KEY.to_string(), Value::String(hash));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn hash_is_insertion_order_independent() {
        let a = obj(json!({"ga:date": "2024-01-01", "ga:users": 3}));
        let mut b = Map::new();
        b.insert("ga:users".to_string(), json!(3));
        b.insert("ga:date".to_string(), json!("2024-01-01"));
        assert_eq!(record_hash(&a), record_hash(&b));
        assert_eq!(record_hash(&a).len(), 64);
    }

    #[test]
    fn hash_changes_with_values_and_ignores_existing_key() {
        let a = obj(json!({"ga:users": 3}));
        let b = obj(json!({"ga:users": 4}));
        assert_ne!(record_hash(&a), record_hash(&b));

        let mut stamped = a.clone();
        stamp_record(&mut stamped);
        assert_eq!(stamped.get(PRIMARY_KEY), Some(&json!(record_hash(&a))));
        assert_eq!(record_hash(&stamped), record_hash(&a));
    }
}
