//! Value Sanitizer
//!
//! Converts [`StoreValue`]s into plain JSON so an exported tree can be
//! serialized anywhere. The conversion is total and recursive, and the
//! output never contains a store-native type:
//!
//! | Input | Output |
//! |-------|--------|
//! | document snapshot | its path string |
//! | document / collection reference | its path string |
//! | query snapshot | array of the documents' path strings |
//! | timestamp | ISO-8601 string, millisecond precision, `Z` suffix |
//! | geo point | `{"latitude": .., "longitude": ..}` |
//! | array | element-wise sanitized array, order preserved |
//! | map | same keys, each value sanitized |
//! | non-finite double | `null` |
//! | other primitives | unchanged |
//!
//! Sanitizing already-sanitized data is a no-op.

use crate::models::value::StoreValue;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

/// Sanitize one value
pub fn sanitize(value: &StoreValue) -> Value {
    match value {
        StoreValue::DocumentSnapshot(snapshot) => Value::String(snapshot.path().to_string()),
        StoreValue::DocumentReference(reference) => Value::String(reference.to_string()),
        StoreValue::CollectionReference(reference) => Value::String(reference.to_string()),
        StoreValue::QuerySnapshot(query) => Value::Array(
            query
                .docs
                .iter()
                .map(|doc| Value::String(doc.path().to_string()))
                .collect(),
        ),
        StoreValue::Timestamp(ts) => Value::String(format_timestamp(ts)),
        StoreValue::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        StoreValue::Map(entries) => Value::Object(sanitize_fields(entries)),
        StoreValue::GeoPoint {
            latitude,
            longitude,
        } => {
            let mut point = Map::new();
            point.insert("latitude".to_string(), number(*latitude));
            point.insert("longitude".to_string(), number(*longitude));
            Value::Object(point)
        }
        StoreValue::Null => Value::Null,
        StoreValue::Boolean(b) => Value::Bool(*b),
        StoreValue::Integer(i) => Value::Number((*i).into()),
        StoreValue::Double(d) => number(*d),
        StoreValue::String(s) => Value::String(s.clone()),
    }
}

/// Sanitize a keyed structure, keeping key order
pub fn sanitize_fields(entries: &[(String, StoreValue)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(key, value)| (key.clone(), sanitize(value)))
        .collect()
}

/// ISO-8601 rendering used for every timestamp in exported data
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn number(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Right-biased structural merge
///
/// Keys of `overlay` win over keys of `base`. When both sides hold a JSON
/// object at the same key the two objects are merged recursively; any other
/// combination (arrays included) takes the overlay value whole.
///
/// Used to lay a document's subcollections over its fields, so a
/// subcollection named like a field replaces that field.
pub fn merge_right(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => {
                        let current = existing.take();
                        *existing = merge_right(current, value);
                    }
                    None => {
                        base.insert(key, value);
                    }
                }
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}
