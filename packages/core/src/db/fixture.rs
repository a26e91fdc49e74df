//! JSON Fixture Decoding
//!
//! Fixtures describe a store tree as nested JSON:
//!
//! ```json
//! {
//!   "users": {
//!     "alice": {
//!       "name": "Alice",
//!       "joined": { "__type__": "timestamp", "value": "2024-01-01T00:00:00Z" },
//!       "best_friend": { "__type__": "reference", "path": "users/bob" },
//!       "home": { "__type__": "geopoint", "latitude": 59.9, "longitude": 10.7 },
//!       "__collections__": {
//!         "posts": { "p1": { "title": "Hello" } }
//!       }
//!     },
//!     "ghost": { "__exists__": false, "__collections__": { "notes": { "n1": {} } } }
//!   }
//! }
//! ```
//!
//! Top-level keys are collections, their keys are document ids. A document
//! marked `"__exists__": false` is not stored, but its subcollections are.

use crate::db::StoreError;
use crate::models::{
    CollectionReference, DocumentReference, StoreFields, StorePath, StoreValue,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Reserved key holding a document's subcollections
pub const COLLECTIONS_KEY: &str = "__collections__";

/// Reserved key marking a document as absent
pub const EXISTS_KEY: &str = "__exists__";

/// Reserved key tagging a typed value
pub const TYPE_KEY: &str = "__type__";

/// One decoded document
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureDocument {
    pub reference: DocumentReference,
    /// `None` for documents marked as absent
    pub data: Option<StoreFields>,
}

/// Decode a whole fixture tree into a flat, depth-first list of documents
pub fn decode_tree(root: &Value) -> Result<Vec<FixtureDocument>, StoreError> {
    let collections = as_object(root, "<root>")?;
    let mut documents = Vec::new();
    decode_collections(&StorePath::root(), collections, &mut documents)?;
    Ok(documents)
}

/// Decode a single document body (field map) without subcollections
pub fn decode_fields(body: &Value) -> Result<StoreFields, StoreError> {
    let map = as_object(body, "<document>")?;
    map.iter()
        .filter(|(key, _)| !is_reserved_key(key))
        .map(|(key, value)| Ok((key.clone(), decode_value(value, key)?)))
        .collect()
}

/// Decode one field value, resolving `__type__` tags
pub fn decode_value(value: &Value, location: &str) -> Result<StoreValue, StoreError> {
    match value {
        Value::Object(map) => match map.get(TYPE_KEY) {
            Some(tag) => decode_tagged(tag, map, location),
            None => map
                .iter()
                .map(|(key, inner)| {
                    let nested = format!("{}.{}", location, key);
                    Ok((key.clone(), decode_value(inner, &nested)?))
                })
                .collect::<Result<Vec<_>, StoreError>>()
                .map(StoreValue::Map),
        },
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| decode_value(item, &format!("{}[{}]", location, i)))
            .collect::<Result<Vec<_>, StoreError>>()
            .map(StoreValue::Array),
        other => Ok(StoreValue::from(other.clone())),
    }
}

fn decode_collections(
    parent: &StorePath,
    collections: &Map<String, Value>,
    out: &mut Vec<FixtureDocument>,
) -> Result<(), StoreError> {
    for (collection_id, documents) in collections {
        let collection = CollectionReference::new(parent.child(collection_id)?)?;
        let documents = as_object(documents, &collection.to_string())?;

        for (document_id, body) in documents {
            let reference = collection.doc(document_id)?;
            let location = reference.to_string();
            let map = as_object(body, &location)?;

            let exists = match map.get(EXISTS_KEY) {
                None => true,
                Some(Value::Bool(flag)) => *flag,
                Some(_) => {
                    return Err(StoreError::invalid_fixture(
                        location,
                        format!("'{}' must be a boolean", EXISTS_KEY),
                    ))
                }
            };

            let data = if exists { Some(decode_fields(body)?) } else { None };
            out.push(FixtureDocument {
                reference: reference.clone(),
                data,
            });

            if let Some(children) = map.get(COLLECTIONS_KEY) {
                let children = as_object(children, &location)?;
                decode_collections(reference.path(), children, out)?;
            }
        }
    }
    Ok(())
}

fn decode_tagged(
    tag: &Value,
    map: &Map<String, Value>,
    location: &str,
) -> Result<StoreValue, StoreError> {
    match tag.as_str() {
        Some("timestamp") => {
            let raw = string_field(map, "value", location)?;
            let parsed = DateTime::parse_from_rfc3339(raw).map_err(|e| {
                StoreError::invalid_fixture(location, format!("bad timestamp '{}': {}", raw, e))
            })?;
            Ok(StoreValue::Timestamp(parsed.with_timezone(&Utc)))
        }
        Some("reference") => {
            let path = StorePath::parse(string_field(map, "path", location)?)?;
            if path.is_document() {
                Ok(StoreValue::DocumentReference(DocumentReference::new(path)?))
            } else if path.is_collection() {
                Ok(StoreValue::CollectionReference(CollectionReference::new(
                    path,
                )?))
            } else {
                Err(StoreError::invalid_fixture(
                    location,
                    "reference path must not be empty",
                ))
            }
        }
        Some("geopoint") => Ok(StoreValue::GeoPoint {
            latitude: number_field(map, "latitude", location)?,
            longitude: number_field(map, "longitude", location)?,
        }),
        _ => Err(StoreError::invalid_fixture(
            location,
            format!("unknown {} tag: {}", TYPE_KEY, tag),
        )),
    }
}

fn is_reserved_key(key: &str) -> bool {
    key == COLLECTIONS_KEY || key == EXISTS_KEY
}

fn as_object<'a>(value: &'a Value, location: &str) -> Result<&'a Map<String, Value>, StoreError> {
    value
        .as_object()
        .ok_or_else(|| StoreError::invalid_fixture(location, "expected a JSON object"))
}

fn string_field<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    location: &str,
) -> Result<&'a str, StoreError> {
    map.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::invalid_fixture(location, format!("missing string '{}'", key)))
}

fn number_field(map: &Map<String, Value>, key: &str, location: &str) -> Result<f64, StoreError> {
    map.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| StoreError::invalid_fixture(location, format!("missing number '{}'", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn decodes_nested_tree_depth_first() {
        let fixture = json!({
            "users": {
                "alice": {
                    "name": "Alice",
                    "__collections__": {"posts": {"p1": {"title": "Hello"}}}
                },
                "bob": {}
            }
        });

        let docs = decode_tree(&fixture).unwrap();
        let paths: Vec<String> = docs.iter().map(|d| d.reference.to_string()).collect();
        assert_eq!(paths, vec!["users/alice", "users/alice/posts/p1", "users/bob"]);
        assert_eq!(
            docs[0].data,
            Some(vec![("name".to_string(), StoreValue::from("Alice"))])
        );
        assert_eq!(docs[2].data, Some(vec![]));
    }

    #[test]
    fn absent_documents_keep_their_subcollections() {
        let fixture = json!({
            "c1": {"ghost": {"__exists__": false, "__collections__": {"c2": {"d2": {}}}}}
        });

        let docs = decode_tree(&fixture).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].data, None);
        assert_eq!(docs[1].reference.to_string(), "c1/ghost/c2/d2");
    }

    #[test]
    fn decodes_typed_values() {
        let body = json!({
            "joined": {"__type__": "timestamp", "value": "2024-01-01T00:00:00Z"},
            "friend": {"__type__": "reference", "path": "users/bob"},
            "feed": {"__type__": "reference", "path": "users/bob/posts"},
            "home": {"__type__": "geopoint", "latitude": 1.5, "longitude": -2.0},
            "tags": ["a", {"__type__": "reference", "path": "tags/a"}],
        });

        let fields = decode_fields(&body).unwrap();
        assert_eq!(
            fields[0].1,
            StoreValue::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert!(matches!(fields[1].1, StoreValue::DocumentReference(_)));
        assert!(matches!(fields[2].1, StoreValue::CollectionReference(_)));
        assert_eq!(
            fields[3].1,
            StoreValue::GeoPoint {
                latitude: 1.5,
                longitude: -2.0
            }
        );
        match &fields[4].1 {
            StoreValue::Array(items) => {
                assert_eq!(items[0], StoreValue::from("a"));
                assert!(matches!(items[1], StoreValue::DocumentReference(_)));
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_fixtures() {
        assert!(decode_tree(&json!(["not", "an", "object"])).is_err());
        assert!(decode_tree(&json!({"c1": {"d1": 5}})).is_err());
        assert!(decode_tree(&json!({"c1": {"d1": {"__exists__": "no"}}})).is_err());

        let bad_tag = json!({"x": {"__type__": "blob"}});
        assert!(matches!(
            decode_fields(&bad_tag),
            Err(StoreError::InvalidFixture { .. })
        ));

        let bad_ts = json!({"x": {"__type__": "timestamp", "value": "yesterday"}});
        assert!(decode_fields(&bad_ts).is_err());

        let bad_path = json!({"x": {"__type__": "reference", "path": "a//b"}});
        assert!(matches!(
            decode_fields(&bad_path),
            Err(StoreError::InvalidPath(_))
        ));
    }
}
