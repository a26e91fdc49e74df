//! Store-Native Values
//!
//! A store adapter classifies every value it reads into [`StoreValue`] before
//! any other part of the crate sees it. The sanitizer dispatches on the
//! variant tag, never on runtime type names.

use crate::models::document::{
    CollectionReference, DocumentReference, DocumentSnapshot, QuerySnapshot,
};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Any value a document field can hold, plus the store handles that may
/// appear nested inside field data
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    GeoPoint { latitude: f64, longitude: f64 },
    Array(Vec<StoreValue>),
    /// Keyed structure, in source order
    Map(Vec<(String, StoreValue)>),
    DocumentReference(DocumentReference),
    CollectionReference(CollectionReference),
    DocumentSnapshot(Box<DocumentSnapshot>),
    QuerySnapshot(QuerySnapshot),
}

impl StoreValue {
    pub fn string(value: impl Into<String>) -> Self {
        StoreValue::String(value.into())
    }

    /// Build a map value from `(key, value)` pairs
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, StoreValue)>,
    {
        StoreValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// True for variants that only exist inside the store
    /// (handles, snapshots, timestamps, geo points)
    pub fn is_store_native(&self) -> bool {
        matches!(
            self,
            StoreValue::Timestamp(_)
                | StoreValue::GeoPoint { .. }
                | StoreValue::DocumentReference(_)
                | StoreValue::CollectionReference(_)
                | StoreValue::DocumentSnapshot(_)
                | StoreValue::QuerySnapshot(_)
        )
    }
}

impl From<Value> for StoreValue {
    /// Lift plain JSON into the store value space. Never produces a
    /// store-native variant.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => StoreValue::Null,
            Value::Bool(b) => StoreValue::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => StoreValue::Integer(i),
                None => StoreValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => StoreValue::String(s),
            Value::Array(items) => {
                StoreValue::Array(items.into_iter().map(StoreValue::from).collect())
            }
            Value::Object(map) => StoreValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, StoreValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for StoreValue {
    fn from(value: bool) -> Self {
        StoreValue::Boolean(value)
    }
}

impl From<i64> for StoreValue {
    fn from(value: i64) -> Self {
        StoreValue::Integer(value)
    }
}

impl From<f64> for StoreValue {
    fn from(value: f64) -> Self {
        StoreValue::Double(value)
    }
}

impl From<&str> for StoreValue {
    fn from(value: &str) -> Self {
        StoreValue::String(value.to_string())
    }
}

impl From<String> for StoreValue {
    fn from(value: String) -> Self {
        StoreValue::String(value)
    }
}

impl From<DateTime<Utc>> for StoreValue {
    fn from(value: DateTime<Utc>) -> Self {
        StoreValue::Timestamp(value)
    }
}

impl From<DocumentReference> for StoreValue {
    fn from(value: DocumentReference) -> Self {
        StoreValue::DocumentReference(value)
    }
}

impl From<CollectionReference> for StoreValue {
    fn from(value: CollectionReference) -> Self {
        StoreValue::CollectionReference(value)
    }
}

impl From<DocumentSnapshot> for StoreValue {
    fn from(value: DocumentSnapshot) -> Self {
        StoreValue::DocumentSnapshot(Box::new(value))
    }
}

impl From<QuerySnapshot> for StoreValue {
    fn from(value: QuerySnapshot) -> Self {
        StoreValue::QuerySnapshot(value)
    }
}
