//! Document Change Diffing
//!
//! Turns a [`DocumentChangeEvent`] into a [`ChangeRecord`]: both document
//! states with sanitized data, plus the list of fields whose values differ.
//!
//! The diff is the symmetric difference of the two field maps under deep
//! equality. A field appears when its value differs between the two sides,
//! including when it exists on one side only. Ordering: fields from the
//! previous state first (previous-map order), then fields found only on the
//! current side (current-map order).
//!
//! [`diff_document_change`] is best-effort: a malformed event is logged and
//! yields `None`, so a consumer draining a stream of change events is never
//! stopped by one bad event.

use crate::db::DocumentChangeEvent;
use crate::models::DocumentSnapshot;
use crate::sanitize::{format_timestamp, sanitize_fields};
use crate::services::error::ChangeDiffError;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

/// One side of a change
///
/// The default value stands in for an event that carries no previous state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    pub exists: bool,
    pub id: Option<String>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub update_time: Option<DateTime<Utc>>,
    /// Sanitized field map; `None` when the document does not exist
    pub data: Option<Map<String, Value>>,
}

impl DocumentState {
    fn from_snapshot(snapshot: &DocumentSnapshot) -> Result<Self, ChangeDiffError> {
        let data = if snapshot.exists {
            let fields = snapshot
                .data
                .as_ref()
                .ok_or_else(|| ChangeDiffError::MissingData {
                    path: snapshot.path().to_string(),
                })?;
            Some(sanitize_fields(fields))
        } else {
            None
        };

        Ok(Self {
            exists: snapshot.exists,
            id: Some(snapshot.id().to_string()),
            create_time: snapshot.create_time,
            update_time: snapshot.update_time,
            data,
        })
    }
}

/// Before/after values of one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub from: Value,
    pub to: Value,
}

/// One changed field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub key: String,
    pub change: Change,
}

/// Full description of one document change
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub ref_path: String,
    pub current_data: DocumentState,
    pub previous_data: DocumentState,
    pub diff: Vec<FieldChange>,
}

impl ChangeRecord {
    /// Keys of all changed fields, in diff order
    pub fn changed_keys(&self) -> Vec<&str> {
        self.diff.iter().map(|c| c.key.as_str()).collect()
    }
}

/// Diff one change event, logging and swallowing any failure
pub fn diff_document_change(event: &DocumentChangeEvent) -> Option<ChangeRecord> {
    match build_change_record(event) {
        Ok(record) => {
            tracing::debug!(
                "Diffed {} on '{}': {} changed fields",
                event.event_type(),
                record.ref_path,
                record.diff.len()
            );
            Some(record)
        }
        Err(e) => {
            tracing::error!("Failed to diff document change: {}", e);
            None
        }
    }
}

/// Wait for the next change on a store's event channel and diff it
///
/// Events that cannot be diffed are skipped. A lagging receiver logs how many
/// events it missed and keeps going. Returns `None` once the channel closes.
pub async fn next_change_record(
    rx: &mut broadcast::Receiver<DocumentChangeEvent>,
) -> Option<ChangeRecord> {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(record) = diff_document_change(&event) {
                    return Some(record);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Change feed lagged, {} events skipped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

/// Diff one change event, returning the reason on failure
pub fn build_change_record(event: &DocumentChangeEvent) -> Result<ChangeRecord, ChangeDiffError> {
    let current = event
        .data
        .as_ref()
        .ok_or(ChangeDiffError::MissingSnapshot)?;

    let previous_data = match &event.previous {
        Some(previous) => {
            if previous.path() != current.path() {
                return Err(ChangeDiffError::PathMismatch {
                    current: current.path().to_string(),
                    previous: previous.path().to_string(),
                });
            }
            DocumentState::from_snapshot(previous)?
        }
        None => DocumentState::default(),
    };
    let current_data = DocumentState::from_snapshot(current)?;

    let diff = diff_fields(previous_data.data.as_ref(), current_data.data.as_ref());

    Ok(ChangeRecord {
        ref_path: current.path().to_string(),
        current_data,
        previous_data,
        diff,
    })
}

/// Symmetric difference of two sanitized field maps
///
/// `None` behaves like an empty map. `from`/`to` are `null` for a field that
/// is absent on that side.
pub fn diff_fields(
    previous: Option<&Map<String, Value>>,
    current: Option<&Map<String, Value>>,
) -> Vec<FieldChange> {
    let empty = Map::new();
    let previous = previous.unwrap_or(&empty);
    let current = current.unwrap_or(&empty);

    let mut keys: Vec<&String> = Vec::new();
    for (key, value) in previous {
        if !current.get(key).is_some_and(|other| json_eq(value, other)) {
            keys.push(key);
        }
    }
    // Shared keys were settled above
    for key in current.keys() {
        if !previous.contains_key(key) {
            keys.push(key);
        }
    }

    keys.into_iter()
        .map(|key| FieldChange {
            key: key.clone(),
            change: Change {
                from: previous.get(key).cloned().unwrap_or(Value::Null),
                to: current.get(key).cloned().unwrap_or(Value::Null),
            },
        })
        .collect()
}

/// Deep equality that treats `1` and `1.0` as equal and ignores key order
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, value)| y.get(key).is_some_and(|other| json_eq(value, other)))
        }
        _ => a == b,
    }
}

fn serialize_timestamp<S>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(ts) => serializer.serialize_str(&format_timestamp(ts)),
        None => serializer.serialize_none(),
    }
}
