//! Shared helpers for the Treesnap development binaries
//!
//! - `treesnap-export`: load a JSON fixture into a `MemoryStore` and print
//!   the exported tree
//! - `treesnap-diff`: diff two fixture documents as a change event and print
//!   the change record

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;
use treesnap_core::db::fixture::decode_fields;
use treesnap_core::db::DocumentChangeEvent;
use treesnap_core::models::{DocumentReference, DocumentSnapshot};

/// Install the fmt subscriber, honoring `RUST_LOG` and defaulting to `info`
///
/// Logs go to stderr so stdout carries only JSON.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read and parse a JSON file
pub fn read_json(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Build a change event for `document_path` from two JSON document bodies
///
/// A `null` body stands for a document that does not exist on that side.
/// Bodies use the fixture field encoding, so typed values may be tagged.
pub fn change_event_from_json(
    document_path: &str,
    before: &Value,
    after: &Value,
) -> Result<DocumentChangeEvent> {
    let reference = DocumentReference::parse(document_path)?;
    let previous = snapshot_from_json(&reference, before)?;
    let current = snapshot_from_json(&reference, after)?;
    Ok(DocumentChangeEvent::new(current, Some(previous)))
}

fn snapshot_from_json(reference: &DocumentReference, body: &Value) -> Result<DocumentSnapshot> {
    match body {
        Value::Null => Ok(DocumentSnapshot::missing(reference.clone())),
        Value::Object(_) => Ok(DocumentSnapshot::existing(
            reference.clone(),
            decode_fields(body)?,
        )),
        other => bail!("Document body must be an object or null, got {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use treesnap_core::db::ChangeKind;

    #[test]
    fn reads_json_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"c1": {{"d1": {{"a": 1}}}}}}"#).unwrap();

        let value = read_json(file.path()).unwrap();
        assert_eq!(value, json!({"c1": {"d1": {"a": 1}}}));
    }

    #[test]
    fn reports_unparseable_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = read_json(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse"));
    }

    #[test]
    fn null_body_is_a_missing_document() {
        let event = change_event_from_json("c1/d1", &Value::Null, &json!({"a": 1})).unwrap();
        assert_eq!(event.kind(), Some(ChangeKind::Created));

        let event = change_event_from_json("c1/d1", &json!({"a": 1}), &Value::Null).unwrap();
        assert_eq!(event.kind(), Some(ChangeKind::Deleted));
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(change_event_from_json("c1", &json!({}), &json!({})).is_err());
        assert!(change_event_from_json("c1/d1", &json!([1]), &json!({})).is_err());
    }
}
