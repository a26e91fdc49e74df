//! Change Feed Integration Tests
//!
//! Writes to a `MemoryStore` and diffs the resulting change events.

#[cfg(test)]
mod change_feed_tests {
    use anyhow::Result;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;
    use treesnap_core::db::{DocumentChangeEvent, MemoryStore};
    use treesnap_core::models::{
        DocumentReference, DocumentSnapshot, ManualTimeProvider, StoreValue,
    };
    use treesnap_core::services::change_diff::{diff_document_change, next_change_record};

    fn ints(pairs: &[(&str, i64)]) -> Vec<(String, StoreValue)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), StoreValue::Integer(*v)))
            .collect()
    }

    #[tokio::test]
    async fn test_create_without_previous_diffs_every_field() -> Result<()> {
        let reference = DocumentReference::parse("c1/d1")?;
        let event = DocumentChangeEvent::new(
            DocumentSnapshot::existing(reference, ints(&[("a", 1)])),
            None,
        );

        let record = diff_document_change(&event).expect("diffable event");
        assert_eq!(
            serde_json::to_value(&record.diff)?,
            json!([{"key": "a", "change": {"from": null, "to": 1}}])
        );
        assert!(!record.previous_data.exists);
        assert_eq!(record.previous_data.data, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_reports_only_changed_fields() -> Result<()> {
        let store = MemoryStore::new();
        store.set_document("c1/d1", ints(&[("a", 1), ("b", 2)])).await?;

        let mut rx = store.subscribe_to_changes();
        store.set_document("c1/d1", ints(&[("a", 1), ("b", 3)])).await?;

        let record = next_change_record(&mut rx).await.expect("change record");
        assert_eq!(record.ref_path, "c1/d1");
        assert_eq!(
            serde_json::to_value(&record.diff)?,
            json!([{"key": "b", "change": {"from": 2, "to": 3}}])
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_store_writes_produce_full_records() -> Result<()> {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualTimeProvider::with_time(start));
        let store = MemoryStore::with_clock(clock.clone());
        let mut rx = store.subscribe_to_changes();

        store.set_document("users/alice", ints(&[("age", 30)])).await?;
        clock.advance(Duration::seconds(5));
        store
            .set_document(
                "users/alice",
                vec![
                    ("age".to_string(), StoreValue::Integer(31)),
                    ("city".to_string(), StoreValue::from("Oslo")),
                ],
            )
            .await?;
        store.delete_document("users/alice").await?;

        let created = next_change_record(&mut rx).await.expect("created");
        assert_eq!(created.changed_keys(), vec!["age"]);
        assert!(created.current_data.exists);

        let updated = next_change_record(&mut rx).await.expect("updated");
        assert_eq!(updated.changed_keys(), vec!["age", "city"]);
        assert_eq!(
            serde_json::to_value(&updated)?,
            json!({
                "refPath": "users/alice",
                "currentData": {
                    "exists": true,
                    "id": "alice",
                    "createTime": "2024-06-01T12:00:00.000Z",
                    "updateTime": "2024-06-01T12:00:05.000Z",
                    "data": {"age": 31, "city": "Oslo"},
                },
                "previousData": {
                    "exists": true,
                    "id": "alice",
                    "createTime": "2024-06-01T12:00:00.000Z",
                    "updateTime": "2024-06-01T12:00:00.000Z",
                    "data": {"age": 30},
                },
                "diff": [
                    {"key": "age", "change": {"from": 30, "to": 31}},
                    {"key": "city", "change": {"from": null, "to": "Oslo"}},
                ],
            })
        );

        let deleted = next_change_record(&mut rx).await.expect("deleted");
        assert!(!deleted.current_data.exists);
        assert_eq!(deleted.current_data.data, None);
        assert_eq!(deleted.changed_keys(), vec!["age", "city"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_identical_rewrite_has_empty_diff() -> Result<()> {
        let store = MemoryStore::new();
        let body = vec![
            ("n".to_string(), StoreValue::Double(1.0)),
            (
                "nested".to_string(),
                StoreValue::map([("x", StoreValue::Integer(1)), ("y", StoreValue::Integer(2))]),
            ),
        ];
        store.set_document("c1/d1", body).await?;

        let mut rx = store.subscribe_to_changes();
        store
            .set_document(
                "c1/d1",
                vec![
                    (
                        "nested".to_string(),
                        StoreValue::map([
                            ("y", StoreValue::Integer(2)),
                            ("x", StoreValue::Integer(1)),
                        ]),
                    ),
                    ("n".to_string(), StoreValue::Integer(1)),
                ],
            )
            .await?;

        let record = next_change_record(&mut rx).await.expect("record");
        assert!(record.diff.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_events_are_skipped() -> Result<()> {
        let event = DocumentChangeEvent {
            data: None,
            previous: None,
        };
        assert!(diff_document_change(&event).is_none());

        let mismatched = DocumentChangeEvent::new(
            DocumentSnapshot::existing(DocumentReference::parse("c1/d1")?, ints(&[])),
            Some(DocumentSnapshot::existing(
                DocumentReference::parse("c1/d2")?,
                ints(&[]),
            )),
        );
        assert!(diff_document_change(&mismatched).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_closed_channel_ends_feed() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe_to_changes();
        drop(store);
        assert!(next_change_record(&mut rx).await.is_none());
    }
}
