//! In-Memory Document Store
//!
//! A complete [`DocumentStore`] held in process memory. Used by the dev tools
//! (loaded from a JSON fixture) and by tests.
//!
//! Documents live in a path-ordered map, so listings come back ordered by
//! document id, and a document's subcollections are discovered from the paths
//! stored beneath it. That also means subcollections are visible under a
//! document that was never written or has been deleted.
//!
//! Every write publishes a [`DocumentChangeEvent`] on a broadcast channel.

use crate::db::events::DocumentChangeEvent;
use crate::db::fixture;
use crate::db::{DocumentStore, StoreError};
use crate::models::{
    CollectionReference, DocumentReference, DocumentSnapshot, QuerySnapshot, StoreFields,
    StorePath, SystemTimeProvider, TimeProvider,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Capacity of the change event channel
///
/// Slow subscribers lag and skip events rather than blocking writers.
const CHANGE_EVENT_CHANNEL_CAPACITY: usize = 128;

#[derive(Debug, Clone)]
struct StoredDocument {
    data: StoreFields,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
}

/// Process-local document store
pub struct MemoryStore {
    documents: RwLock<BTreeMap<StorePath, StoredDocument>>,
    clock: Arc<dyn TimeProvider>,
    change_tx: broadcast::Sender<DocumentChangeEvent>,
}

impl MemoryStore {
    /// Empty store stamped by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemTimeProvider))
    }

    /// Empty store stamped by the given clock
    pub fn with_clock(clock: Arc<dyn TimeProvider>) -> Self {
        let (change_tx, _) = broadcast::channel(CHANGE_EVENT_CHANNEL_CAPACITY);
        Self {
            documents: RwLock::new(BTreeMap::new()),
            clock,
            change_tx,
        }
    }

    /// Build a store from a JSON fixture tree (see [`fixture`])
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidFixture` or `StoreError::InvalidPath` if
    /// the fixture is malformed.
    pub async fn from_fixture(root: &serde_json::Value) -> Result<Self, StoreError> {
        let store = Self::new();
        store.load_fixture(root).await?;
        Ok(store)
    }

    /// Load every document of a fixture tree, overwriting existing paths
    pub async fn load_fixture(&self, root: &serde_json::Value) -> Result<usize, StoreError> {
        let documents = fixture::decode_tree(root)?;
        let mut loaded = 0;
        for document in documents {
            if let Some(data) = document.data {
                self.write(document.reference, data).await;
                loaded += 1;
            }
        }
        tracing::debug!("Loaded {} documents from fixture", loaded);
        Ok(loaded)
    }

    /// Create or replace a document
    ///
    /// Keeps the original create time on replace. Returns the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPath` if `path` does not address a document.
    pub async fn set_document(
        &self,
        path: &str,
        data: StoreFields,
    ) -> Result<DocumentSnapshot, StoreError> {
        let reference = DocumentReference::parse(path)?;
        Ok(self.write(reference, data).await)
    }

    /// Delete a document; its subcollections are left in place
    ///
    /// Returns `true` if a document was removed.
    pub async fn delete_document(&self, path: &str) -> Result<bool, StoreError> {
        let reference = DocumentReference::parse(path)?;

        let removed = {
            let mut documents = self.documents.write().await;
            documents.remove(reference.path())
        };

        match removed {
            Some(stored) => {
                let previous = snapshot_of(&reference, &stored);
                self.emit(DocumentChangeEvent::new(
                    DocumentSnapshot::missing(reference),
                    Some(previous),
                ));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Number of stored (existing) documents
    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Subscribe to change events for every subsequent write
    pub fn subscribe_to_changes(&self) -> broadcast::Receiver<DocumentChangeEvent> {
        self.change_tx.subscribe()
    }

    async fn write(&self, reference: DocumentReference, data: StoreFields) -> DocumentSnapshot {
        let now = self.clock.now();

        let (current, previous) = {
            let mut documents = self.documents.write().await;
            let existing = documents.get(reference.path()).cloned();
            let stored = StoredDocument {
                data,
                create_time: existing.as_ref().map_or(now, |e| e.create_time),
                update_time: now,
            };
            documents.insert(reference.path().clone(), stored.clone());

            let previous = existing
                .map(|e| snapshot_of(&reference, &e))
                .unwrap_or_else(|| DocumentSnapshot::missing(reference.clone()));
            (snapshot_of(&reference, &stored), previous)
        };

        self.emit(DocumentChangeEvent::new(current.clone(), Some(previous)));
        current
    }

    /// Ignores send errors when nobody is subscribed
    fn emit(&self, event: DocumentChangeEvent) {
        tracing::trace!("Emitting {}", event.event_type());
        let _ = self.change_tx.send(event);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn snapshot_of(reference: &DocumentReference, stored: &StoredDocument) -> DocumentSnapshot {
    DocumentSnapshot::existing(reference.clone(), stored.data.clone())
        .with_times(Some(stored.create_time), Some(stored.update_time))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(
        &self,
        reference: &DocumentReference,
    ) -> Result<DocumentSnapshot, StoreError> {
        let documents = self.documents.read().await;
        Ok(match documents.get(reference.path()) {
            Some(stored) => snapshot_of(reference, stored),
            None => DocumentSnapshot::missing(reference.clone()),
        })
    }

    async fn list_documents(
        &self,
        collection: &CollectionReference,
    ) -> Result<QuerySnapshot, StoreError> {
        let parent = collection.path();
        let depth = parent.len() + 1;
        let documents = self.documents.read().await;

        let mut docs = Vec::new();
        for (path, stored) in documents.range(parent.clone()..) {
            if !parent.is_prefix_of(path) {
                break;
            }
            if path.len() == depth {
                let reference = DocumentReference::new(path.clone())?;
                docs.push(snapshot_of(&reference, stored));
            }
        }

        Ok(QuerySnapshot::new(docs))
    }

    async fn list_collections(
        &self,
        document: &DocumentReference,
    ) -> Result<Vec<CollectionReference>, StoreError> {
        let parent = document.path();
        let depth = parent.len();
        let documents = self.documents.read().await;

        let mut collections: Vec<CollectionReference> = Vec::new();
        for path in documents.range(parent.clone()..).map(|(path, _)| path) {
            if path == parent {
                continue;
            }
            if !parent.is_prefix_of(path) {
                break;
            }
            let id = &path.segments()[depth];
            if collections.last().map(|c| c.id()) != Some(id.as_str()) {
                collections.push(document.collection(id)?);
            }
        }

        Ok(collections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::events::ChangeKind;
    use crate::models::{ManualTimeProvider, StoreValue};
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn fields(pairs: &[(&str, i64)]) -> StoreFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), StoreValue::Integer(*v)))
            .collect()
    }

    #[tokio::test]
    async fn get_missing_document_is_not_an_error() {
        let store = MemoryStore::new();
        let snap = store
            .get_document(&DocumentReference::parse("c1/d1").unwrap())
            .await
            .unwrap();
        assert!(!snap.exists);
        assert!(snap.data.is_none());
    }

    #[tokio::test]
    async fn list_documents_returns_direct_children_in_id_order() {
        let store = MemoryStore::new();
        store.set_document("c1/b", fields(&[])).await.unwrap();
        store.set_document("c1/a", fields(&[])).await.unwrap();
        store.set_document("c1/a/sub/x", fields(&[])).await.unwrap();
        store.set_document("c10/z", fields(&[])).await.unwrap();

        let listed = store
            .list_documents(&CollectionReference::parse("c1").unwrap())
            .await
            .unwrap();
        let ids: Vec<&str> = listed.docs.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn list_collections_finds_deep_paths_once() {
        let store = MemoryStore::new();
        store.set_document("c1/d1/posts/p1", fields(&[])).await.unwrap();
        store.set_document("c1/d1/posts/p2", fields(&[])).await.unwrap();
        store
            .set_document("c1/d1/likes/l1/deep/x", fields(&[]))
            .await
            .unwrap();
        store.set_document("c1/d2/other/o1", fields(&[])).await.unwrap();

        let collections = store
            .list_collections(&DocumentReference::parse("c1/d1").unwrap())
            .await
            .unwrap();
        let ids: Vec<&str> = collections.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["likes", "posts"]);
    }

    #[tokio::test]
    async fn timestamps_track_create_and_update() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(ManualTimeProvider::with_time(start));
        let store = MemoryStore::with_clock(clock.clone());

        store.set_document("c1/d1", fields(&[("a", 1)])).await.unwrap();
        clock.advance(Duration::minutes(1));
        let snap = store.set_document("c1/d1", fields(&[("a", 2)])).await.unwrap();

        assert_eq!(snap.create_time, Some(start));
        assert_eq!(snap.update_time, Some(start + Duration::minutes(1)));
    }

    #[tokio::test]
    async fn writes_emit_change_events() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe_to_changes();

        store.set_document("c1/d1", fields(&[("a", 1)])).await.unwrap();
        store.set_document("c1/d1", fields(&[("a", 2)])).await.unwrap();
        assert!(store.delete_document("c1/d1").await.unwrap());
        assert!(!store.delete_document("c1/d1").await.unwrap());

        let kinds: Vec<_> = [
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
        ]
        .iter()
        .map(|e| e.kind().unwrap())
        .collect();
        assert_eq!(
            kinds,
            vec![ChangeKind::Created, ChangeKind::Updated, ChangeKind::Deleted]
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn fixture_loading_skips_absent_documents() {
        let store = MemoryStore::from_fixture(&json!({
            "c1": {
                "d1": {"a": 1},
                "ghost": {"__exists__": false, "__collections__": {"c2": {"d2": {}}}}
            }
        }))
        .await
        .unwrap();

        assert_eq!(store.document_count().await, 2);
        let ghost = DocumentReference::parse("c1/ghost").unwrap();
        assert!(!store.get_document(&ghost).await.unwrap().exists);
        assert_eq!(store.list_collections(&ghost).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn set_document_rejects_collection_paths() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.set_document("c1", fields(&[])).await,
            Err(StoreError::InvalidPath(_))
        ));
    }
}
