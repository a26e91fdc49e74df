//! Recursive Tree Export
//!
//! `BackupService` walks a document store from a root path and materializes
//! everything beneath it into one plain JSON tree.
//!
//! # Traversal
//!
//! - A document export fetches the document and lists its subcollections
//!   concurrently, then exports every subcollection concurrently.
//! - A collection export lists its documents and exports all of them
//!   concurrently. Documents already returned by the listing are not fetched
//!   again.
//! - Results are joined only after every sibling subtree has resolved, in
//!   store listing order. Callers never observe a partial tree.
//! - The first failing store read aborts the whole export.
//!
//! Every store read holds a permit from a semaphore sized by
//! `BackupConfig::max_concurrent_fetches`; permits are released before
//! recursing, so nested exports cannot starve each other.

use crate::db::DocumentStore;
use crate::models::{
    classify, CollectionNode, CollectionReference, DocumentNode, DocumentReference,
    DocumentSnapshot, PathClassification, QuerySnapshot,
};
use crate::sanitize::sanitize_fields;
use crate::services::config::BackupConfig;
use crate::services::error::{BackupError, StoreOperation};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Where a document export starts from
enum DocumentSource {
    /// Only a handle; the document still has to be read
    Reference(DocumentReference),
    /// Already read by a collection listing
    Snapshot(DocumentSnapshot),
}

impl DocumentSource {
    fn reference(&self) -> &DocumentReference {
        match self {
            DocumentSource::Reference(reference) => reference,
            DocumentSource::Snapshot(snapshot) => &snapshot.reference,
        }
    }
}

/// Recursive export service
pub struct BackupService {
    store: Arc<dyn DocumentStore>,
    config: BackupConfig,
    fetch_permits: Semaphore,
}

impl BackupService {
    /// Create a service with default configuration
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let config = BackupConfig::default();
        let fetch_permits = Semaphore::new(config.max_concurrent_fetches);
        Self {
            store,
            config,
            fetch_permits,
        }
    }

    /// Create a service with explicit configuration
    ///
    /// # Errors
    ///
    /// Returns `BackupError::InvalidConfig` or `BackupError::InvalidPath` if
    /// the configuration does not validate.
    pub fn with_config(
        store: Arc<dyn DocumentStore>,
        config: BackupConfig,
    ) -> Result<Self, BackupError> {
        config.validate()?;
        let fetch_permits = Semaphore::new(config.max_concurrent_fetches);
        Ok(Self {
            store,
            config,
            fetch_permits,
        })
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Export the tree at `root_path`
    ///
    /// An absent or blank `root_path` falls back to
    /// `BackupConfig::default_root_path`.
    ///
    /// - Document path: the document rendered as a plain object, with its
    ///   subcollections merged over its fields.
    /// - Collection path: `{collection_id: [documents..]}`.
    /// - Store root: an empty object. Whole-store dumps are not performed.
    ///
    /// # Errors
    ///
    /// - `BackupError::InvalidPath` if the path is malformed
    /// - `BackupError::StoreAccess` if any store read fails
    /// - `BackupError::DepthExceeded` if the tree is deeper than `max_depth`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use treesnap_core::db::MemoryStore;
    /// use treesnap_core::models::StoreValue;
    /// use treesnap_core::services::BackupService;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> anyhow::Result<()> {
    /// let store = Arc::new(MemoryStore::new());
    /// store.set_document("c1/d1", vec![("a".to_string(), StoreValue::Integer(1))]).await?;
    ///
    /// let service = BackupService::new(store);
    /// let tree = service.start(Some("c1")).await?;
    /// assert_eq!(tree["c1"][0]["id"], "d1");
    /// assert_eq!(tree["c1"][0]["a"], 1);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start(&self, root_path: Option<&str>) -> Result<Value, BackupError> {
        let root_path = root_path
            .filter(|p| !p.trim().is_empty())
            .or(self.config.default_root_path.as_deref());
        let started = Instant::now();

        let tree = match classify(root_path)? {
            PathClassification::StoreRoot => {
                tracing::info!("Export requested at store root; returning empty tree");
                return Ok(Value::Object(Map::new()));
            }
            PathClassification::DocumentPath(path) => {
                let reference = DocumentReference::new(path)?;
                tracing::info!("Starting export of document '{}'", reference);
                let node = self.export_document(&reference).await?;
                tracing::info!(
                    "Exported {} documents under '{}' in {:?}",
                    node.document_count(),
                    reference,
                    started.elapsed()
                );
                node.to_value()
            }
            PathClassification::CollectionPath(path) => {
                let collection = CollectionReference::new(path)?;
                tracing::info!("Starting export of collection '{}'", collection);
                let node = self.export_collection(&collection).await?;
                tracing::info!(
                    "Exported {} documents under '{}' in {:?}",
                    node.document_count(),
                    collection,
                    started.elapsed()
                );
                node.to_value()
            }
        };

        Ok(tree)
    }

    /// Export one document and all of its subcollections
    pub async fn export_document(
        &self,
        reference: &DocumentReference,
    ) -> Result<DocumentNode, BackupError> {
        self.export_document_at(DocumentSource::Reference(reference.clone()), 0)
            .await
    }

    /// Export every document of one collection, recursively
    pub async fn export_collection(
        &self,
        collection: &CollectionReference,
    ) -> Result<CollectionNode, BackupError> {
        self.export_collection_at(collection.clone(), 1).await
    }

    /// `depth` is the number of collection levels above this document,
    /// counted from the start point
    fn export_document_at(
        &self,
        source: DocumentSource,
        depth: usize,
    ) -> BoxFuture<'_, Result<DocumentNode, BackupError>> {
        async move {
            let reference = source.reference().clone();

            let (snapshot, collections) = match source {
                DocumentSource::Snapshot(snapshot) => {
                    let collections = self.list_collections(&reference).await?;
                    (snapshot, collections)
                }
                DocumentSource::Reference(reference) => {
                    tokio::try_join!(
                        self.get_document(&reference),
                        self.list_collections(&reference)
                    )?
                }
            };

            let children = try_join_all(
                collections
                    .into_iter()
                    .map(|collection| self.export_collection_at(collection, depth + 1)),
            )
            .await?;

            let fields = match snapshot.data.as_ref() {
                Some(data) if snapshot.exists => sanitize_fields(data),
                _ => Map::new(),
            };

            Ok(DocumentNode {
                document_path: reference.to_string(),
                id: reference.id().to_string(),
                reference,
                fields,
                collections: children,
            })
        }
        .boxed()
    }

    fn export_collection_at(
        &self,
        collection: CollectionReference,
        depth: usize,
    ) -> BoxFuture<'_, Result<CollectionNode, BackupError>> {
        async move {
            if let Some(max_depth) = self.config.max_depth {
                if depth > max_depth {
                    tracing::warn!(
                        "Collection '{}' is {} levels deep, limit is {}",
                        collection,
                        depth,
                        max_depth
                    );
                    return Err(BackupError::depth_exceeded(
                        collection.to_string(),
                        max_depth,
                    ));
                }
            }

            let listing = self.list_documents(&collection).await?;
            tracing::debug!(
                "Collection '{}' has {} documents",
                collection,
                listing.docs.len()
            );

            let documents = try_join_all(
                listing
                    .docs
                    .into_iter()
                    .map(|doc| self.export_document_at(DocumentSource::Snapshot(doc), depth)),
            )
            .await?;

            Ok(CollectionNode {
                name: collection.id().to_string(),
                documents,
            })
        }
        .boxed()
    }

    async fn get_document(
        &self,
        reference: &DocumentReference,
    ) -> Result<DocumentSnapshot, BackupError> {
        let _permit = self.acquire().await;
        tracing::debug!("Fetching document '{}'", reference);
        self.store.get_document(reference).await.map_err(|e| {
            BackupError::store_access(StoreOperation::GetDocument, reference.to_string(), e)
        })
    }

    async fn list_documents(
        &self,
        collection: &CollectionReference,
    ) -> Result<QuerySnapshot, BackupError> {
        let _permit = self.acquire().await;
        tracing::debug!("Listing documents of '{}'", collection);
        self.store.list_documents(collection).await.map_err(|e| {
            BackupError::store_access(StoreOperation::ListDocuments, collection.to_string(), e)
        })
    }

    async fn list_collections(
        &self,
        reference: &DocumentReference,
    ) -> Result<Vec<CollectionReference>, BackupError> {
        let _permit = self.acquire().await;
        tracing::debug!("Listing subcollections of '{}'", reference);
        self.store.list_collections(reference).await.map_err(|e| {
            BackupError::store_access(StoreOperation::ListCollections, reference.to_string(), e)
        })
    }

    /// Wait for a fetch permit
    ///
    /// The semaphore is private and never closed, so acquisition cannot fail.
    async fn acquire(&self) -> Option<SemaphorePermit<'_>> {
        self.fetch_permits.acquire().await.ok()
    }
}
