//! DocumentStore Trait - Store Client Abstraction
//!
//! The export service never talks to a concrete database. It reads through
//! this trait, which a store adapter implements on top of its client library.
//! The adapter is also responsible for classifying raw field values into
//! [`StoreValue`](crate::models::StoreValue) variants.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: every read may cross the network
//! 2. **Read-only**: the export and diff paths only need three reads
//! 3. **No retries**: retry/backoff belongs inside the adapter; errors returned
//!    here are final
//!
//! # Examples
//!
//! ```rust
//! use treesnap_core::db::{DocumentStore, MemoryStore};
//! use treesnap_core::models::{DocumentReference, StoreValue};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let store = MemoryStore::new();
//! store
//!     .set_document("users/alice", vec![("name".to_string(), StoreValue::from("Alice"))])
//!     .await?;
//!
//! let snapshot = store.get_document(&DocumentReference::parse("users/alice")?).await?;
//! assert!(snapshot.exists);
//! # Ok(())
//! # }
//! ```

use crate::db::StoreError;
use crate::models::{CollectionReference, DocumentReference, DocumentSnapshot, QuerySnapshot};
use async_trait::async_trait;

/// Read access to a hierarchical document store
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the export service fans requests out
/// across concurrently running futures.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document
    ///
    /// A document that does not exist is not an error: the returned snapshot
    /// has `exists == false` and no data.
    async fn get_document(
        &self,
        reference: &DocumentReference,
    ) -> Result<DocumentSnapshot, StoreError>;

    /// List the documents directly inside a collection, in store order
    async fn list_documents(
        &self,
        collection: &CollectionReference,
    ) -> Result<QuerySnapshot, StoreError>;

    /// List the subcollections of a document, in store order
    ///
    /// Returns collections even when the document itself does not exist.
    async fn list_collections(
        &self,
        document: &DocumentReference,
    ) -> Result<Vec<CollectionReference>, StoreError>;
}
