//! Treesnap Core
//!
//! Exports a recursive, self-describing snapshot of a hierarchical document
//! store (collections containing documents containing further collections)
//! as one plain JSON tree, and computes field-level diffs for document
//! change events.
//!
//! # Architecture
//!
//! - **Typed store values**: a store adapter classifies every value into
//!   [`StoreValue`](models::StoreValue) before the core sees it
//! - **Total sanitizer**: every exported value passes through
//!   [`sanitize`](sanitize::sanitize) and comes out as plain JSON
//! - **Concurrent traversal**: sibling subtrees are exported concurrently and
//!   joined in store order, with a bound on in-flight store reads
//! - **Fail-fast export, best-effort diff**: a failed store read aborts an
//!   export; a malformed change event only yields `None`
//!
//! # Modules
//!
//! - [`models`] - Paths, references, snapshots, store values, export nodes
//! - [`sanitize`] - Store value to JSON conversion and the right-biased merge
//! - [`db`] - `DocumentStore` trait, in-memory store, change events
//! - [`services`] - `BackupService` and the change differ

pub mod db;
pub mod models;
pub mod sanitize;
pub mod services;

// Re-export commonly used types
pub use db::{DocumentChangeEvent, DocumentStore, MemoryStore, StoreError};
pub use models::*;
pub use services::*;
