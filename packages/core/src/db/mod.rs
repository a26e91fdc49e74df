//! Store Layer
//!
//! This module defines how the core reads a hierarchical document store:
//!
//! - [`DocumentStore`] - the three reads the export service needs
//! - [`StoreError`] - failures a store adapter can report
//! - [`events`] - document change events consumed by the change differ
//! - [`MemoryStore`] - in-process store, loadable from JSON fixtures
//!
//! The core never opens network connections or handles credentials. A
//! production adapter wraps a real client library behind [`DocumentStore`].

mod document_store;
mod error;
pub mod events;
pub mod fixture;
mod memory_store;

pub use document_store::DocumentStore;
pub use error::StoreError;
pub use events::{ChangeKind, DocumentChangeEvent};
pub use memory_store::MemoryStore;
