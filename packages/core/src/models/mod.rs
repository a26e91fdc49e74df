//! Data Models
//!
//! This module contains the data structures shared by the export and diff
//! services:
//!
//! - `path` - Store path grammar and root-path classification
//! - `document` - Document/collection references and snapshots
//! - `value` - Store-native value variants produced by a store adapter
//! - `export_node` - Materialized export tree (`DocumentNode`, `CollectionNode`)
//! - `time` - Clock abstraction used for document timestamps

pub mod document;
pub mod export_node;
pub mod path;
pub mod time;
pub mod value;

pub use document::{
    CollectionReference, DocumentReference, DocumentSnapshot, QuerySnapshot, StoreFields,
};
pub use export_node::{CollectionNode, DocumentNode};
pub use path::{classify, InvalidPathError, PathClassification, StorePath};
pub use time::{ManualTimeProvider, SystemTimeProvider, TimeProvider};
pub use value::StoreValue;
