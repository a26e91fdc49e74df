//! Store Handles and Snapshots
//!
//! Typed handles produced by a store adapter. References are cheap,
//! path-only handles; snapshots are point-in-time reads.

use crate::models::path::{InvalidPathError, StorePath};
use crate::models::value::StoreValue;
use chrono::{DateTime, Utc};
use std::fmt;

/// Ordered map of store-native field values
pub type StoreFields = Vec<(String, StoreValue)>;

/// Handle to a document (even segment count)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentReference {
    path: StorePath,
}

impl DocumentReference {
    /// Build a reference from a parsed path
    ///
    /// # Errors
    ///
    /// Returns `InvalidPathError` if the path does not address a document.
    pub fn new(path: StorePath) -> Result<Self, InvalidPathError> {
        if !path.is_document() {
            return Err(InvalidPathError::new(
                path.to_string(),
                "document paths need an even number of segments",
            ));
        }
        Ok(Self { path })
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidPathError> {
        Self::new(StorePath::parse(raw)?)
    }

    pub fn id(&self) -> &str {
        self.path.last_segment().unwrap_or_default()
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// Collection that contains this document
    pub fn parent(&self) -> CollectionReference {
        CollectionReference {
            path: self.path.parent().unwrap_or_default(),
        }
    }

    /// Handle to a subcollection of this document
    pub fn collection(&self, id: &str) -> Result<CollectionReference, InvalidPathError> {
        CollectionReference::new(self.path.child(id)?)
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.path, f)
    }
}

/// Handle to a collection (odd segment count)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionReference {
    path: StorePath,
}

impl CollectionReference {
    /// # Errors
    ///
    /// Returns `InvalidPathError` if the path does not address a collection.
    pub fn new(path: StorePath) -> Result<Self, InvalidPathError> {
        if !path.is_collection() {
            return Err(InvalidPathError::new(
                path.to_string(),
                "collection paths need an odd number of segments",
            ));
        }
        Ok(Self { path })
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidPathError> {
        Self::new(StorePath::parse(raw)?)
    }

    pub fn id(&self) -> &str {
        self.path.last_segment().unwrap_or_default()
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// Handle to a document inside this collection
    pub fn doc(&self, id: &str) -> Result<DocumentReference, InvalidPathError> {
        DocumentReference::new(self.path.child(id)?)
    }
}

impl fmt::Display for CollectionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.path, f)
    }
}

/// Point-in-time read of one document
///
/// `data` is `None` when the document does not exist. A snapshot of a missing
/// document still carries its reference, since subcollections may live under
/// a path whose document was never written.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub reference: DocumentReference,
    pub exists: bool,
    pub data: Option<StoreFields>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

impl DocumentSnapshot {
    /// Snapshot of an existing document
    pub fn existing(reference: DocumentReference, data: StoreFields) -> Self {
        Self {
            reference,
            exists: true,
            data: Some(data),
            create_time: None,
            update_time: None,
        }
    }

    /// Snapshot of a document that does not exist
    pub fn missing(reference: DocumentReference) -> Self {
        Self {
            reference,
            exists: false,
            data: None,
            create_time: None,
            update_time: None,
        }
    }

    pub fn with_times(
        mut self,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    ) -> Self {
        self.create_time = create_time;
        self.update_time = update_time;
        self
    }

    pub fn id(&self) -> &str {
        self.reference.id()
    }

    pub fn path(&self) -> &StorePath {
        self.reference.path()
    }

    /// Field lookup by name
    pub fn get(&self, field: &str) -> Option<&StoreValue> {
        self.data
            .as_ref()?
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

/// Ordered result of listing a collection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySnapshot {
    pub docs: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    pub fn new(docs: Vec<DocumentSnapshot>) -> Self {
        Self { docs }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
