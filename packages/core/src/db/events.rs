//! Document Change Events
//!
//! A change event carries the state of one document after a write together
//! with its state before the write. Stores publish these on a tokio broadcast
//! channel; the change differ turns them into [`ChangeRecord`]s.
//!
//! [`ChangeRecord`]: crate::services::change_diff::ChangeRecord

use crate::models::DocumentSnapshot;
use serde::{Deserialize, Serialize};

/// What a write did to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// One document write
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChangeEvent {
    /// State after the write (`exists == false` for deletes)
    pub data: Option<DocumentSnapshot>,
    /// State before the write, when known
    pub previous: Option<DocumentSnapshot>,
}

impl DocumentChangeEvent {
    pub fn new(data: DocumentSnapshot, previous: Option<DocumentSnapshot>) -> Self {
        Self {
            data: Some(data),
            previous,
        }
    }

    /// Classify the write, or `None` when the event carries no current state
    pub fn kind(&self) -> Option<ChangeKind> {
        let current = self.data.as_ref()?;
        let existed = self.previous.as_ref().is_some_and(|p| p.exists);

        Some(match (existed, current.exists) {
            (false, _) => ChangeKind::Created,
            (true, true) => ChangeKind::Updated,
            (true, false) => ChangeKind::Deleted,
        })
    }

    /// Event type string for logging
    pub fn event_type(&self) -> &'static str {
        match self.kind() {
            Some(ChangeKind::Created) => "document:created",
            Some(ChangeKind::Updated) => "document:updated",
            Some(ChangeKind::Deleted) => "document:deleted",
            None => "document:unknown",
        }
    }
}
