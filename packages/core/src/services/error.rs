//! Service Layer Error Types
//!
//! `BackupError` is returned by the export service and is always fatal for
//! the call that produced it. `ChangeDiffError` describes why a change event
//! could not be diffed; the public diff entry point logs it and returns
//! `None` instead of propagating.

use crate::db::StoreError;
use crate::models::InvalidPathError;
use std::fmt;
use thiserror::Error;

/// Store read that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    GetDocument,
    ListDocuments,
    ListCollections,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreOperation::GetDocument => "get document",
            StoreOperation::ListDocuments => "list documents",
            StoreOperation::ListCollections => "list collections",
        })
    }
}

/// Export operation errors
#[derive(Error, Debug)]
pub enum BackupError {
    /// Root path rejected by the path grammar
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] InvalidPathError),

    /// A store read failed; the whole export is aborted
    #[error("Store access failed ({operation} at '{path}'): {source}")]
    StoreAccess {
        operation: StoreOperation,
        path: String,
        source: StoreError,
    },

    /// Tree is deeper than the configured limit
    #[error("Export depth limit {max_depth} exceeded at '{path}'")]
    DepthExceeded { path: String, max_depth: usize },

    /// Configuration rejected by `BackupConfig::validate`
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BackupError {
    /// Create a store access error
    pub fn store_access(
        operation: StoreOperation,
        path: impl Into<String>,
        source: StoreError,
    ) -> Self {
        Self::StoreAccess {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Create a depth exceeded error
    pub fn depth_exceeded(path: impl Into<String>, max_depth: usize) -> Self {
        Self::DepthExceeded {
            path: path.into(),
            max_depth,
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Reasons a change event cannot be turned into a change record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChangeDiffError {
    #[error("Change event has no current document snapshot")]
    MissingSnapshot,

    #[error("Snapshot of existing document '{path}' carries no data")]
    MissingData { path: String },

    #[error("Change event mixes documents: current '{current}', previous '{previous}'")]
    PathMismatch { current: String, previous: String },
}
