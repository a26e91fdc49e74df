//! Store Error Types
//!
//! Errors raised by a [`DocumentStore`](super::DocumentStore) implementation.
//! The export service wraps these with the operation and path that failed.

use crate::models::path::InvalidPathError;
use thiserror::Error;

/// Store operation errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store could not be reached or refused the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Caller is not allowed to read the given path
    #[error("Permission denied for path: {path}")]
    PermissionDenied { path: String },

    /// A path handed to or produced by the store is malformed
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] InvalidPathError),

    /// Fixture data could not be decoded into documents
    #[error("Invalid fixture at '{location}': {reason}")]
    InvalidFixture { location: String, reason: String },

    /// Backend-specific failure
    #[error("Store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied { path: path.into() }
    }

    /// Create an invalid fixture error
    pub fn invalid_fixture(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFixture {
            location: location.into(),
            reason: reason.into(),
        }
    }
}
