//! Services
//!
//! This module contains the two entry points of the crate:
//!
//! - `BackupService` - recursive export of a document or collection tree
//! - `change_diff` - before/after field diffs for document change events
//!
//! Both read store data through the `db` layer and convert it to plain JSON
//! with the `sanitize` module.

pub mod backup_service;
pub mod change_diff;
pub mod config;
pub mod error;

pub use backup_service::BackupService;
pub use change_diff::{
    build_change_record, diff_document_change, diff_fields, next_change_record, Change,
    ChangeRecord, DocumentState, FieldChange,
};
pub use config::BackupConfig;
pub use error::{BackupError, ChangeDiffError, StoreOperation};
