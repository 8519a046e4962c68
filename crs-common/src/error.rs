//! Common error types for the CRS engine

use thiserror::Error;

use crate::db::models::CrsStatus;

/// Common result type for CRS engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the document engine
///
/// Every variant is detected synchronously at the call site and returned
/// without any mutation having been applied. Retry policy belongs to the
/// caller; `Conflict` carries enough state for a refetch-and-retry decision.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed call, rejected before any mutation (e.g. empty rejection reason)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Optimistic-lock mismatch: someone else changed the document first
    #[error("Stale edit version: document is at edit version {current_edit_version} ({status})")]
    Conflict {
        /// Edit version currently stored for the document
        current_edit_version: i64,
        /// Status currently stored for the document
        status: CrsStatus,
    },

    /// Status change not permitted by the approval state machine
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: CrsStatus, to: CrsStatus },

    /// Content mutation attempted on an approved (edit-locked) document
    #[error("Document is edit-locked in status {status}")]
    EditForbidden { status: CrsStatus },

    /// Actor lacks the authority required for the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Requested document or session not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for errors a caller can resolve by refetching and resubmitting
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}
