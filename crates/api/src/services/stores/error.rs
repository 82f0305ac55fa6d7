//! Store service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or malformed store fields.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No such store, or the store belongs to someone else.
    #[error("store not found")]
    NotFound,

    /// The account already owns its single allowed store.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
