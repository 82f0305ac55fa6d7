//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during account and session operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field is missing or empty.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] vitrinex_core::EmailError),

    /// Unknown role name.
    #[error("invalid role: {0}")]
    InvalidRole(#[from] vitrinex_core::RoleError),

    /// Password too short or too long.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Wrong password or unknown email. The two are never distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Session token is malformed, tampered with, signed with another key,
    /// or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Email already belongs to an account.
    #[error("email already registered")]
    EmailTaken,

    /// The account behind a valid session no longer exists.
    #[error("account not found")]
    AccountNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token could not be signed.
    #[error("token signing error")]
    TokenIssue,
}
