//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field was missing or blank.
    #[error("missing required fields")]
    MissingFields,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] dorodango_core::EmailError),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No account for the given uid.
    #[error("account not found")]
    AccountNotFound,

    /// An account with this email already exists.
    #[error("account already exists")]
    UserAlreadyExists,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
