//! Storage error types

use crate::core_model::ValidationError;
use thiserror::Error;

/// Failures raised by the persistence layer
///
/// Duplicate-key and validation conditions are distinguishable variants so
/// callers dispatch on them exhaustively instead of matching error strings.
/// Everything else propagates verbatim.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write
    #[error("duplicate key: {detail}")]
    Duplicate { detail: String },

    /// Schema validation rejected the entity
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A non-unique constraint (NOT NULL, CHECK) rejected the write
    #[error("constraint violated: {detail}")]
    Constraint { detail: String },

    /// Credential hashing failed before the write
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// Could not obtain a pooled connection
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Any other database failure, unchanged
    #[error(transparent)]
    Sql(rusqlite::Error),
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        StoreError::Pool(err.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, ref message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let detail = message.clone().unwrap_or_else(|| code.to_string());
                if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                {
                    StoreError::Duplicate { detail }
                } else {
                    StoreError::Constraint { detail }
                }
            }
            other => StoreError::Sql(other),
        }
    }
}
