//! API-facing domain errors
//!
//! Service functions translate only the failure shapes they understand
//! (validation, duplicate-key); everything else rides through in the `Store`
//! variant for the outer layer's generic fallback handling.

use thiserror::Error;
use workhub_core::core_model::ValidationError;
use workhub_core::core_store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Field-level constraint violation or duplicate-key condition
    #[error("{message}")]
    Validation {
        errors: ValidationError,
        message: String,
    },

    /// A lookup by identifier yielded nothing
    #[error("{message}")]
    NotFound { explanation: String, message: String },

    /// The caller lacks authorization for the operation
    #[error("{message}")]
    Unauthorized { explanation: String, message: String },

    /// Untranslated persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Infrastructure failure inside this layer
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Wrap a per-field validation failure
    pub fn validation(errors: ValidationError) -> Self {
        let message = errors.messages().join(", ");
        ApiError::Validation { errors, message }
    }

    /// Validation failure with a single fixed message
    pub fn validation_message(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        ApiError::Validation {
            errors: ValidationError::of(field, message.clone()),
            message,
        }
    }

    pub fn not_found(explanation: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::NotFound {
            explanation: explanation.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(explanation: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            explanation: explanation.into(),
            message: message.into(),
        }
    }

    /// HTTP-style status code for the outer layer
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation { .. } => 400,
            ApiError::NotFound { .. } => 404,
            ApiError::Unauthorized { .. } => 401,
            ApiError::Store(_) | ApiError::Internal(_) => 500,
        }
    }

    /// Caller-facing explanation of what went wrong
    pub fn explanation(&self) -> String {
        match self {
            ApiError::Validation { errors, .. } => errors.messages().join(", "),
            ApiError::NotFound { explanation, .. }
            | ApiError::Unauthorized { explanation, .. } => explanation.clone(),
            ApiError::Store(err) => err.to_string(),
            ApiError::Internal(err) => err.to_string(),
        }
    }

    /// User-facing message
    pub fn message(&self) -> String {
        self.to_string()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
