//! Error types for Prism.
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! is [`PrismError`]. Variants fall into two groups: input problems that are
//! reported before the backend is contacted (and are never retried), and
//! backend/provider failures that the retry executor may attempt again.

use thiserror::Error;

use crate::backend::BackendError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PrismError>;

/// The error type for all Prism operations.
#[derive(Debug, Error)]
pub enum PrismError {
    /// Caller-supplied input is structurally invalid.
    #[error("validation error: {0}")]
    Validation(String),

    /// The weight vector cannot be normalized.
    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    /// A vector has the wrong number of components.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A value that should be an embedding is not a sequence of numbers.
    #[error("invalid embedding type: {0}")]
    InvalidEmbeddingType(String),

    /// An embedding contains non-numeric or non-finite components.
    #[error("invalid embedding values: {0}")]
    InvalidEmbeddingValues(String),

    /// The similarity backend reported a failure.
    #[error("search error: {message}{}", code.as_ref().map(|c| format!(" (code: {c})")).unwrap_or_default())]
    Search {
        message: String,
        code: Option<String>,
    },

    /// An update or lookup targeted a document that does not exist.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// The embedding provider failed.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Configuration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PrismError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PrismError::Validation(msg.into())
    }

    pub fn invalid_weights(msg: impl Into<String>) -> Self {
        PrismError::InvalidWeights(msg.into())
    }

    pub fn invalid_embedding_type(msg: impl Into<String>) -> Self {
        PrismError::InvalidEmbeddingType(msg.into())
    }

    pub fn invalid_embedding_values(msg: impl Into<String>) -> Self {
        PrismError::InvalidEmbeddingValues(msg.into())
    }

    /// A backend failure without a backend-specific code.
    pub fn search(msg: impl Into<String>) -> Self {
        PrismError::Search {
            message: msg.into(),
            code: None,
        }
    }

    pub fn search_with_code(msg: impl Into<String>, code: impl Into<String>) -> Self {
        PrismError::Search {
            message: msg.into(),
            code: Some(code.into()),
        }
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        PrismError::Embedding(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        PrismError::InvalidConfig(msg.into())
    }

    /// Returns true for errors raised by input validation.
    ///
    /// These are surfaced immediately and never reach the retry executor.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PrismError::Validation(_)
                | PrismError::InvalidWeights(_)
                | PrismError::DimensionMismatch { .. }
                | PrismError::InvalidEmbeddingType(_)
                | PrismError::InvalidEmbeddingValues(_)
        )
    }

    /// The backend error code carried by a [`PrismError::Search`], if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            PrismError::Search { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Advisory check for transient failures. See [`crate::retry::is_retryable_error`].
    pub fn is_retryable(&self) -> bool {
        crate::retry::is_retryable_error(self)
    }
}

impl From<BackendError> for PrismError {
    fn from(err: BackendError) -> Self {
        let message = if err.message.trim().is_empty() {
            "unexpected backend failure".to_string()
        } else {
            err.message
        };
        PrismError::Search {
            message,
            code: err.code,
        }
    }
}
