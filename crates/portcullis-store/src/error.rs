//! Error types for storage adapters.

use thiserror::Error;

/// Errors returned by a [`Store`](crate::Store).
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record matched the key, or the record is outside the caller's scope.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A record with the same unique key already exists.
    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// The backend itself failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn duplicate(entity: &'static str, key: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
