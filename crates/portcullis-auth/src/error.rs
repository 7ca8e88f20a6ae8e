//! Error taxonomy of the authentication core.

use portcullis_store::StoreError;
use portcullis_token::TokenError;
use thiserror::Error;

/// Errors surfaced by the gate, the challenge responder and the token
/// lifecycle manager.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed identity or credentials.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Bad credentials, revoked token, or an operation the principal may not perform.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// No such user, namespace, token or key.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Unique key collision on create.
    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// Signing, verification or key decoding failed.
    #[error(transparent)]
    Crypto(#[from] TokenError),

    /// Storage adapter failure, propagated verbatim.
    #[error(transparent)]
    Storage(StoreError),
}

impl AuthError {
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Whether the caller presented a token that was rejected.
    pub fn is_token_rejection(&self) -> bool {
        matches!(self, Self::Crypto(e) if e.is_rejection())
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, key } => Self::NotFound { entity, key },
            StoreError::Duplicate { entity, key } => Self::Duplicate { entity, key },
            other => Self::Storage(other),
        }
    }
}
