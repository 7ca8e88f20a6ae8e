//! Error types for the token crate.

use thiserror::Error;

/// Errors that can occur while handling keys and tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Failed to generate keypair.
    #[error("failed to generate keypair: {0}")]
    KeyGeneration(String),

    /// Failed to parse private key.
    #[error("failed to parse private key: {0}")]
    InvalidPrivateKey(String),

    /// Failed to parse public key.
    #[error("failed to parse public key: {0}")]
    InvalidPublicKey(String),

    /// The underlying signature primitive failed.
    #[error("failed to sign token: {0}")]
    Signing(String),

    /// The token is malformed or its claims do not form exactly one known shape.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The token was not signed by the paired key.
    #[error("token signature rejected: {0}")]
    Signature(String),

    /// A user token past its expiry.
    #[error("token has expired at {expired_at}")]
    Expired { expired_at: String },

    /// Stored device key material cannot be decoded.
    #[error("malformed stored key: {0}")]
    KeyFormat(String),

    /// IO error (reading/writing keys).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TokenError {
    /// Whether the error is the presenter's fault rather than ours.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken(_) | Self::Signature(_) | Self::Expired { .. }
        )
    }
}
