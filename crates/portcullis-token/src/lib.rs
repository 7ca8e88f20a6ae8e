//! # portcullis-token
//!
//! Signed bearer tokens for the three Portcullis principal kinds.
//!
//! This crate provides:
//! - The process-wide Ed25519 [`KeyPair`], loaded once at startup
//! - The closed [`Claims`] model (device, user, API token)
//! - [`TokenSigner`] / [`TokenVerifier`] over Biscuit tokens
//!
//! ## Token kinds
//!
//! | Kind | Principal | Lifetime |
//! |------|-----------|----------|
//! | `device` | fingerprint | Non-expiring, reissued on every connect |
//! | `user` | id, username, tenant, admin | Expires (72h by default) |
//! | `token` | API token id, tenant, read-only | Non-expiring, revocable |
//!
//! Every claim lives in the authority block as a Datalog fact. Tokens are
//! never attenuated: a token with more than one block is rejected.

pub mod claims;
pub mod error;
pub mod keys;
pub mod token;

pub use biscuit_auth::PublicKey;
pub use claims::{ApiTokenPrincipal, Claims, ClaimsKind, DevicePrincipal, Principal, UserPrincipal};
pub use error::TokenError;
pub use keys::KeyPair;
pub use token::{TokenSigner, TokenVerifier};
