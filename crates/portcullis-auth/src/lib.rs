//! # portcullis-auth
//!
//! The multi-principal authentication core:
//!
//! - [`AuthService`]: device enrollment, password login, namespace switch,
//!   API token bearers, device keys and challenge signing
//! - the authorization gate ([`AuthService::authenticate`]) that turns a
//!   bearer into a [`RequestContext`] carrying an explicit tenant scope
//! - [`TokenLifecycle`] for namespace API tokens
//! - [`Directory`] for tenant-scoped reads and writes
//!
//! Every failure is an [`AuthError`].

pub mod api;
pub mod challenge;
pub mod context;
pub mod directory;
pub mod error;
mod gate;
pub mod lifecycle;
pub mod password;
pub mod service;

pub use context::RequestContext;
pub use directory::Directory;
pub use error::AuthError;
pub use lifecycle::TokenLifecycle;
pub use service::{AuthService, IssuancePolicy};
