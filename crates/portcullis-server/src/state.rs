//! Shared application state.

use anyhow::Context;
use portcullis_audit::AuditLogger;
use portcullis_auth::{AuthService, Directory, IssuancePolicy, TokenLifecycle};
use portcullis_core::PortcullisConfig;
use portcullis_store::{MemoryStore, Store};
use portcullis_token::{KeyPair, TokenSigner};
use std::sync::Arc;

/// Everything a handler needs, shared behind an `Arc`.
pub struct AppState {
    pub auth: AuthService,
    pub lifecycle: TokenLifecycle,
    pub directory: Directory,
}

impl AppState {
    /// Wire the core from configuration.
    ///
    /// A missing or malformed signing key is fatal.
    pub fn from_config(config: &PortcullisConfig) -> anyhow::Result<Arc<Self>> {
        let keypair =
            KeyPair::from_config(&config.keys).context("failed to load the signing keypair")?;
        let policy = IssuancePolicy::from_config(&config.auth)?;
        let audit = AuditLogger::new(config.audit.clone()).context("failed to open audit log")?;
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

        Ok(Self::build(store, keypair, policy, audit))
    }

    pub fn build(
        store: Arc<dyn Store>,
        keypair: KeyPair,
        policy: IssuancePolicy,
        audit: AuditLogger,
    ) -> Arc<Self> {
        let audit = Arc::new(audit);
        Arc::new(Self {
            auth: AuthService::new(store.clone(), TokenSigner::new(keypair), policy, audit.clone()),
            lifecycle: TokenLifecycle::new(store.clone(), audit),
            directory: Directory::new(store),
        })
    }
}
