//! Shared fixtures for the authentication integration tests.

#![allow(dead_code)]

use portcullis_audit::{AuditLogger, MemoryStorage};
use portcullis_auth::password;
use portcullis_auth::{AuthService, Directory, IssuancePolicy, TokenLifecycle};
use portcullis_core::{AuditConfig, Namespace, User};
use portcullis_store::{MemoryStore, Store};
use portcullis_token::{KeyPair, TokenSigner};
use std::sync::Arc;

pub const ALICE_PASSWORD: &str = "correct horse battery staple";

/// A wired-up core over an in-memory store.
///
/// Seeds users `alice` (owner of `acme`/`t1`), `bob` (owner of `globex`/`t2`)
/// and `carol` (no namespace).
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub auth: AuthService,
    pub lifecycle: TokenLifecycle,
    pub directory: Directory,
    pub audit: Arc<AuditLogger>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_policy(IssuancePolicy::default()).await
    }

    pub async fn with_policy(policy: IssuancePolicy) -> Self {
        let store = Arc::new(MemoryStore::new());
        let audit = Arc::new(AuditLogger::with_storage(
            AuditConfig::default(),
            Arc::new(MemoryStorage::new()),
        ));
        let signer = TokenSigner::new(KeyPair::generate().unwrap());

        seed(store.as_ref()).await;

        let dyn_store: Arc<dyn Store> = store.clone();
        Self {
            auth: AuthService::new(dyn_store.clone(), signer, policy, audit.clone()),
            lifecycle: TokenLifecycle::new(dyn_store.clone(), audit.clone()),
            directory: Directory::new(dyn_store),
            store,
            audit,
        }
    }
}

/// Default policy with `alice` as the only operator.
pub fn operator_policy() -> IssuancePolicy {
    IssuancePolicy {
        operators: ["alice".to_string()].into(),
        ..Default::default()
    }
}

pub fn user(id: &str, username: &str, password: &str) -> User {
    User {
        id: id.to_string(),
        name: username.to_uppercase(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_digest: password::digest(password),
    }
}

async fn seed(store: &MemoryStore) {
    store
        .create_user(user("u-alice", "alice", ALICE_PASSWORD))
        .await
        .unwrap();
    store.create_user(user("u-bob", "bob", "bobpass")).await.unwrap();
    store
        .create_user(user("u-carol", "carol", "carolpass"))
        .await
        .unwrap();

    store
        .create_namespace(Namespace::new("acme", "u-alice", "t1"))
        .await
        .unwrap();
    store
        .create_namespace(Namespace::new("globex", "u-bob", "t2"))
        .await
        .unwrap();
}
