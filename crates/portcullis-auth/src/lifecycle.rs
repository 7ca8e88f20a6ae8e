//! Namespace API token lifecycle.

use portcullis_audit::{AuditEventType, AuditLogger};
use portcullis_core::{Namespace, NamespaceToken, fingerprint};
use portcullis_store::{Store, StoreError};
use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::AuthError;

/// Issues, inspects, revokes and toggles namespace API tokens.
pub struct TokenLifecycle {
    store: Arc<dyn Store>,
    audit: Arc<AuditLogger>,
}

impl TokenLifecycle {
    pub fn new(store: Arc<dyn Store>, audit: Arc<AuditLogger>) -> Self {
        Self { store, audit }
    }

    /// Create the namespace's API token, read-only by default.
    ///
    /// The id is derived from the namespace name, so recreating a deleted
    /// token yields the same id. Each creation gets a fresh generation, so
    /// bearers issued before a delete stay revoked.
    pub async fn create_token(&self, namespace_name: &str) -> Result<NamespaceToken, AuthError> {
        let namespace = match self.store.get_namespace_by_name(namespace_name).await {
            Ok(ns) => ns,
            Err(StoreError::NotFound { .. }) => {
                return Err(AuthError::unauthorized(format!(
                    "namespace {namespace_name} does not exist"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let token = NamespaceToken {
            id: fingerprint::derive_api_token_id(&namespace.name),
            tenant_id: namespace.tenant_id.clone(),
            read_only: true,
            generation: hex::encode(rand::random::<[u8; 16]>()),
        };
        let token = self
            .store
            .create_namespace_token(&namespace.tenant_id, token)
            .await?;

        tracing::info!(namespace = %namespace.name, tenant = %namespace.tenant_id, "Created API token");
        self.record(AuditEventType::ApiTokenCreated, &token, "createToken")
            .await;
        Ok(token)
    }

    pub async fn get_token(&self, namespace_name: &str) -> Result<NamespaceToken, AuthError> {
        let namespace = self.store.get_namespace_by_name(namespace_name).await?;
        Ok(self.store.get_namespace_token(&namespace.tenant_id).await?)
    }

    pub async fn delete_token(&self, namespace_name: &str) -> Result<(), AuthError> {
        let namespace = self.store.get_namespace_by_name(namespace_name).await?;
        let token = self.store.get_namespace_token(&namespace.tenant_id).await?;
        self.store.delete_namespace_token(&namespace.tenant_id).await?;

        tracing::info!(namespace = %namespace.name, tenant = %namespace.tenant_id, "Deleted API token");
        self.record(AuditEventType::ApiTokenDeleted, &token, "deleteToken")
            .await;
        Ok(())
    }

    /// Flip the active token between read-only and read-write.
    pub async fn change_permission(
        &self,
        namespace_name: &str,
    ) -> Result<NamespaceToken, AuthError> {
        let namespace = self.store.get_namespace_by_name(namespace_name).await?;
        let token = self
            .store
            .toggle_namespace_token_read_only(&namespace.tenant_id)
            .await?;

        tracing::info!(namespace = %namespace.name, read_only = token.read_only, "Changed API token permission");
        self.record(
            AuditEventType::ApiTokenPermissionChanged,
            &token,
            "changePermission",
        )
        .await;
        Ok(token)
    }

    /// Check that `ctx` may manage the API token of `namespace_name`.
    ///
    /// A missing namespace passes, so the operation itself reports it.
    pub async fn authorize(
        &self,
        ctx: &RequestContext,
        namespace_name: &str,
    ) -> Result<(), AuthError> {
        ctx.require_user()?;
        ctx.require_write()?;

        match self.store.get_namespace_by_name(namespace_name).await {
            Ok(Namespace { tenant_id, .. }) if !ctx.scope().admits(&tenant_id) => Err(
                AuthError::unauthorized(format!("namespace {namespace_name} is outside your scope")),
            ),
            Ok(_) | Err(StoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn record(&self, event_type: AuditEventType, token: &NamespaceToken, action: &str) {
        self.audit
            .log_issued(
                event_type,
                &format!("token:{}", token.id),
                &token.tenant_id,
                action,
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_store::MemoryStore;
    use pretty_assertions::assert_eq;

    async fn lifecycle() -> TokenLifecycle {
        let store = Arc::new(MemoryStore::new());
        store
            .create_namespace(Namespace::new("acme", "u1", "t1"))
            .await
            .unwrap();
        TokenLifecycle::new(store, Arc::new(AuditLogger::disabled()))
    }

    #[tokio::test]
    async fn test_create_is_read_only_and_deterministic() {
        let lifecycle = lifecycle().await;

        let first = lifecycle.create_token("acme").await.unwrap();
        assert!(first.read_only);
        assert_eq!(first.tenant_id, "t1");

        lifecycle.delete_token("acme").await.unwrap();
        let second = lifecycle.create_token("acme").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.id, fingerprint::derive_api_token_id("acme"));
        assert_ne!(first.generation, second.generation);
    }

    #[tokio::test]
    async fn test_missing_namespace_errors() {
        let lifecycle = lifecycle().await;

        assert!(matches!(
            lifecycle.create_token("ghost").await,
            Err(AuthError::Unauthorized(_))
        ));
        assert!(matches!(
            lifecycle.get_token("ghost").await,
            Err(AuthError::NotFound { .. })
        ));
        assert!(matches!(
            lifecycle.delete_token("ghost").await,
            Err(AuthError::NotFound { .. })
        ));
        assert!(matches!(
            lifecycle.change_permission("ghost").await,
            Err(AuthError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_change_permission_toggles() {
        let lifecycle = lifecycle().await;
        assert!(matches!(
            lifecycle.change_permission("acme").await,
            Err(AuthError::NotFound { .. })
        ));

        lifecycle.create_token("acme").await.unwrap();
        let created = lifecycle.get_token("acme").await.unwrap();
        let toggled = lifecycle.change_permission("acme").await.unwrap();
        assert!(!toggled.read_only);
        assert_eq!(toggled.generation, created.generation);
        assert!(lifecycle.change_permission("acme").await.unwrap().read_only);
        assert!(lifecycle.get_token("acme").await.unwrap().read_only);
    }

    #[tokio::test]
    async fn test_second_create_is_duplicate() {
        let lifecycle = lifecycle().await;
        lifecycle.create_token("acme").await.unwrap();
        assert!(matches!(
            lifecycle.create_token("acme").await,
            Err(AuthError::Duplicate { .. })
        ));
    }
}
