//! Tenant-scoped reads and writes on behalf of an authenticated request.

use chrono::Utc;
use portcullis_core::{
    Device, DeviceStatus, Fingerprint, Namespace, PublicKeyRecord, PublicKeyUpdate, Session,
    TenantScope,
};
use portcullis_store::Store;
use std::sync::Arc;

use crate::api::PublicKeyRequest;
use crate::challenge;
use crate::context::RequestContext;
use crate::error::AuthError;

/// Data access that always runs under the request's scope.
pub struct Directory {
    store: Arc<dyn Store>,
}

impl Directory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list_devices(&self, ctx: &RequestContext) -> Result<Vec<Device>, AuthError> {
        Ok(self.store.list_devices(ctx.scope()).await?)
    }

    pub async fn get_device(
        &self,
        ctx: &RequestContext,
        uid: &Fingerprint,
    ) -> Result<Device, AuthError> {
        Ok(self.store.get_device(ctx.scope(), uid).await?)
    }

    pub async fn update_device_status(
        &self,
        ctx: &RequestContext,
        uid: &Fingerprint,
        status: DeviceStatus,
    ) -> Result<Device, AuthError> {
        ctx.require_write()?;
        let device = self
            .store
            .update_device_status(ctx.scope(), uid, status)
            .await?;
        tracing::info!(principal = %ctx.label(), fingerprint = %uid, status = %status, "Updated device status");
        Ok(device)
    }

    pub async fn list_sessions(&self, ctx: &RequestContext) -> Result<Vec<Session>, AuthError> {
        Ok(self.store.list_sessions(ctx.scope()).await?)
    }

    pub async fn get_session(&self, ctx: &RequestContext, uid: &str) -> Result<Session, AuthError> {
        Ok(self.store.get_session(ctx.scope(), uid).await?)
    }

    pub async fn list_public_keys(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<PublicKeyRecord>, AuthError> {
        Ok(self.store.list_public_keys(ctx.scope()).await?)
    }

    pub async fn get_public_key(
        &self,
        ctx: &RequestContext,
        fingerprint: &str,
    ) -> Result<PublicKeyRecord, AuthError> {
        Ok(self.store.get_public_key(ctx.scope(), fingerprint).await?)
    }

    /// Register a public key in the caller's namespace.
    ///
    /// The fingerprint is derived from the key itself.
    pub async fn create_public_key(
        &self,
        ctx: &RequestContext,
        req: PublicKeyRequest,
    ) -> Result<PublicKeyRecord, AuthError> {
        ctx.require_write()?;
        let tenant_id = ctx
            .scope()
            .tenant_id()
            .ok_or_else(|| AuthError::validation("public keys belong to a namespace"))?;
        if req.name.trim().is_empty() {
            return Err(AuthError::validation("public key requires a name"));
        }
        let fingerprint = challenge::public_key_fingerprint(&req.data)?;

        let record = self
            .store
            .create_public_key(PublicKeyRecord {
                fingerprint: fingerprint.to_string(),
                tenant_id: tenant_id.to_string(),
                name: req.name.trim().to_string(),
                data: req.data,
                created_at: Utc::now(),
            })
            .await?;
        tracing::info!(principal = %ctx.label(), fingerprint = %record.fingerprint, tenant = %tenant_id, "Registered public key");
        Ok(record)
    }

    pub async fn update_public_key(
        &self,
        ctx: &RequestContext,
        fingerprint: &str,
        update: PublicKeyUpdate,
    ) -> Result<PublicKeyRecord, AuthError> {
        ctx.require_write()?;
        if update.name.trim().is_empty() {
            return Err(AuthError::validation("public key requires a name"));
        }
        Ok(self
            .store
            .update_public_key(ctx.scope(), fingerprint, update)
            .await?)
    }

    pub async fn delete_public_key(
        &self,
        ctx: &RequestContext,
        fingerprint: &str,
    ) -> Result<(), AuthError> {
        ctx.require_write()?;
        self.store.delete_public_key(ctx.scope(), fingerprint).await?;
        tracing::info!(principal = %ctx.label(), fingerprint = %fingerprint, "Deleted public key");
        Ok(())
    }

    /// Public key lookup for a gateway that knows the target tenant.
    pub async fn lookup_public_key(
        &self,
        fingerprint: &str,
        tenant_id: &str,
    ) -> Result<PublicKeyRecord, AuthError> {
        Ok(self
            .store
            .get_public_key(&TenantScope::tenant(tenant_id), fingerprint)
            .await?)
    }

    /// Add `username` to a namespace the caller can see.
    pub async fn add_member(
        &self,
        ctx: &RequestContext,
        namespace_name: &str,
        username: &str,
    ) -> Result<Namespace, AuthError> {
        let (namespace, user_id) = self.resolve_membership(ctx, namespace_name, username).await?;
        let namespace = self.store.add_member(&namespace.tenant_id, &user_id).await?;
        tracing::info!(namespace = %namespace.name, username = %username, "Added namespace member");
        Ok(namespace)
    }

    /// Remove `username` from a namespace the caller can see.
    pub async fn remove_member(
        &self,
        ctx: &RequestContext,
        namespace_name: &str,
        username: &str,
    ) -> Result<Namespace, AuthError> {
        let (namespace, user_id) = self.resolve_membership(ctx, namespace_name, username).await?;
        if user_id == namespace.owner {
            return Err(AuthError::validation("the namespace owner cannot be removed"));
        }
        let namespace = self
            .store
            .remove_member(&namespace.tenant_id, &user_id)
            .await?;
        tracing::info!(namespace = %namespace.name, username = %username, "Removed namespace member");
        Ok(namespace)
    }

    async fn resolve_membership(
        &self,
        ctx: &RequestContext,
        namespace_name: &str,
        username: &str,
    ) -> Result<(Namespace, String), AuthError> {
        ctx.require_user()?;
        ctx.require_write()?;

        let namespace = self.store.get_namespace_by_name(namespace_name).await?;
        if !ctx.scope().admits(&namespace.tenant_id) {
            // Indistinguishable from a missing namespace.
            return Err(AuthError::NotFound {
                entity: "namespace",
                key: namespace_name.to_string(),
            });
        }
        let user = self
            .store
            .get_user_by_username(&username.trim().to_lowercase())
            .await?;
        Ok((namespace, user.id))
    }
}
