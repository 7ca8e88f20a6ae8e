//! The Store trait that backends implement.

use crate::StoreError;
use portcullis_core::{
    Device, DeviceIdentity, DeviceStatus, Fingerprint, Namespace, NamespaceToken,
    PrivateKeyRecord, PublicKeyRecord, PublicKeyUpdate, Session, TenantScope, User,
};

/// The storage contract the authentication core depends on.
///
/// Every call is atomic at the single-record level. Calls on tenant-owned
/// records (devices, sessions) take the [`TenantScope`] resolved for the
/// request and behave as if records outside it do not exist.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────────────── Devices ────────────────────────────────────────

    /// Insert the device keyed by `fingerprint`, or refresh its liveness.
    ///
    /// A first insert sets the status to pending and the name to the identity's
    /// default name. Concurrent first inserts converge on one record.
    async fn upsert_device(
        &self,
        fingerprint: &Fingerprint,
        identity: &DeviceIdentity,
    ) -> Result<Device, StoreError>;

    /// Mark a device online or offline.
    async fn set_device_online(&self, uid: &Fingerprint, online: bool) -> Result<(), StoreError>;

    /// Tenant of the device keyed by `uid`.
    ///
    /// Used to resolve device bearers before any scope exists. Exposes only
    /// the tenant id, never the record.
    async fn device_tenant(&self, uid: &Fingerprint) -> Result<String, StoreError>;

    /// Get a device visible under `scope`.
    async fn get_device(&self, scope: &TenantScope, uid: &Fingerprint)
    -> Result<Device, StoreError>;

    /// List the devices visible under `scope`.
    async fn list_devices(&self, scope: &TenantScope) -> Result<Vec<Device>, StoreError>;

    /// Change the approval status of a device visible under `scope`.
    async fn update_device_status(
        &self,
        scope: &TenantScope,
        uid: &Fingerprint,
        status: DeviceStatus,
    ) -> Result<Device, StoreError>;

    // ───────────────────────────────────── Sessions ───────────────────────────────────────

    /// Create a session.
    async fn create_session(&self, session: Session) -> Result<Session, StoreError>;

    /// Refresh the liveness of a session visible under `scope`.
    async fn keep_alive_session(&self, scope: &TenantScope, uid: &str) -> Result<(), StoreError>;

    /// Get a session visible under `scope`.
    async fn get_session(&self, scope: &TenantScope, uid: &str) -> Result<Session, StoreError>;

    /// List the sessions visible under `scope`.
    async fn list_sessions(&self, scope: &TenantScope) -> Result<Vec<Session>, StoreError>;

    // ───────────────────────────────────── Users ──────────────────────────────────────────

    /// Create a user. Usernames and emails are unique.
    async fn create_user(&self, user: User) -> Result<User, StoreError>;

    async fn get_user_by_username(&self, username: &str) -> Result<User, StoreError>;

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    async fn get_user_by_id(&self, id: &str) -> Result<User, StoreError>;

    // ───────────────────────────────────── Namespaces ─────────────────────────────────────

    /// Create a namespace. Names and tenant ids are unique.
    async fn create_namespace(&self, namespace: Namespace) -> Result<Namespace, StoreError>;

    /// Get a namespace by tenant id.
    async fn get_namespace(&self, tenant_id: &str) -> Result<Namespace, StoreError>;

    /// Get a namespace by its unique name.
    async fn get_namespace_by_name(&self, name: &str) -> Result<Namespace, StoreError>;

    /// Some namespace `user_id` belongs to, if any.
    async fn find_namespace_for_member(
        &self,
        user_id: &str,
    ) -> Result<Option<Namespace>, StoreError>;

    /// Add a member. `Duplicate` if already a member.
    async fn add_member(&self, tenant_id: &str, user_id: &str) -> Result<Namespace, StoreError>;

    /// Remove a member. `NotFound` if not a member.
    async fn remove_member(&self, tenant_id: &str, user_id: &str)
    -> Result<Namespace, StoreError>;

    // ───────────────────────────────────── Device keys ────────────────────────────────────

    /// Store a device private key. `Duplicate` on fingerprint collision.
    async fn create_private_key(&self, record: PrivateKeyRecord) -> Result<(), StoreError>;

    async fn get_private_key(&self, fingerprint: &str) -> Result<PrivateKeyRecord, StoreError>;

    // ───────────────────────────────────── Public keys ────────────────────────────────────

    /// Register a public key. `Duplicate` if the tenant already has the
    /// fingerprint.
    async fn create_public_key(
        &self,
        record: PublicKeyRecord,
    ) -> Result<PublicKeyRecord, StoreError>;

    /// Get a public key visible under `scope`.
    async fn get_public_key(
        &self,
        scope: &TenantScope,
        fingerprint: &str,
    ) -> Result<PublicKeyRecord, StoreError>;

    /// List the public keys visible under `scope`.
    async fn list_public_keys(&self, scope: &TenantScope)
    -> Result<Vec<PublicKeyRecord>, StoreError>;

    /// Update a public key visible under `scope`.
    async fn update_public_key(
        &self,
        scope: &TenantScope,
        fingerprint: &str,
        update: PublicKeyUpdate,
    ) -> Result<PublicKeyRecord, StoreError>;

    /// Delete a public key visible under `scope`.
    async fn delete_public_key(&self, scope: &TenantScope, fingerprint: &str)
    -> Result<(), StoreError>;

    // ───────────────────────────────────── Namespace tokens ───────────────────────────────

    /// Set the namespace's API token. `Duplicate` if one is already active.
    async fn create_namespace_token(
        &self,
        tenant_id: &str,
        token: NamespaceToken,
    ) -> Result<NamespaceToken, StoreError>;

    /// The namespace's active API token.
    async fn get_namespace_token(&self, tenant_id: &str) -> Result<NamespaceToken, StoreError>;

    /// Remove the namespace's active API token.
    async fn delete_namespace_token(&self, tenant_id: &str) -> Result<(), StoreError>;

    /// Flip the read-only flag of the namespace's active API token.
    async fn toggle_namespace_token_read_only(
        &self,
        tenant_id: &str,
    ) -> Result<NamespaceToken, StoreError>;
}
