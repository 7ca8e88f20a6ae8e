//! In-memory store.
//!
//! All tables sit behind one lock, so every trait call is atomic and the
//! device upsert cannot produce two records for one fingerprint.

use crate::{Store, StoreError};
use chrono::Utc;
use portcullis_core::{
    Device, DeviceIdentity, DeviceStatus, Fingerprint, Namespace, NamespaceToken,
    PrivateKeyRecord, PublicKeyRecord, PublicKeyUpdate, Session, TenantScope, User,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    devices: HashMap<Fingerprint, Device>,
    sessions: HashMap<String, Session>,
    users: HashMap<String, User>,
    /// Keyed by tenant id; ordered so member lookups are deterministic.
    namespaces: BTreeMap<String, Namespace>,
    private_keys: HashMap<String, PrivateKeyRecord>,
    /// Keyed by (tenant id, fingerprint).
    public_keys: BTreeMap<(String, String), PublicKeyRecord>,
}

impl Tables {
    fn namespace_mut(&mut self, tenant_id: &str) -> Result<&mut Namespace, StoreError> {
        self.namespaces
            .get_mut(tenant_id)
            .ok_or_else(|| StoreError::not_found("namespace", tenant_id))
    }
}

/// A [`Store`] held entirely in process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn upsert_device(
        &self,
        fingerprint: &Fingerprint,
        identity: &DeviceIdentity,
    ) -> Result<Device, StoreError> {
        let mut tables = self.write()?;
        let now = Utc::now();

        let device = tables
            .devices
            .entry(fingerprint.clone())
            .and_modify(|device| device.last_seen = now)
            .or_insert_with(|| {
                tracing::debug!(fingerprint = %fingerprint, tenant = %identity.tenant_id, "Inserting new device");
                Device {
                    uid: fingerprint.clone(),
                    name: identity.default_name(),
                    identity: identity.clone(),
                    tenant_id: identity.tenant_id.clone(),
                    status: DeviceStatus::Pending,
                    online: false,
                    last_seen: now,
                    created_at: now,
                }
            });
        Ok(device.clone())
    }

    async fn set_device_online(&self, uid: &Fingerprint, online: bool) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let device = tables
            .devices
            .get_mut(uid)
            .ok_or_else(|| StoreError::not_found("device", uid.as_str()))?;
        device.online = online;
        device.last_seen = Utc::now();
        Ok(())
    }

    async fn device_tenant(&self, uid: &Fingerprint) -> Result<String, StoreError> {
        self.read()?
            .devices
            .get(uid)
            .map(|device| device.tenant_id.clone())
            .ok_or_else(|| StoreError::not_found("device", uid.as_str()))
    }

    async fn get_device(
        &self,
        scope: &TenantScope,
        uid: &Fingerprint,
    ) -> Result<Device, StoreError> {
        self.read()?
            .devices
            .get(uid)
            .filter(|device| scope.admits(&device.tenant_id))
            .cloned()
            .ok_or_else(|| StoreError::not_found("device", uid.as_str()))
    }

    async fn list_devices(&self, scope: &TenantScope) -> Result<Vec<Device>, StoreError> {
        let mut devices: Vec<Device> = self
            .read()?
            .devices
            .values()
            .filter(|device| scope.admits(&device.tenant_id))
            .cloned()
            .collect();
        devices.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(devices)
    }

    async fn update_device_status(
        &self,
        scope: &TenantScope,
        uid: &Fingerprint,
        status: DeviceStatus,
    ) -> Result<Device, StoreError> {
        let mut tables = self.write()?;
        let device = tables
            .devices
            .get_mut(uid)
            .filter(|device| scope.admits(&device.tenant_id))
            .ok_or_else(|| StoreError::not_found("device", uid.as_str()))?;
        device.status = status;
        Ok(device.clone())
    }

    async fn create_session(&self, session: Session) -> Result<Session, StoreError> {
        let mut tables = self.write()?;
        if tables.sessions.contains_key(&session.uid) {
            return Err(StoreError::duplicate("session", session.uid));
        }
        tables.sessions.insert(session.uid.clone(), session.clone());
        Ok(session)
    }

    async fn keep_alive_session(&self, scope: &TenantScope, uid: &str) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let session = tables
            .sessions
            .get_mut(uid)
            .filter(|session| scope.admits(&session.tenant_id))
            .ok_or_else(|| StoreError::not_found("session", uid))?;
        session.last_seen = Utc::now();
        Ok(())
    }

    async fn get_session(&self, scope: &TenantScope, uid: &str) -> Result<Session, StoreError> {
        self.read()?
            .sessions
            .get(uid)
            .filter(|session| scope.admits(&session.tenant_id))
            .cloned()
            .ok_or_else(|| StoreError::not_found("session", uid))
    }

    async fn list_sessions(&self, scope: &TenantScope) -> Result<Vec<Session>, StoreError> {
        let mut sessions: Vec<Session> = self
            .read()?
            .sessions
            .values()
            .filter(|session| scope.admits(&session.tenant_id))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        Ok(sessions)
    }

    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        let mut tables = self.write()?;
        if tables.users.contains_key(&user.id) {
            return Err(StoreError::duplicate("user", user.id));
        }
        for existing in tables.users.values() {
            if existing.username == user.username {
                return Err(StoreError::duplicate("user", user.username));
            }
            if existing.email == user.email {
                return Err(StoreError::duplicate("user", user.email));
            }
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.read()?
            .users
            .values()
            .find(|user| user.username == username)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", username))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.read()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", email))
    }

    async fn get_user_by_id(&self, id: &str) -> Result<User, StoreError> {
        self.read()?
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn create_namespace(&self, namespace: Namespace) -> Result<Namespace, StoreError> {
        let mut tables = self.write()?;
        if tables.namespaces.contains_key(&namespace.tenant_id) {
            return Err(StoreError::duplicate("namespace", namespace.tenant_id));
        }
        if tables.namespaces.values().any(|ns| ns.name == namespace.name) {
            return Err(StoreError::duplicate("namespace", namespace.name));
        }
        tables
            .namespaces
            .insert(namespace.tenant_id.clone(), namespace.clone());
        Ok(namespace)
    }

    async fn get_namespace(&self, tenant_id: &str) -> Result<Namespace, StoreError> {
        self.read()?
            .namespaces
            .get(tenant_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("namespace", tenant_id))
    }

    async fn get_namespace_by_name(&self, name: &str) -> Result<Namespace, StoreError> {
        self.read()?
            .namespaces
            .values()
            .find(|ns| ns.name == name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("namespace", name))
    }

    async fn find_namespace_for_member(
        &self,
        user_id: &str,
    ) -> Result<Option<Namespace>, StoreError> {
        Ok(self
            .read()?
            .namespaces
            .values()
            .find(|ns| ns.has_member(user_id))
            .cloned())
    }

    async fn add_member(&self, tenant_id: &str, user_id: &str) -> Result<Namespace, StoreError> {
        let mut tables = self.write()?;
        let namespace = tables.namespace_mut(tenant_id)?;
        if !namespace.members.insert(user_id.to_string()) {
            return Err(StoreError::duplicate("member", user_id));
        }
        Ok(namespace.clone())
    }

    async fn remove_member(
        &self,
        tenant_id: &str,
        user_id: &str,
    ) -> Result<Namespace, StoreError> {
        let mut tables = self.write()?;
        let namespace = tables.namespace_mut(tenant_id)?;
        if !namespace.members.remove(user_id) {
            return Err(StoreError::not_found("member", user_id));
        }
        Ok(namespace.clone())
    }

    async fn create_private_key(&self, record: PrivateKeyRecord) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.private_keys.contains_key(&record.fingerprint) {
            return Err(StoreError::duplicate("private key", record.fingerprint));
        }
        tables
            .private_keys
            .insert(record.fingerprint.clone(), record);
        Ok(())
    }

    async fn get_private_key(&self, fingerprint: &str) -> Result<PrivateKeyRecord, StoreError> {
        self.read()?
            .private_keys
            .get(fingerprint)
            .cloned()
            .ok_or_else(|| StoreError::not_found("private key", fingerprint))
    }

    async fn create_public_key(
        &self,
        record: PublicKeyRecord,
    ) -> Result<PublicKeyRecord, StoreError> {
        let mut tables = self.write()?;
        let key = (record.tenant_id.clone(), record.fingerprint.clone());
        if tables.public_keys.contains_key(&key) {
            return Err(StoreError::duplicate("public key", record.fingerprint));
        }
        tables.public_keys.insert(key, record.clone());
        Ok(record)
    }

    async fn get_public_key(
        &self,
        scope: &TenantScope,
        fingerprint: &str,
    ) -> Result<PublicKeyRecord, StoreError> {
        self.read()?
            .public_keys
            .values()
            .find(|key| key.fingerprint == fingerprint && scope.admits(&key.tenant_id))
            .cloned()
            .ok_or_else(|| StoreError::not_found("public key", fingerprint))
    }

    async fn list_public_keys(
        &self,
        scope: &TenantScope,
    ) -> Result<Vec<PublicKeyRecord>, StoreError> {
        Ok(self
            .read()?
            .public_keys
            .values()
            .filter(|key| scope.admits(&key.tenant_id))
            .cloned()
            .collect())
    }

    async fn update_public_key(
        &self,
        scope: &TenantScope,
        fingerprint: &str,
        update: PublicKeyUpdate,
    ) -> Result<PublicKeyRecord, StoreError> {
        let mut tables = self.write()?;
        let record = tables
            .public_keys
            .values_mut()
            .find(|key| key.fingerprint == fingerprint && scope.admits(&key.tenant_id))
            .ok_or_else(|| StoreError::not_found("public key", fingerprint))?;
        record.name = update.name;
        Ok(record.clone())
    }

    async fn delete_public_key(
        &self,
        scope: &TenantScope,
        fingerprint: &str,
    ) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let key = tables
            .public_keys
            .keys()
            .find(|(tenant, fp)| fp == fingerprint && scope.admits(tenant))
            .cloned()
            .ok_or_else(|| StoreError::not_found("public key", fingerprint))?;
        tables.public_keys.remove(&key);
        Ok(())
    }

    async fn create_namespace_token(
        &self,
        tenant_id: &str,
        token: NamespaceToken,
    ) -> Result<NamespaceToken, StoreError> {
        let mut tables = self.write()?;
        let namespace = tables.namespace_mut(tenant_id)?;
        if namespace.api_token.is_some() {
            return Err(StoreError::duplicate("api token", tenant_id));
        }
        namespace.api_token = Some(token.clone());
        Ok(token)
    }

    async fn get_namespace_token(&self, tenant_id: &str) -> Result<NamespaceToken, StoreError> {
        self.read()?
            .namespaces
            .get(tenant_id)
            .ok_or_else(|| StoreError::not_found("namespace", tenant_id))?
            .api_token
            .clone()
            .ok_or_else(|| StoreError::not_found("api token", tenant_id))
    }

    async fn delete_namespace_token(&self, tenant_id: &str) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables
            .namespace_mut(tenant_id)?
            .api_token
            .take()
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("api token", tenant_id))
    }

    async fn toggle_namespace_token_read_only(
        &self,
        tenant_id: &str,
    ) -> Result<NamespaceToken, StoreError> {
        let mut tables = self.write()?;
        let token = tables
            .namespace_mut(tenant_id)?
            .api_token
            .as_mut()
            .ok_or_else(|| StoreError::not_found("api token", tenant_id))?;
        token.read_only = !token.read_only;
        Ok(token.clone())
    }
}
