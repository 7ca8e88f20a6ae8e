//! Persisted records.
//!
//! Only the fields the authentication core reads or writes are modelled here.
//! Every tenant-owned record (device, session) carries exactly one
//! `tenant_id`.

use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Attributes a device declares when it enrolls.
///
/// A fingerprint is derived from these attributes, so re-enrolling with an
/// identical identity lands on the same device record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Hardware identity (MAC address).
    pub mac: String,

    /// Tenant the device enrolls into.
    pub tenant_id: String,

    /// Declared hostname, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Device public key as sent by the agent, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

impl DeviceIdentity {
    /// Create an identity with only the required attributes.
    pub fn new(mac: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            tenant_id: tenant_id.into(),
            hostname: None,
            public_key: None,
        }
    }

    /// Set the declared hostname.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Name given to a device the first time it is seen.
    ///
    /// Lower-cased hostname, or the MAC address with `:` replaced by `-`.
    pub fn default_name(&self) -> String {
        match self.hostname.as_deref().map(str::trim) {
            Some(hostname) if !hostname.is_empty() => hostname.to_lowercase(),
            _ => self.mac.replace(':', "-"),
        }
    }
}

/// Approval state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// First seen, waiting for an operator decision.
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A device record, keyed by fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Fingerprint of the enrolled identity.
    pub uid: Fingerprint,
    pub name: String,
    pub identity: DeviceIdentity,
    pub tenant_id: String,
    pub status: DeviceStatus,
    pub online: bool,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A remote shell session opened against a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub device_uid: Fingerprint,
    pub tenant_id: String,
    pub username: String,
    pub active: bool,
    pub last_seen: DateTime<Utc>,
}

/// A human user.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    /// Hex-encoded SHA-256 digest of the password.
    pub password_digest: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_digest", &"[redacted]")
            .finish()
    }
}

/// A namespace (tenant): the isolation boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    /// Unique, human-readable name.
    pub name: String,
    /// User id of the owner.
    pub owner: String,
    pub tenant_id: String,
    /// User ids of the members.
    #[serde(default)]
    pub members: BTreeSet<String>,
    /// The active API token, if one has been created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<NamespaceToken>,
}

impl Namespace {
    /// Create a namespace whose only member is its owner.
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        let owner = owner.into();
        Self {
            name: name.into(),
            members: BTreeSet::from([owner.clone()]),
            owner,
            tenant_id: tenant_id.into(),
            api_token: None,
        }
    }

    /// Whether `user_id` belongs to this namespace.
    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.contains(user_id)
    }
}

/// A namespace-scoped API token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceToken {
    /// Deterministic id derived from the namespace name.
    pub id: String,
    pub tenant_id: String,
    pub read_only: bool,
    /// Random per-creation value; bearers from an earlier creation carry a
    /// different one.
    pub generation: String,
}

/// Stored private half of a device keypair.
#[derive(Clone, Serialize, Deserialize)]
pub struct PrivateKeyRecord {
    pub fingerprint: String,
    /// PKCS#8 PEM encoded private key.
    pub data: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for PrivateKeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeyRecord")
            .field("fingerprint", &self.fingerprint)
            .field("data", &"[redacted]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// A public key registered in a namespace for device public-key login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicKeyRecord {
    /// Fingerprint of the raw public key; unique within a tenant.
    pub fingerprint: String,
    pub tenant_id: String,
    pub name: String,
    /// SPKI PEM encoded public key.
    pub data: String,
    pub created_at: DateTime<Utc>,
}

/// Mutable fields of a [`PublicKeyRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicKeyUpdate {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_name_prefers_hostname() {
        let identity = DeviceIdentity::new("de:ad:be:ef", "t1").with_hostname("Web-01");
        assert_eq!(identity.default_name(), "web-01");
    }

    #[test]
    fn test_default_name_falls_back_to_mac() {
        let identity = DeviceIdentity::new("de:ad:be:ef", "t1");
        assert_eq!(identity.default_name(), "de-ad-be-ef");

        let blank = DeviceIdentity::new("de:ad:be:ef", "t1").with_hostname("  ");
        assert_eq!(blank.default_name(), "de-ad-be-ef");
    }

    #[test]
    fn test_device_status_wire_form() {
        assert_eq!(
            serde_json::to_string(&DeviceStatus::Accepted).unwrap(),
            "\"accepted\""
        );
        let status: DeviceStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(status, DeviceStatus::Rejected);
    }

    #[test]
    fn test_namespace_owner_is_member() {
        let ns = Namespace::new("acme", "u1", "t1");
        assert!(ns.has_member("u1"));
        assert!(!ns.has_member("u2"));
    }

    #[test]
    fn test_user_debug_redacts_digest() {
        let user = User {
            id: "u1".into(),
            name: "Alice".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_digest: "deadbeef".into(),
        };
        let printed = format!("{:?}", user);
        assert!(!printed.contains("deadbeef"));
    }
}
