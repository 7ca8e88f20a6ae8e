//! # portcullis-core
//!
//! Types shared by every Portcullis crate:
//!
//! - the persisted records the authentication core reads and writes
//!   (devices, sessions, users, namespaces, namespace API tokens, device
//!   keys, registered public keys)
//! - the [`fingerprint`] deriver used for device identities and API token ids
//! - [`TenantScope`], the filter every data-access call is evaluated under
//! - the unified [`PortcullisConfig`]

pub mod config;
pub mod fingerprint;
pub mod models;
pub mod scope;

pub use config::{AuditConfig, AuthConfig, ConfigError, KeyConfig, PortcullisConfig, ServerConfig};
pub use fingerprint::Fingerprint;
pub use models::{
    Device, DeviceIdentity, DeviceStatus, Namespace, NamespaceToken, PrivateKeyRecord,
    PublicKeyRecord, PublicKeyUpdate, Session, User,
};
pub use scope::TenantScope;
