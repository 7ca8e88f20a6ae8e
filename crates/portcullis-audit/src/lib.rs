//! # portcullis-audit
//!
//! Audit trail of authentication decisions.
//!
//! Every token issuance, rejected credential, namespace switch, challenge
//! signature, API token change and use of an unscoped (administrative)
//! context is recorded as an [`AuditEvent`].
//!
//! - **File output**: JSON Lines (one JSON object per line)
//! - **Console output**: JSON on stdout
//!
//! ## Event Types
//!
//! | Event Type | Description |
//! |------------|-------------|
//! | `DeviceEnrolled` | Device token issued on enroll or re-auth |
//! | `LoginSucceeded` / `LoginFailed` | Password login outcome |
//! | `TokenReissued` | User token issued without a password (internal callers) |
//! | `NamespaceSwitched` / `NamespaceSwitchDenied` | Swap token outcome |
//! | `ChallengeSigned` | Device key signed a challenge |
//! | `DeviceKeyCreated` | Device keypair provisioned |
//! | `ApiToken*` | Namespace API token lifecycle |
//! | `AuthenticationFailed` | Bearer rejected by the gate |
//! | `UnscopedAccess` | Administrative context resolved |

pub mod error;
pub mod event;
pub mod logger;
pub mod storage;

pub use error::AuditError;
pub use event::{AuditEvent, AuditEventBuilder, AuditEventType};
pub use logger::{AuditFilter, AuditLogger};
pub use storage::{AuditStorage, ConsoleStorage, DualStorage, FileStorage, MemoryStorage, NullStorage};
