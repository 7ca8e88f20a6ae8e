//! Audit event types.
//!
//! Core fields follow the format: [principal - tenant - action].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // ===== Token issuance =====
    /// Device token issued on enroll or re-auth.
    DeviceEnrolled,
    /// User logged in with a password.
    LoginSucceeded,
    /// Password login rejected.
    LoginFailed,
    /// User token issued without a password check.
    TokenReissued,
    /// User token issued for another namespace.
    NamespaceSwitched,
    /// Namespace switch refused (not a member).
    NamespaceSwitchDenied,
    /// Bearer issued for a namespace API token.
    ApiTokenIssued,

    // ===== Device keys =====
    /// Device keypair provisioned.
    DeviceKeyCreated,
    /// Stored device key signed a challenge.
    ChallengeSigned,

    // ===== API token lifecycle =====
    ApiTokenCreated,
    ApiTokenDeleted,
    ApiTokenPermissionChanged,

    // ===== Gate =====
    /// Bearer rejected.
    AuthenticationFailed,
    /// Administrative (unscoped) context resolved.
    UnscopedAccess,
    /// Unscoped access refused.
    UnscopedAccessDenied,
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeviceEnrolled => write!(f, "DEVICE_ENROLLED"),
            Self::LoginSucceeded => write!(f, "LOGIN_SUCCEEDED"),
            Self::LoginFailed => write!(f, "LOGIN_FAILED"),
            Self::TokenReissued => write!(f, "TOKEN_REISSUED"),
            Self::NamespaceSwitched => write!(f, "NAMESPACE_SWITCHED"),
            Self::NamespaceSwitchDenied => write!(f, "NAMESPACE_SWITCH_DENIED"),
            Self::ApiTokenIssued => write!(f, "API_TOKEN_ISSUED"),
            Self::DeviceKeyCreated => write!(f, "DEVICE_KEY_CREATED"),
            Self::ChallengeSigned => write!(f, "CHALLENGE_SIGNED"),
            Self::ApiTokenCreated => write!(f, "API_TOKEN_CREATED"),
            Self::ApiTokenDeleted => write!(f, "API_TOKEN_DELETED"),
            Self::ApiTokenPermissionChanged => write!(f, "API_TOKEN_PERMISSION_CHANGED"),
            Self::AuthenticationFailed => write!(f, "AUTH_FAILED"),
            Self::UnscopedAccess => write!(f, "UNSCOPED_ACCESS"),
            Self::UnscopedAccessDenied => write!(f, "UNSCOPED_ACCESS_DENIED"),
        }
    }
}

/// An audit event.
///
/// Never carries passwords, digests, bearer strings or key material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: Uuid,

    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,

    /// Event type.
    pub event_type: AuditEventType,

    /// Who acted, e.g. `user:alice`, `device:<fingerprint>`, `token:<id>`.
    pub principal: String,

    /// Tenant the event happened in, if one was resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Operation name (e.g. "login", "swapNamespace").
    pub action: String,

    /// Why an unscoped context was used, or why a request was refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,

    /// Additional metadata.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub meta: serde_json::Value,
}

impl AuditEvent {
    /// Create a new audit event with the given type and core fields.
    pub fn new(
        event_type: AuditEventType,
        principal: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event_type,
            principal: principal.into(),
            tenant_id: None,
            action: action.into(),
            reason: None,
            client_ip: None,
            meta: serde_json::Value::Null,
        }
    }

    /// Create a builder for an audit event.
    pub fn builder(
        event_type: AuditEventType,
        principal: impl Into<String>,
        action: impl Into<String>,
    ) -> AuditEventBuilder {
        AuditEventBuilder::new(event_type, principal, action)
    }

    /// Whether the event records a refusal.
    pub fn is_denial(&self) -> bool {
        matches!(
            self.event_type,
            AuditEventType::LoginFailed
                | AuditEventType::NamespaceSwitchDenied
                | AuditEventType::UnscopedAccessDenied
                | AuditEventType::AuthenticationFailed
        )
    }

    /// Format the event as a human-readable log line.
    ///
    /// Format: `[timestamp] EVENT_TYPE principal=... tenant=... action=... [reason="..."]`
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "[{}] {} principal={} tenant={} action={}",
            self.occurred_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.event_type,
            self.principal,
            self.tenant_id.as_deref().unwrap_or("-"),
            self.action,
        );

        if let Some(ref reason) = self.reason {
            line.push_str(&format!(" reason=\"{}\"", reason.replace('"', "'")));
        }

        if let Some(ref ip) = self.client_ip {
            line.push_str(&format!(" client_ip={}", ip));
        }

        line
    }
}

/// Builder for creating audit events.
#[derive(Debug)]
pub struct AuditEventBuilder {
    event: AuditEvent,
}

impl AuditEventBuilder {
    /// Create a new builder with required fields.
    pub fn new(
        event_type: AuditEventType,
        principal: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            event: AuditEvent::new(event_type, principal, action),
        }
    }

    /// Set the tenant. Empty tenants are left unset.
    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        let tenant_id = tenant_id.into();
        if !tenant_id.is_empty() {
            self.event.tenant_id = Some(tenant_id);
        }
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.event.reason = Some(reason.into());
        self
    }

    pub fn client_ip(mut self, ip: impl Into<String>) -> Self {
        self.event.client_ip = Some(ip.into());
        self
    }

    /// Set additional metadata.
    pub fn meta(mut self, meta: serde_json::Value) -> Self {
        self.event.meta = meta;
        self
    }

    /// Build the audit event.
    pub fn build(self) -> AuditEvent {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = AuditEvent::builder(AuditEventType::LoginSucceeded, "user:alice", "login")
            .tenant("t1")
            .client_ip("10.0.0.1")
            .build();

        assert_eq!(event.event_type, AuditEventType::LoginSucceeded);
        assert_eq!(event.tenant_id.as_deref(), Some("t1"));
        assert_eq!(event.principal, "user:alice");
        assert!(!event.is_denial());
    }

    #[test]
    fn test_empty_tenant_is_unset() {
        let event = AuditEvent::builder(AuditEventType::LoginSucceeded, "user:bob", "login")
            .tenant("")
            .build();
        assert_eq!(event.tenant_id, None);
        assert!(event.to_log_line().contains("tenant=-"));
    }

    #[test]
    fn test_to_log_line() {
        let event = AuditEvent::builder(
            AuditEventType::UnscopedAccess,
            "user:alice",
            "listDevices",
        )
        .reason("operator \"audit\" sweep")
        .build();

        let line = event.to_log_line();
        assert!(line.contains("UNSCOPED_ACCESS"));
        assert!(line.contains("principal=user:alice"));
        assert!(line.contains("reason=\"operator 'audit' sweep\""));
    }

    #[test]
    fn test_event_serializes_as_snake_case() {
        let event = AuditEvent::new(AuditEventType::NamespaceSwitchDenied, "user:eve", "swap");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "namespace_switch_denied");
        assert!(json.get("tenant_id").is_none());
        assert!(event.is_denial());
    }
}
