//! Audit logger implementation.
//!
//! Provides the main `AuditLogger` type with helper methods for the events
//! the authentication core records.

use portcullis_core::AuditConfig;
use std::sync::Arc;

use crate::error::AuditError;
use crate::event::{AuditEvent, AuditEventType};
use crate::storage::{AuditStorage, ConsoleStorage, DualStorage, FileStorage, NullStorage};

/// The main audit logger.
pub struct AuditLogger {
    config: AuditConfig,
    storage: Arc<dyn AuditStorage>,
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AuditLogger {
    /// Create a new audit logger with the given configuration.
    pub fn new(config: AuditConfig) -> Result<Self, AuditError> {
        let storage: Arc<dyn AuditStorage> = match (&config.file, config.enabled, config.stdout) {
            (_, false, _) => Arc::new(NullStorage::new()),
            (Some(path), true, true) => Arc::new(DualStorage::new(path)?),
            (Some(path), true, false) => Arc::new(FileStorage::new(path)?),
            (None, true, true) => Arc::new(ConsoleStorage::new()),
            // Enabled without a sink: events still reach tracing.
            (None, true, false) => Arc::new(NullStorage::new()),
        };

        Ok(Self { config, storage })
    }

    /// Create a logger with a custom storage backend.
    pub fn with_storage(config: AuditConfig, storage: Arc<dyn AuditStorage>) -> Self {
        Self { config, storage }
    }

    /// Create a disabled (no-op) logger.
    pub fn disabled() -> Self {
        Self {
            config: AuditConfig {
                enabled: false,
                ..Default::default()
            },
            storage: Arc::new(NullStorage::new()),
        }
    }

    /// Create a console-only logger (useful for development).
    pub fn console_only() -> Self {
        Self {
            config: AuditConfig {
                enabled: true,
                stdout: true,
                ..Default::default()
            },
            storage: Arc::new(ConsoleStorage::new()),
        }
    }

    /// Check if logging is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Log an audit event.
    pub async fn log(&self, event: AuditEvent) -> Result<(), AuditError> {
        if !self.config.enabled {
            return Ok(());
        }

        // Also log to tracing for structured logging integration
        tracing::debug!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            principal = %event.principal,
            tenant = event.tenant_id.as_deref().unwrap_or("-"),
            action = %event.action,
            "Audit event"
        );

        self.storage.store(event).await
    }

    /// Log an event, downgrading a storage failure to a warning.
    ///
    /// Auditing never turns a completed operation into a failed one.
    pub async fn record(&self, event: AuditEvent) {
        let event_type = event.event_type;
        if let Err(e) = self.log(event).await {
            tracing::warn!(error = %e, event_type = %event_type, "Failed to record audit event");
        }
    }

    /// Log a successful token issuance.
    pub async fn log_issued(
        &self,
        event_type: AuditEventType,
        principal: &str,
        tenant_id: &str,
        action: &str,
    ) {
        let event = AuditEvent::builder(event_type, principal, action)
            .tenant(tenant_id)
            .build();
        self.record(event).await
    }

    /// Log a refused request.
    pub async fn log_denied(
        &self,
        event_type: AuditEventType,
        principal: &str,
        tenant_id: &str,
        action: &str,
        reason: &str,
    ) {
        let event = AuditEvent::builder(event_type, principal, action)
            .tenant(tenant_id)
            .reason(reason)
            .build();
        self.record(event).await
    }

    /// Log the resolution of an administrative (unscoped) context.
    pub async fn log_unscoped_access(&self, principal: &str, action: &str, reason: &str) {
        let event = AuditEvent::builder(AuditEventType::UnscopedAccess, principal, action)
            .reason(reason)
            .build();
        self.record(event).await
    }

    /// Log an authentication failure event.
    pub async fn log_authentication_failed(&self, reason: &str, client_ip: Option<&str>) {
        let mut builder =
            AuditEvent::builder(AuditEventType::AuthenticationFailed, "unknown", "authenticate")
                .reason(reason);

        if let Some(ip) = client_ip {
            builder = builder.client_ip(ip);
        }

        self.record(builder.build()).await
    }

    /// Query audit events with filters.
    pub async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        self.storage.query(filter).await
    }

    /// Get an audit event by ID.
    pub async fn get(&self, event_id: uuid::Uuid) -> Result<Option<AuditEvent>, AuditError> {
        self.storage.get(event_id).await
    }

    /// Get recent events for a tenant.
    pub async fn recent_for_tenant(
        &self,
        tenant_id: &str,
        limit: usize,
    ) -> Result<Vec<AuditEvent>, AuditError> {
        self.query(AuditFilter {
            tenant_id: Some(tenant_id.to_string()),
            limit: Some(limit),
            ..Default::default()
        })
        .await
    }
}

/// Filter for querying audit events.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Filter by tenant ID.
    pub tenant_id: Option<String>,
    /// Filter by principal.
    pub principal: Option<String>,
    /// Filter by event type.
    pub event_type: Option<AuditEventType>,
    /// Filter by start time.
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    /// Filter by end time.
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
}

impl AuditFilter {
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(ref tenant) = self.tenant_id {
            if event.tenant_id.as_ref() != Some(tenant) {
                return false;
            }
        }
        if let Some(ref principal) = self.principal {
            if &event.principal != principal {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        if let Some(start) = self.start_time {
            if event.occurred_at < start {
                return false;
            }
        }
        if let Some(end) = self.end_time {
            if event.occurred_at > end {
                return false;
            }
        }
        true
    }

    /// Filter, then apply offset and limit.
    pub fn apply<'a>(&self, events: impl Iterator<Item = &'a AuditEvent>) -> Vec<AuditEvent> {
        events
            .filter(|e| self.matches(e))
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}
