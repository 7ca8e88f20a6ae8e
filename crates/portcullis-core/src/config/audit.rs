//! Audit trail configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the authentication audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit events are recorded.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Also print events to stdout.
    #[serde(default)]
    pub stdout: bool,

    /// JSON Lines file events are appended to.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_enabled() -> bool {
    true
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            stdout: false,
            file: None,
        }
    }
}
