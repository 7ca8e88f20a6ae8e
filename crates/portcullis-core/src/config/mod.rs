//! Configuration types for Portcullis.
//!
//! A single TOML file (`portcullis.toml`) is split into sections:
//!
//! - `[server]`: bind address of the HTTP surface
//! - `[keys]`: where the process-wide token keypair comes from
//! - `[auth]`: token lifetimes and issuance policy
//! - `[audit]`: audit trail outputs

pub mod audit;
pub mod auth;
pub mod keys;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub use audit::AuditConfig;
pub use auth::AuthConfig;
pub use keys::KeyConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PORTCULLIS_CONFIG";

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "portcullis.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading a config or key file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not acceptable.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Complete Portcullis configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PortcullisConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub keys: KeyConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub audit: AuditConfig,
}

impl PortcullisConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&raw)
    }

    /// Load configuration from `path`, or defaults if the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Check values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.user_token_lifetime()?;
        Ok(())
    }
}

/// HTTP surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8080"
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = PortcullisConfig::from_toml("").unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!(cfg.auth.user_token_lifetime, "72h");
        assert!(cfg.auth.user_tokens_are_admin);
        assert!(cfg.audit.enabled);
    }

    #[test]
    fn test_sections_override_defaults() {
        let cfg = PortcullisConfig::from_toml(
            r#"
            [server]
            bind = "127.0.0.1:9000"

            [keys]
            private_key_file = "/etc/portcullis/private.key"

            [auth]
            user_token_lifetime = "1h 30m"
            user_tokens_are_admin = false
            allow_unscoped_admin = false

            [audit]
            stdout = true
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.bind, "127.0.0.1:9000");
        assert_eq!(
            cfg.keys.private_key_file.as_deref(),
            Some(Path::new("/etc/portcullis/private.key"))
        );
        assert_eq!(
            cfg.auth.user_token_lifetime().unwrap(),
            chrono::Duration::minutes(90)
        );
        assert!(!cfg.auth.user_tokens_are_admin);
        assert!(!cfg.auth.allow_unscoped_admin);
        assert!(cfg.audit.stdout);
    }

    #[test]
    fn test_invalid_lifetime_is_rejected() {
        let err = PortcullisConfig::from_toml(
            r#"
            [auth]
            user_token_lifetime = "soon"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind = \"0.0.0.0:1234\"").unwrap();

        let cfg = PortcullisConfig::load_or_default(file.path()).unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:1234");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let cfg = PortcullisConfig::load_or_default("/nonexistent/portcullis.toml").unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
    }
}
