//! Token issuance policy.

use super::ConfigError;
use serde::{Deserialize, Serialize};

/// Policy applied when the gate issues tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of user tokens (humantime syntax, e.g. "72h").
    ///
    /// Device and API tokens never expire.
    #[serde(default = "default_user_token_lifetime")]
    pub user_token_lifetime: String,

    /// Whether issued user tokens carry the admin flag.
    #[serde(default = "default_true")]
    pub user_tokens_are_admin: bool,

    /// Whether the gate may build administrative (unscoped) contexts at all.
    #[serde(default = "default_true")]
    pub allow_unscoped_admin: bool,

    /// Usernames allowed to request administrative contexts.
    ///
    /// The admin flag alone is not enough, since every user token may carry
    /// it. Empty means nobody.
    #[serde(default)]
    pub operators: Vec<String>,
}

fn default_user_token_lifetime() -> String {
    "72h".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_token_lifetime: default_user_token_lifetime(),
            user_tokens_are_admin: true,
            allow_unscoped_admin: true,
            operators: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Parsed user token lifetime.
    pub fn user_token_lifetime(&self) -> Result<chrono::Duration, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidValue {
            field: "auth.user_token_lifetime".to_string(),
            reason,
        };

        let std_duration =
            humantime::parse_duration(&self.user_token_lifetime).map_err(|e| invalid(e.to_string()))?;
        if std_duration.is_zero() {
            return Err(invalid("lifetime must be positive".to_string()));
        }
        chrono::Duration::from_std(std_duration).map_err(|e| invalid(e.to_string()))
    }
}
