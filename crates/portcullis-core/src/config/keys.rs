//! Token keypair source configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default environment variable holding the hex-encoded private key.
pub const DEFAULT_PRIVATE_KEY_ENV: &str = "PORTCULLIS_PRIVATE_KEY";

/// Default environment variable holding the hex-encoded public key.
pub const DEFAULT_PUBLIC_KEY_ENV: &str = "PORTCULLIS_PUBLIC_KEY";

/// Where the process-wide signing keypair is loaded from.
///
/// The environment variable wins over the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyConfig {
    /// Environment variable containing the private key (hex-encoded).
    #[serde(default = "default_private_key_env")]
    pub private_key_env: Option<String>,

    /// Path to the private key file.
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,

    /// Environment variable containing the public key (hex-encoded).
    #[serde(default = "default_public_key_env")]
    pub public_key_env: Option<String>,

    /// Path to the public key file.
    #[serde(default)]
    pub public_key_file: Option<PathBuf>,
}

fn default_private_key_env() -> Option<String> {
    Some(DEFAULT_PRIVATE_KEY_ENV.to_string())
}

fn default_public_key_env() -> Option<String> {
    Some(DEFAULT_PUBLIC_KEY_ENV.to_string())
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            private_key_env: default_private_key_env(),
            private_key_file: None,
            public_key_env: default_public_key_env(),
            public_key_file: None,
        }
    }
}

impl KeyConfig {
    /// Resolve the private key from environment or file.
    pub fn resolve_private_key(&self) -> Result<Option<String>, std::io::Error> {
        resolve(self.private_key_env.as_deref(), self.private_key_file.as_ref())
    }

    /// Resolve the public key from environment or file.
    pub fn resolve_public_key(&self) -> Result<Option<String>, std::io::Error> {
        resolve(self.public_key_env.as_deref(), self.public_key_file.as_ref())
    }
}

fn resolve(env_var: Option<&str>, path: Option<&PathBuf>) -> Result<Option<String>, std::io::Error> {
    if let Some(env_var) = env_var {
        if let Ok(key) = std::env::var(env_var) {
            let key = key.trim();
            if !key.is_empty() {
                return Ok(Some(key.to_string()));
            }
        }
    }

    if let Some(path) = path {
        if path.exists() {
            let key = std::fs::read_to_string(path)?;
            return Ok(Some(key.trim().to_string()));
        }
    }

    Ok(None)
}
