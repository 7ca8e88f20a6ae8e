//! The process-wide keypair tokens are signed with.

use crate::error::TokenError;
use biscuit_auth::{Algorithm, KeyPair as BiscuitKeyPair, PrivateKey, PublicKey};
use portcullis_core::KeyConfig;
use rand::RngCore;
use std::path::Path;

/// An Ed25519 keypair for signing and verifying tokens.
///
/// Loaded once at startup and never mutated afterwards.
pub struct KeyPair {
    inner: BiscuitKeyPair,
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self::from_private_key(self.inner.private())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Result<Self, TokenError> {
        let mut rng = rand::rng();
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);

        let private_key = PrivateKey::from_bytes(&bytes, Algorithm::Ed25519)
            .map_err(|e| TokenError::KeyGeneration(e.to_string()))?;
        Ok(Self::from_private_key(private_key))
    }

    /// Create a keypair from an existing private key.
    pub fn from_private_key(private_key: PrivateKey) -> Self {
        let inner = BiscuitKeyPair::from(&private_key);
        Self { inner }
    }

    /// Load a keypair from a hex-encoded private key string.
    pub fn from_private_key_hex(hex: &str) -> Result<Self, TokenError> {
        let private_key = PrivateKey::from_bytes_hex(hex, Algorithm::Ed25519)
            .map_err(|e| TokenError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::from_private_key(private_key))
    }

    /// Load the keypair named by the key configuration.
    ///
    /// If a public key is configured as well it must match the private key.
    pub fn from_config(config: &KeyConfig) -> Result<Self, TokenError> {
        let private_hex = config.resolve_private_key()?.ok_or_else(|| {
            TokenError::InvalidPrivateKey("no private key configured".to_string())
        })?;
        let keypair = Self::from_private_key_hex(&private_hex)?;

        if let Some(public_hex) = config.resolve_public_key()? {
            let configured = load_public_key_hex(&public_hex)?;
            if configured.to_bytes_hex() != keypair.public_key_hex() {
                return Err(TokenError::InvalidPublicKey(
                    "configured public key does not match the private key".to_string(),
                ));
            }
        }

        tracing::info!(public_key = %keypair.public_key_hex(), "Loaded token signing key");
        Ok(keypair)
    }

    /// Get the inner biscuit keypair.
    pub(crate) fn inner(&self) -> &BiscuitKeyPair {
        &self.inner
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        self.inner.public()
    }

    /// Get the private key as hex string.
    pub fn private_key_hex(&self) -> String {
        self.inner.private().to_bytes_hex()
    }

    /// Get the public key as hex string.
    pub fn public_key_hex(&self) -> String {
        self.inner.public().to_bytes_hex()
    }

    /// Save the keypair to files.
    pub fn save_to_files(
        &self,
        private_key_path: &Path,
        public_key_path: &Path,
    ) -> Result<(), TokenError> {
        std::fs::write(private_key_path, self.private_key_hex())?;
        std::fs::write(public_key_path, self.public_key_hex())?;
        Ok(())
    }

    /// Load a keypair from a private key file.
    pub fn load_from_file(private_key_path: &Path) -> Result<Self, TokenError> {
        let hex = std::fs::read_to_string(private_key_path)?;
        Self::from_private_key_hex(hex.trim())
    }
}

/// Load a public key from hex string (for verification-only scenarios).
pub fn load_public_key_hex(hex: &str) -> Result<PublicKey, TokenError> {
    PublicKey::from_bytes_hex(hex.trim(), Algorithm::Ed25519)
        .map_err(|e| TokenError::InvalidPublicKey(e.to_string()))
}

/// Load a public key from a file.
pub fn load_public_key_file(path: &Path) -> Result<PublicKey, TokenError> {
    let hex = std::fs::read_to_string(path)?;
    load_public_key_hex(&hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_keypair_roundtrip() {
        let keypair1 = KeyPair::generate().unwrap();
        let hex = keypair1.private_key_hex();

        let keypair2 = KeyPair::from_private_key_hex(&hex).unwrap();
        assert_eq!(keypair1.public_key_hex(), keypair2.public_key_hex());
        assert_eq!(keypair1.clone().public_key_hex(), keypair1.public_key_hex());
    }

    #[test]
    fn test_debug_hides_private_key() {
        let keypair = KeyPair::generate().unwrap();
        let printed = format!("{:?}", keypair);
        assert!(!printed.contains(&keypair.private_key_hex()));
        assert!(printed.contains(&keypair.public_key_hex()));
    }

    #[test]
    fn test_keypair_file_save_load() {
        let keypair = KeyPair::generate().unwrap();

        let mut priv_file = NamedTempFile::new().unwrap();
        writeln!(priv_file, "{}", keypair.private_key_hex()).unwrap();

        let loaded = KeyPair::load_from_file(priv_file.path()).unwrap();
        assert_eq!(keypair.public_key_hex(), loaded.public_key_hex());

        let mut pub_file = NamedTempFile::new().unwrap();
        writeln!(pub_file, "{}", keypair.public_key_hex()).unwrap();
        let public = load_public_key_file(pub_file.path()).unwrap();
        assert_eq!(public.to_bytes_hex(), keypair.public_key_hex());
    }

    #[test]
    fn test_from_config_requires_private_key() {
        let config = KeyConfig {
            private_key_env: None,
            private_key_file: None,
            public_key_env: None,
            public_key_file: None,
        };
        assert!(matches!(
            KeyPair::from_config(&config),
            Err(TokenError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_from_config_rejects_mismatched_public_key() {
        let keypair = KeyPair::generate().unwrap();
        let other = KeyPair::generate().unwrap();

        let mut priv_file = NamedTempFile::new().unwrap();
        write!(priv_file, "{}", keypair.private_key_hex()).unwrap();
        let mut pub_file = NamedTempFile::new().unwrap();
        write!(pub_file, "{}", other.public_key_hex()).unwrap();

        let config = KeyConfig {
            private_key_env: None,
            private_key_file: Some(priv_file.path().to_path_buf()),
            public_key_env: None,
            public_key_file: Some(pub_file.path().to_path_buf()),
        };
        assert!(matches!(
            KeyPair::from_config(&config),
            Err(TokenError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_from_config_loads_matching_pair() {
        let keypair = KeyPair::generate().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let priv_path = dir.path().join("private.key");
        let pub_path = dir.path().join("public.key");
        keypair.save_to_files(&priv_path, &pub_path).unwrap();

        let config = KeyConfig {
            private_key_env: None,
            private_key_file: Some(priv_path),
            public_key_env: None,
            public_key_file: Some(pub_path),
        };
        let loaded = KeyPair::from_config(&config).unwrap();
        assert_eq!(loaded.public_key_hex(), keypair.public_key_hex());
    }
}
