//! Password digests.
//!
//! Stored digests are hex-encoded SHA-256 of the password.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hex-encoded SHA-256 digest of `password`.
pub fn digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Compare `password` against a stored digest in constant time.
pub fn verify(password: &str, stored_digest: &str) -> bool {
    let presented = digest(password);
    presented
        .as_bytes()
        .ct_eq(stored_digest.trim().to_ascii_lowercase().as_bytes())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_sha256_hex() {
        assert_eq!(
            digest("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn test_verify() {
        let stored = digest("hunter2");
        assert!(verify("hunter2", &stored));
        assert!(verify("hunter2", &stored.to_uppercase()));
        assert!(!verify("hunter3", &stored));
        assert!(!verify("hunter2", ""));
    }
}
