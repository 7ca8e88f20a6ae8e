//! Device public-key challenge/response.
//!
//! A device proves control of a previously registered key: the stored
//! private key signs the SHA-256 digest of the caller's challenge payload.
//! Signatures travel as standard base64.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use portcullis_core::Fingerprint;
use portcullis_core::fingerprint::derive_public_key;
use portcullis_token::TokenError;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// A freshly provisioned device keypair.
pub struct DeviceKey {
    /// Fingerprint of the raw public key bytes.
    pub fingerprint: Fingerprint,
    /// SPKI PEM public key, handed to the device.
    pub public_key_pem: String,
    /// PKCS#8 PEM private key, kept by the key store.
    pub private_key_pem: String,
}

impl std::fmt::Debug for DeviceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceKey")
            .field("fingerprint", &self.fingerprint)
            .field("public_key_pem", &self.public_key_pem)
            .field("private_key_pem", &"[redacted]")
            .finish()
    }
}

/// Generate a new Ed25519 device keypair.
pub fn generate_device_key() -> Result<DeviceKey, AuthError> {
    let signing_key = SigningKey::from_bytes(&rand::random::<[u8; 32]>());
    let verifying_key = signing_key.verifying_key();

    let private_key_pem = signing_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| TokenError::KeyGeneration(e.to_string()))?
        .to_string();
    let public_key_pem = verifying_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| TokenError::KeyGeneration(e.to_string()))?;

    Ok(DeviceKey {
        fingerprint: derive_public_key(verifying_key.as_bytes()),
        public_key_pem,
        private_key_pem,
    })
}

/// Fingerprint of an SPKI PEM public key.
pub fn public_key_fingerprint(public_key_pem: &str) -> Result<Fingerprint, AuthError> {
    let verifying_key = VerifyingKey::from_public_key_pem(public_key_pem.trim())
        .map_err(|e| AuthError::validation(format!("malformed public key: {e}")))?;
    Ok(derive_public_key(verifying_key.as_bytes()))
}

/// Sign `data` with a stored PKCS#8 PEM private key.
///
/// Malformed key material is [`TokenError::KeyFormat`]: the store is
/// corrupt, the caller did nothing wrong.
pub fn sign_challenge(private_key_pem: &str, data: &[u8]) -> Result<String, AuthError> {
    let signing_key = SigningKey::from_pkcs8_pem(private_key_pem)
        .map_err(|e| TokenError::KeyFormat(e.to_string()))?;
    let signature = signing_key.sign(&Sha256::digest(data));
    Ok(STANDARD.encode(signature.to_bytes()))
}

/// Check a base64 challenge signature against an SPKI PEM public key.
pub fn verify_challenge(
    public_key_pem: &str,
    data: &[u8],
    signature_b64: &str,
) -> Result<(), AuthError> {
    let verifying_key = VerifyingKey::from_public_key_pem(public_key_pem)
        .map_err(|e| AuthError::validation(format!("malformed public key: {e}")))?;
    let raw = STANDARD
        .decode(signature_b64.trim())
        .map_err(|e| AuthError::validation(format!("malformed signature: {e}")))?;
    let signature = Signature::from_slice(&raw)
        .map_err(|e| AuthError::validation(format!("malformed signature: {e}")))?;

    verifying_key
        .verify(&Sha256::digest(data), &signature)
        .map_err(|_| AuthError::unauthorized("challenge signature does not match"))
}
