//! Request and response shapes of the caller-facing surface.

use portcullis_core::DeviceIdentity;
use serde::{Deserialize, Serialize};

/// Device enrollment or re-authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollRequest {
    #[serde(flatten)]
    pub identity: DeviceIdentity,

    /// Session ids the device still holds; refreshed best-effort.
    #[serde(default)]
    pub sessions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollResponse {
    /// Device fingerprint.
    pub uid: String,
    pub token: String,
    /// Device name.
    pub name: String,
    /// Namespace name.
    pub namespace: String,
}

/// Password login. `username` may also be an email address.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// A user token plus the identity it was issued for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAuthResponse {
    pub token: String,
    /// User id.
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    /// Active tenant, empty when the user has no namespace.
    pub tenant: String,
}

/// A bearer for a namespace API token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiTokenAuthResponse {
    pub token: String,
    pub id: String,
    pub tenant: String,
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeRequest {
    pub fingerprint: String,
    /// Challenge payload, signed as UTF-8 bytes.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// Standard base64 signature.
    pub signature: String,
}

/// Public half of a provisioned device key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceKeyResponse {
    pub fingerprint: String,
    pub public_key: String,
}

/// Register a public key in the caller's namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyRequest {
    pub name: String,
    /// SPKI PEM encoded Ed25519 public key.
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enroll_request_flattens_identity() {
        let req: EnrollRequest = serde_json::from_str(
            r#"{"mac":"de:ad:be:ef","tenant_id":"t1","hostname":"Edge","sessions":["s1"]}"#,
        )
        .unwrap();
        assert_eq!(req.identity.mac, "de:ad:be:ef");
        assert_eq!(req.identity.hostname.as_deref(), Some("Edge"));
        assert_eq!(req.sessions, vec!["s1".to_string()]);

        let bare: EnrollRequest =
            serde_json::from_str(r#"{"mac":"m","tenant_id":"t"}"#).unwrap();
        assert!(bare.sessions.is_empty());
    }

    #[test]
    fn test_login_request_debug_hides_password() {
        let req = LoginRequest {
            username: "alice".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{req:?}").contains("hunter2"));
    }
}
