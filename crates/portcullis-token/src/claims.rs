//! Token claims for device, user and API token principals.

use chrono::{DateTime, Duration, Utc};
use portcullis_core::Fingerprint;
use serde::{Deserialize, Serialize};

/// A device authenticated by its identity fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePrincipal {
    pub fingerprint: Fingerprint,
}

/// A human user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPrincipal {
    pub id: String,
    pub username: String,
    /// Active tenant; empty when the user has no namespace yet.
    pub tenant: String,
    pub admin: bool,
}

/// A namespace-scoped API token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTokenPrincipal {
    pub id: String,
    pub tenant_id: String,
    pub read_only: bool,
    /// Creation generation of the token this bearer was issued for.
    pub generation: String,
}

/// The authenticated identity a token stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    Device(DevicePrincipal),
    User(UserPrincipal),
    Token(ApiTokenPrincipal),
}

impl Principal {
    pub fn kind(&self) -> ClaimsKind {
        match self {
            Self::Device(_) => ClaimsKind::Device,
            Self::User(_) => ClaimsKind::User,
            Self::Token(_) => ClaimsKind::Token,
        }
    }
}

/// Discriminator carried in every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimsKind {
    Device,
    User,
    Token,
}

impl ClaimsKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::User => "user",
            Self::Token => "token",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "device" => Some(Self::Device),
            "user" => Some(Self::User),
            "token" => Some(Self::Token),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClaimsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A principal plus the expiry rule of its kind.
///
/// Only the constructors below build claims, so a user claim always expires
/// and device/API token claims never do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    principal: Principal,
    expires_at: Option<DateTime<Utc>>,
}

impl Claims {
    /// Claims for a device. Never expire.
    pub fn device(fingerprint: Fingerprint) -> Self {
        Self {
            principal: Principal::Device(DevicePrincipal { fingerprint }),
            expires_at: None,
        }
    }

    /// Claims for a user, expiring `lifetime` from now.
    pub fn user(principal: UserPrincipal, lifetime: Duration) -> Self {
        Self::user_expiring_at(principal, Utc::now() + lifetime)
    }

    /// Claims for a user expiring at a fixed instant (truncated to seconds).
    pub fn user_expiring_at(principal: UserPrincipal, expires_at: DateTime<Utc>) -> Self {
        let expires_at =
            DateTime::from_timestamp(expires_at.timestamp(), 0).unwrap_or(expires_at);
        Self {
            principal: Principal::User(principal),
            expires_at: Some(expires_at),
        }
    }

    /// Claims for a namespace API token. Never expire; revoked by deletion.
    pub fn api_token(principal: ApiTokenPrincipal) -> Self {
        Self {
            principal: Principal::Token(principal),
            expires_at: None,
        }
    }

    pub fn kind(&self) -> ClaimsKind {
        self.principal.kind()
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn into_principal(self) -> Principal {
        self.principal
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Check if the claims have expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Utc::now() >= exp)
    }

    /// Get time until expiration.
    pub fn time_until_expiration(&self) -> Option<Duration> {
        self.expires_at.map(|exp| exp - Utc::now())
    }
}
