//! Token issuance: device enrollment, user login, namespace switch, API
//! token bearers and device keys.

use chrono::{Duration, Utc};
use portcullis_audit::{AuditEventType, AuditLogger};
use portcullis_core::{AuthConfig, PrivateKeyRecord, TenantScope, User, fingerprint};
use portcullis_store::{Store, StoreError};
use portcullis_token::{ApiTokenPrincipal, Claims, TokenSigner, TokenVerifier, UserPrincipal};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::api::{
    ApiTokenAuthResponse, DeviceKeyResponse, EnrollRequest, EnrollResponse, LoginRequest,
    UserAuthResponse,
};
use crate::challenge;
use crate::error::AuthError;
use crate::password;

/// How user tokens are issued.
#[derive(Debug, Clone)]
pub struct IssuancePolicy {
    pub user_token_lifetime: Duration,
    /// Admin flag stamped on every user token.
    pub user_tokens_are_admin: bool,
    pub allow_unscoped_admin: bool,
    /// Usernames that may widen their context to every tenant.
    pub operators: BTreeSet<String>,
}

impl IssuancePolicy {
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            user_token_lifetime: config
                .user_token_lifetime()
                .map_err(|e| AuthError::validation(e.to_string()))?,
            user_tokens_are_admin: config.user_tokens_are_admin,
            allow_unscoped_admin: config.allow_unscoped_admin,
            operators: config
                .operators
                .iter()
                .map(|name| name.trim().to_lowercase())
                .collect(),
        })
    }
}

impl Default for IssuancePolicy {
    fn default() -> Self {
        Self {
            user_token_lifetime: Duration::hours(72),
            user_tokens_are_admin: true,
            allow_unscoped_admin: true,
            operators: BTreeSet::new(),
        }
    }
}

/// The authentication core.
pub struct AuthService {
    pub(crate) store: Arc<dyn Store>,
    signer: TokenSigner,
    pub(crate) verifier: TokenVerifier,
    pub(crate) policy: IssuancePolicy,
    pub(crate) audit: Arc<AuditLogger>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        signer: TokenSigner,
        policy: IssuancePolicy,
        audit: Arc<AuditLogger>,
    ) -> Self {
        let verifier = signer.verifier();
        Self {
            store,
            signer,
            verifier,
            policy,
            audit,
        }
    }

    pub fn policy(&self) -> &IssuancePolicy {
        &self.policy
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Hex public key for independent verifiers.
    pub fn public_key_hex(&self) -> String {
        self.signer.public_key_hex()
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Enroll a device, or re-authenticate one seen before.
    ///
    /// The device token is issued whatever the device's approval status.
    pub async fn enroll(&self, req: EnrollRequest) -> Result<EnrollResponse, AuthError> {
        let identity = req.identity;
        if identity.mac.trim().is_empty() {
            return Err(AuthError::validation("device identity requires a mac address"));
        }
        if identity.tenant_id.trim().is_empty() {
            return Err(AuthError::validation("device identity requires a tenant"));
        }

        let namespace = self.store.get_namespace(&identity.tenant_id).await?;

        let fp = fingerprint::derive(&identity);
        let device = self.store.upsert_device(&fp, &identity).await?;
        let token = self.signer.sign(&Claims::device(fp.clone()))?;

        if let Err(e) = self.store.set_device_online(&fp, true).await {
            tracing::warn!(fingerprint = %fp, error = %e, "Failed to mark device online after issuing token");
        }

        let scope = TenantScope::tenant(&identity.tenant_id);
        for session in &req.sessions {
            if let Err(e) = self.store.keep_alive_session(&scope, session).await {
                tracing::debug!(fingerprint = %fp, session = %session, error = %e, "Skipping stale session");
            }
        }

        tracing::info!(fingerprint = %fp, tenant = %identity.tenant_id, status = %device.status, "Device authenticated");
        self.audit
            .log_issued(
                AuditEventType::DeviceEnrolled,
                &format!("device:{fp}"),
                &identity.tenant_id,
                "enroll",
            )
            .await;

        Ok(EnrollResponse {
            uid: fp.to_string(),
            token,
            name: device.name,
            namespace: namespace.name,
        })
    }

    /// Password login by username, falling back to email.
    pub async fn login(&self, req: LoginRequest) -> Result<UserAuthResponse, AuthError> {
        let login = req.username.trim().to_lowercase();
        let principal = format!("user:{login}");

        let user = match self.find_user(&login).await? {
            Some(user) => user,
            None => {
                self.audit
                    .log_denied(AuditEventType::LoginFailed, &principal, "", "login", "unknown user")
                    .await;
                return Err(AuthError::unauthorized("invalid credentials"));
            }
        };

        if !password::verify(&req.password, &user.password_digest) {
            tracing::info!(username = %user.username, "Rejected login with wrong password");
            self.audit
                .log_denied(AuditEventType::LoginFailed, &principal, "", "login", "wrong password")
                .await;
            return Err(AuthError::unauthorized("invalid credentials"));
        }

        let response = self.issue_user_token(&user, None).await?;
        self.audit
            .log_issued(
                AuditEventType::LoginSucceeded,
                &format!("user:{}", user.username),
                &response.tenant,
                "login",
            )
            .await;
        Ok(response)
    }

    /// Reissue a user token by id without a password check.
    ///
    /// Only for callers that already established trust.
    pub async fn get_token(&self, user_id: &str) -> Result<UserAuthResponse, AuthError> {
        let user = self.store.get_user_by_id(user_id).await?;
        let response = self.issue_user_token(&user, None).await?;
        self.audit
            .log_issued(
                AuditEventType::TokenReissued,
                &format!("user:{}", user.username),
                &response.tenant,
                "getToken",
            )
            .await;
        Ok(response)
    }

    /// Issue a user token scoped to another namespace the user belongs to.
    pub async fn swap_namespace(
        &self,
        username: &str,
        tenant_id: &str,
    ) -> Result<UserAuthResponse, AuthError> {
        let namespace = self.store.get_namespace(tenant_id).await?;
        let user = self.store.get_user_by_username(username).await?;

        if !namespace.has_member(&user.id) {
            tracing::info!(username = %user.username, tenant = %tenant_id, "Refused namespace switch for non-member");
            self.audit
                .log_denied(
                    AuditEventType::NamespaceSwitchDenied,
                    &format!("user:{}", user.username),
                    tenant_id,
                    "swapNamespace",
                    "not a member",
                )
                .await;
            return Err(AuthError::unauthorized(format!(
                "user {} is not a member of namespace {}",
                user.username, namespace.name
            )));
        }

        let response = self.issue_user_token(&user, Some(namespace.tenant_id)).await?;
        self.audit
            .log_issued(
                AuditEventType::NamespaceSwitched,
                &format!("user:{}", user.username),
                tenant_id,
                "swapNamespace",
            )
            .await;
        Ok(response)
    }

    /// Issue a bearer for the namespace's active API token.
    pub async fn auth_api_token(
        &self,
        namespace_name: &str,
    ) -> Result<ApiTokenAuthResponse, AuthError> {
        let namespace = self.store.get_namespace_by_name(namespace_name).await?;
        let api_token = namespace.api_token.ok_or_else(|| AuthError::NotFound {
            entity: "api token",
            key: namespace_name.to_string(),
        })?;

        let token = self.signer.sign(&Claims::api_token(ApiTokenPrincipal {
            id: api_token.id.clone(),
            tenant_id: api_token.tenant_id.clone(),
            read_only: api_token.read_only,
            generation: api_token.generation.clone(),
        }))?;

        self.audit
            .log_issued(
                AuditEventType::ApiTokenIssued,
                &format!("token:{}", api_token.id),
                &api_token.tenant_id,
                "authToken",
            )
            .await;

        Ok(ApiTokenAuthResponse {
            token,
            id: api_token.id,
            tenant: api_token.tenant_id,
            read_only: api_token.read_only,
        })
    }

    /// Sign a challenge with the device key stored under `fingerprint`.
    pub async fn respond_to_challenge(
        &self,
        fingerprint: &str,
        data: &[u8],
    ) -> Result<String, AuthError> {
        let record = self.store.get_private_key(fingerprint).await?;
        let signature = challenge::sign_challenge(&record.data, data).inspect_err(|e| {
            tracing::error!(fingerprint = %fingerprint, error = %e, "Stored device key is unusable");
        })?;

        self.audit
            .log_issued(
                AuditEventType::ChallengeSigned,
                &format!("key:{fingerprint}"),
                "",
                "challengeSign",
            )
            .await;
        Ok(signature)
    }

    /// Provision a device keypair and keep its private half.
    pub async fn create_device_key(&self) -> Result<DeviceKeyResponse, AuthError> {
        let key = challenge::generate_device_key()?;

        self.store
            .create_private_key(PrivateKeyRecord {
                fingerprint: key.fingerprint.to_string(),
                data: key.private_key_pem,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(fingerprint = %key.fingerprint, "Provisioned device key");
        self.audit
            .log_issued(
                AuditEventType::DeviceKeyCreated,
                &format!("key:{}", key.fingerprint),
                "",
                "createPrivateKey",
            )
            .await;

        Ok(DeviceKeyResponse {
            fingerprint: key.fingerprint.to_string(),
            public_key: key.public_key_pem,
        })
    }

    async fn find_user(&self, login: &str) -> Result<Option<User>, AuthError> {
        match self.store.get_user_by_username(login).await {
            Ok(user) => return Ok(Some(user)),
            Err(StoreError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }
        match self.store.get_user_by_email(login).await {
            Ok(user) => Ok(Some(user)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Sign a user token for `tenant`, or for the user's current namespace.
    async fn issue_user_token(
        &self,
        user: &User,
        tenant: Option<String>,
    ) -> Result<UserAuthResponse, AuthError> {
        let tenant = match tenant {
            Some(tenant) => tenant,
            None => self
                .store
                .find_namespace_for_member(&user.id)
                .await?
                .map(|ns| ns.tenant_id)
                .unwrap_or_default(),
        };

        let claims = Claims::user(
            UserPrincipal {
                id: user.id.clone(),
                username: user.username.clone(),
                tenant: tenant.clone(),
                admin: self.policy.user_tokens_are_admin,
            },
            self.policy.user_token_lifetime,
        );
        let token = self.signer.sign(&claims)?;

        tracing::debug!(username = %user.username, tenant = %tenant, "Issued user token");
        Ok(UserAuthResponse {
            token,
            id: user.id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            tenant,
        })
    }
}
