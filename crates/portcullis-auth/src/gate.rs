//! Authorization gate: bearer in, request context out.

use portcullis_audit::AuditEventType;
use portcullis_core::TenantScope;
use portcullis_token::Principal;

use crate::context::{RequestContext, principal_label};
use crate::error::AuthError;
use crate::service::AuthService;

impl AuthService {
    /// Verify a bearer and resolve the principal's tenant scope.
    ///
    /// - a device resolves to the tenant of its device record
    /// - a user resolves to the tenant in its token, or to no namespace
    /// - an API token resolves to its namespace, and is refused once deleted;
    ///   its read-only flag is read from the store, not the token
    pub async fn authenticate(&self, bearer: &str) -> Result<RequestContext, AuthError> {
        let claims = match self.verifier.verify(bearer) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected bearer");
                self.audit.log_authentication_failed(&e.to_string(), None).await;
                return Err(e.into());
            }
        };

        let ctx = match claims.into_principal() {
            Principal::Device(device) => {
                let tenant_id = self
                    .store
                    .device_tenant(&device.fingerprint)
                    .await
                    .map_err(|e| match e {
                        portcullis_store::StoreError::NotFound { .. } => {
                            AuthError::unauthorized("unknown device")
                        }
                        other => other.into(),
                    })?;
                let scope = TenantScope::tenant(tenant_id);
                RequestContext::new(Principal::Device(device), scope, false)
            }
            Principal::User(user) => {
                let scope = if user.tenant.is_empty() {
                    TenantScope::NoNamespace
                } else {
                    TenantScope::tenant(&user.tenant)
                };
                RequestContext::new(Principal::User(user), scope, false)
            }
            Principal::Token(token) => {
                let namespace = self.store.get_namespace(&token.tenant_id).await.map_err(
                    |e| match e {
                        portcullis_store::StoreError::NotFound { .. } => {
                            AuthError::unauthorized("namespace no longer exists")
                        }
                        other => other.into(),
                    },
                )?;
                let current = namespace
                    .api_token
                    .filter(|active| {
                        active.id == token.id && active.generation == token.generation
                    })
                    .ok_or_else(|| {
                        tracing::info!(token_id = %token.id, tenant = %token.tenant_id, "Refused revoked API token");
                        AuthError::unauthorized("api token has been revoked")
                    })?;
                let scope = TenantScope::tenant(&current.tenant_id);
                RequestContext::new(Principal::Token(token), scope, current.read_only)
            }
        };

        tracing::debug!(principal = %ctx.label(), scope = %ctx.scope(), "Authenticated request");
        Ok(ctx)
    }

    /// Widen a user context to every tenant.
    ///
    /// Requires an admin user listed as an operator and a policy that allows
    /// unscoped access. Every grant is logged and audited with `reason`.
    pub async fn administrative(
        &self,
        ctx: &RequestContext,
        reason: &str,
    ) -> Result<RequestContext, AuthError> {
        if !self.policy.allow_unscoped_admin {
            return Err(AuthError::unauthorized("unscoped access is disabled"));
        }
        let user = ctx.require_user()?;
        if !user.admin || !self.policy.operators.contains(&user.username) {
            tracing::info!(username = %user.username, "Refused unscoped access for non-operator");
            self.audit
                .log_denied(
                    AuditEventType::UnscopedAccessDenied,
                    &principal_label(ctx.principal()),
                    &user.tenant,
                    "administrative",
                    "not an operator",
                )
                .await;
            return Err(AuthError::unauthorized("unscoped access requires an operator"));
        }
        if reason.trim().is_empty() {
            return Err(AuthError::validation("unscoped access requires a reason"));
        }

        let label = principal_label(ctx.principal());
        tracing::info!(principal = %label, reason = %reason, "Granting unscoped access");
        self.audit.log_unscoped_access(&label, "administrative", reason).await;

        Ok(RequestContext::new(
            ctx.principal().clone(),
            TenantScope::administrative(reason),
            ctx.is_read_only(),
        ))
    }
}
