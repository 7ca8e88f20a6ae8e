//! The request-scoped result of authentication.

use portcullis_core::TenantScope;
use portcullis_token::Principal;

use crate::error::AuthError;

/// The verified principal and tenant scope of one inbound call.
///
/// Built by the gate, handed to every data-access call, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    principal: Principal,
    scope: TenantScope,
    read_only: bool,
}

impl RequestContext {
    pub(crate) fn new(principal: Principal, scope: TenantScope, read_only: bool) -> Self {
        Self {
            principal,
            scope,
            read_only,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn scope(&self) -> &TenantScope {
        &self.scope
    }

    /// Set for API token principals whose token is read-only.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Fail unless the context may mutate records.
    pub fn require_write(&self) -> Result<(), AuthError> {
        if self.read_only {
            return Err(AuthError::unauthorized("read-only token cannot modify records"));
        }
        Ok(())
    }

    /// Fail unless the principal is a user.
    pub fn require_user(&self) -> Result<&portcullis_token::UserPrincipal, AuthError> {
        match &self.principal {
            Principal::User(user) => Ok(user),
            _ => Err(AuthError::unauthorized("operation requires a user token")),
        }
    }

    /// Short label used in logs and audit events.
    pub fn label(&self) -> String {
        principal_label(&self.principal)
    }
}

pub(crate) fn principal_label(principal: &Principal) -> String {
    match principal {
        Principal::Device(device) => format!("device:{}", device.fingerprint),
        Principal::User(user) => format!("user:{}", user.username),
        Principal::Token(token) => format!("token:{}", token.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_token::{ApiTokenPrincipal, UserPrincipal};

    #[test]
    fn test_read_only_context_cannot_write() {
        let ctx = RequestContext::new(
            Principal::Token(ApiTokenPrincipal {
                id: "id".into(),
                tenant_id: "t1".into(),
                read_only: true,
                generation: "g1".into(),
            }),
            TenantScope::tenant("t1"),
            true,
        );
        assert!(matches!(ctx.require_write(), Err(AuthError::Unauthorized(_))));
        assert!(ctx.require_user().is_err());
        assert_eq!(ctx.label(), "token:id");
    }

    #[test]
    fn test_user_context() {
        let ctx = RequestContext::new(
            Principal::User(UserPrincipal {
                id: "u1".into(),
                username: "alice".into(),
                tenant: "t1".into(),
                admin: true,
            }),
            TenantScope::tenant("t1"),
            false,
        );
        ctx.require_write().unwrap();
        assert_eq!(ctx.require_user().unwrap().username, "alice");
        assert_eq!(ctx.label(), "user:alice");
    }
}
