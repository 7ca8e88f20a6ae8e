//! Tenant scope attached to every data-access call.

use serde::{Deserialize, Serialize};

/// The tenant filter a data-access call runs under.
///
/// Built once per request from the verified principal and passed to every
/// store call. Unscoped access is never a default: it must be requested
/// explicitly as [`TenantScope::Administrative`] with a reason, which the
/// gate logs and audits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TenantScope {
    /// Only records tagged with this tenant are visible.
    Tenant { tenant_id: String },

    /// The principal has no active namespace yet; nothing is visible.
    NoNamespace,

    /// Every tenant is visible.
    Administrative { reason: String },
}

impl TenantScope {
    pub fn tenant(tenant_id: impl Into<String>) -> Self {
        Self::Tenant {
            tenant_id: tenant_id.into(),
        }
    }

    pub fn administrative(reason: impl Into<String>) -> Self {
        Self::Administrative {
            reason: reason.into(),
        }
    }

    /// Whether a record tagged with `tenant_id` is visible under this scope.
    pub fn admits(&self, tenant_id: &str) -> bool {
        match self {
            Self::Tenant { tenant_id: scoped } => scoped == tenant_id,
            Self::NoNamespace => false,
            Self::Administrative { .. } => true,
        }
    }

    /// The tenant this scope is pinned to, if any.
    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            Self::Tenant { tenant_id } => Some(tenant_id),
            _ => None,
        }
    }

    pub fn is_administrative(&self) -> bool {
        matches!(self, Self::Administrative { .. })
    }
}

impl std::fmt::Display for TenantScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tenant { tenant_id } => write!(f, "tenant:{}", tenant_id),
            Self::NoNamespace => write!(f, "no-namespace"),
            Self::Administrative { reason } => write!(f, "administrative({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_scope_admits_only_its_tenant() {
        let scope = TenantScope::tenant("t1");
        assert!(scope.admits("t1"));
        assert!(!scope.admits("t2"));
        assert!(!scope.admits(""));
        assert_eq!(scope.tenant_id(), Some("t1"));
    }

    #[test]
    fn test_no_namespace_admits_nothing() {
        let scope = TenantScope::NoNamespace;
        assert!(!scope.admits("t1"));
        assert!(!scope.admits(""));
        assert_eq!(scope.tenant_id(), None);
    }

    #[test]
    fn test_administrative_admits_everything() {
        let scope = TenantScope::administrative("maintenance");
        assert!(scope.admits("t1"));
        assert!(scope.admits("t2"));
        assert!(scope.is_administrative());
        assert_eq!(scope.to_string(), "administrative(maintenance)");
    }
}
