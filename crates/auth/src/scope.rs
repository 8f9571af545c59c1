//! Tenant visibility predicate derived from an effective role.
//!
//! Guards check scope at the route boundary; stores re-apply the same filter
//! on the actual read or write, so a role change between the two cannot
//! widen what a request touches.

use bookwell_core::TenantId;

use crate::{EffectiveRole, RoleKind, RoleScope};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TenantScopeFilter {
    /// Every tenant is visible.
    All,
    /// Only this tenant is visible.
    Tenant(TenantId),
    /// Nothing is visible.
    Deny,
}

impl TenantScopeFilter {
    pub fn for_role(role: &EffectiveRole) -> Self {
        match (role.kind, role.scope) {
            (RoleKind::SuperAdmin, _) => TenantScopeFilter::All,
            (RoleKind::CenterAdmin, RoleScope::Tenant(t)) => TenantScopeFilter::Tenant(t),
            // Not produced by the resolver.
            (RoleKind::CenterAdmin, RoleScope::Unrestricted) => TenantScopeFilter::Deny,
            (RoleKind::Staff, _) => TenantScopeFilter::Deny,
        }
    }

    pub fn allows(&self, tenant_id: TenantId) -> bool {
        match self {
            TenantScopeFilter::All => true,
            TenantScopeFilter::Tenant(t) => *t == tenant_id,
            TenantScopeFilter::Deny => false,
        }
    }

    /// The filter as a plain predicate, for collaborators that only take closures.
    pub fn predicate(self) -> impl Fn(TenantId) -> bool + Send + Sync + 'static {
        move |tenant_id| self.allows(tenant_id)
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, TenantScopeFilter::Deny)
    }
}
