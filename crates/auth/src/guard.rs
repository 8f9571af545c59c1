//! Request-scoped access checks.
//!
//! Checks run in a fixed order: authentication, then role, then tenant scope.
//! Each returns a value or an [`AuthzError`]; callers stop at the first error
//! and hand it to the denial policy.

use std::sync::Arc;

use tokio::sync::OnceCell;

use bookwell_core::TenantId;

use crate::{
    AuthorizationResolver, AuthzError, EffectiveRole, Principal, RoleKind, RoleStore,
    TenantScopeFilter,
};

/// Check that `role` may touch a resource owned by `tenant_id`.
pub fn require_tenant_scope(role: &EffectiveRole, tenant_id: TenantId) -> Result<(), AuthzError> {
    if role.scope_filter().allows(tenant_id) {
        Ok(())
    } else {
        Err(AuthzError::ScopeMismatch)
    }
}

/// Access guard for one request.
///
/// The effective role is resolved at most once per guard; a new request gets
/// a new guard and therefore re-reads the role store.
pub struct AccessGuard<S: ?Sized> {
    principal: Principal,
    resolver: AuthorizationResolver<S>,
    resolved: OnceCell<Result<EffectiveRole, AuthzError>>,
}

impl<S> AccessGuard<S>
where
    S: RoleStore + ?Sized,
{
    pub fn new(principal: Principal, resolver: AuthorizationResolver<S>) -> Self {
        Self {
            principal,
            resolver,
            resolved: OnceCell::new(),
        }
    }

    pub fn from_store(principal: Principal, store: Arc<S>) -> Self {
        Self::new(principal, AuthorizationResolver::new(store))
    }

    pub fn require_authenticated(&self) -> Result<&Principal, AuthzError> {
        if self.principal.is_authenticated() {
            Ok(&self.principal)
        } else {
            Err(AuthzError::Unauthenticated)
        }
    }

    /// Resolve (once) and check the effective role against `allowed`.
    pub async fn require_role(&self, allowed: &[RoleKind]) -> Result<EffectiveRole, AuthzError> {
        self.require_authenticated()?;

        let role = self
            .resolved
            .get_or_init(|| self.resolver.resolve(&self.principal))
            .await
            .clone()?;

        if allowed.contains(&role.kind) {
            Ok(role)
        } else {
            tracing::debug!(
                principal_id = %self.principal.id(),
                role = %role.kind,
                "role not in allowed set"
            );
            Err(AuthzError::Forbidden)
        }
    }

    /// Check the memoized role against a resource's tenant.
    ///
    /// Fails `Forbidden` if no role has been resolved successfully yet, so the
    /// scope check can never run ahead of the role check.
    pub fn require_tenant_scope(&self, tenant_id: TenantId) -> Result<(), AuthzError> {
        match self.resolved.get() {
            Some(Ok(role)) => require_tenant_scope(role, tenant_id),
            _ => Err(AuthzError::Forbidden),
        }
    }

    /// Visibility filter for persistence calls; `Deny` until a role is resolved.
    pub fn scope_filter(&self) -> TenantScopeFilter {
        match self.resolved.get() {
            Some(Ok(role)) => role.scope_filter(),
            _ => TenantScopeFilter::Deny,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
