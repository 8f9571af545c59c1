//! Reduction of a principal's stored role rows to one [`EffectiveRole`].
//!
//! The store may hand back any number of rows for a principal, duplicates
//! included. Resolution never depends on there being exactly one row: it takes
//! the full active set and reduces it by rank.
//!
//! 1. Drop inactive rows, rows for another principal, and malformed rows.
//! 2. Keep only the highest-ranked kind.
//! 3. Order that tier by `(created_at, id)` and take the first row.
//! 4. If the tier disagrees on scope, apply the [`ScopeConflictPolicy`].

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::{AuthzError, EffectiveRole, Principal, PrincipalId, RoleAssignment};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleStoreError {
    #[error("role store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed role record: {0}")]
    Malformed(String),
}

/// Read-only access to stored role assignments.
///
/// Implementations must return every matching active row, duplicates
/// included, and must not fail because more than one row matches.
#[async_trait::async_trait]
pub trait RoleStore: Send + Sync {
    async fn list_active_role_assignments(
        &self,
        principal_id: PrincipalId,
    ) -> Result<Vec<RoleAssignment>, RoleStoreError>;
}

#[async_trait::async_trait]
impl<S> RoleStore for Arc<S>
where
    S: RoleStore + ?Sized,
{
    async fn list_active_role_assignments(
        &self,
        principal_id: PrincipalId,
    ) -> Result<Vec<RoleAssignment>, RoleStoreError> {
        (**self).list_active_role_assignments(principal_id).await
    }
}

/// What to do when the winning tier holds assignments for different tenants.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ScopeConflictPolicy {
    /// Refuse to pick; resolution fails closed as `Forbidden`.
    #[default]
    Deny,
    /// The most recently created assignment wins.
    MostRecent,
}

impl FromStr for ScopeConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deny" => Ok(ScopeConflictPolicy::Deny),
            "most_recent" | "most-recent" => Ok(ScopeConflictPolicy::MostRecent),
            other => Err(format!(
                "unknown scope conflict policy '{other}' (expected 'deny' or 'most_recent')"
            )),
        }
    }
}

/// Reduce role rows to the effective role for `principal_id`.
///
/// Pure; no IO. Fails `NoRole` when no usable row remains and `Forbidden`
/// on an unresolved scope conflict.
pub fn reduce_assignments(
    principal_id: PrincipalId,
    assignments: &[RoleAssignment],
    policy: ScopeConflictPolicy,
) -> Result<EffectiveRole, AuthzError> {
    let mut usable = Vec::with_capacity(assignments.len());
    for row in assignments {
        if !row.active {
            continue;
        }
        if row.principal_id != principal_id {
            tracing::warn!(
                principal_id = %principal_id,
                assignment_id = %row.id,
                "role store returned a row for another principal; ignoring"
            );
            continue;
        }
        match row.scope() {
            Some(scope) => usable.push((row, scope)),
            None => tracing::warn!(
                principal_id = %principal_id,
                assignment_id = %row.id,
                role = %row.role,
                "scoped role assignment without tenant; ignoring"
            ),
        }
    }

    let Some(top_rank) = usable.iter().map(|(row, _)| row.role.rank()).max() else {
        return Err(AuthzError::NoRole);
    };

    let mut tier: Vec<_> = usable
        .into_iter()
        .filter(|(row, _)| row.role.rank() == top_rank)
        .collect();
    tier.sort_by(|(a, _), (b, _)| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let (first, first_scope) = tier[0];
    if tier.iter().all(|(_, scope)| *scope == first_scope) {
        return Ok(EffectiveRole::new(first.role, first_scope));
    }

    match policy {
        ScopeConflictPolicy::Deny => {
            tracing::warn!(
                principal_id = %principal_id,
                role = %first.role,
                assignments = tier.len(),
                "conflicting scopes among equally-privileged assignments; denying"
            );
            Err(AuthzError::Forbidden)
        }
        ScopeConflictPolicy::MostRecent => {
            let (latest, latest_scope) = tier[tier.len() - 1];
            tracing::warn!(
                principal_id = %principal_id,
                role = %latest.role,
                assignment_id = %latest.id,
                assignments = tier.len(),
                "conflicting scopes among equally-privileged assignments; using most recent"
            );
            Ok(EffectiveRole::new(latest.role, latest_scope))
        }
    }
}

/// Loads a principal's active role rows and reduces them.
///
/// Holds no cache of its own; callers memoize per request (see
/// [`crate::AccessGuard`]).
pub struct AuthorizationResolver<S: ?Sized> {
    store: Arc<S>,
    policy: ScopeConflictPolicy,
}

impl<S: ?Sized> Clone for AuthorizationResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            policy: self.policy,
        }
    }
}

impl<S> AuthorizationResolver<S>
where
    S: RoleStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            policy: ScopeConflictPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ScopeConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ScopeConflictPolicy {
        self.policy
    }

    pub async fn resolve(&self, principal: &Principal) -> Result<EffectiveRole, AuthzError> {
        if !principal.is_authenticated() {
            return Err(AuthzError::Unauthenticated);
        }

        let principal_id = principal.id();
        let rows = self
            .store
            .list_active_role_assignments(principal_id)
            .await
            .map_err(|e| {
                tracing::warn!(principal_id = %principal_id, error = %e, "role lookup failed");
                AuthzError::DataAccessFailure(e.to_string())
            })?;

        let role = reduce_assignments(principal_id, &rows, self.policy)?;
        tracing::debug!(
            principal_id = %principal_id,
            role = %role.kind,
            rows = rows.len(),
            "role resolved"
        );
        Ok(role)
    }
}
