use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bookwell_core::{AssignmentId, TenantId};

use crate::PrincipalId;
use crate::scope::TenantScopeFilter;

/// Administrative role kinds, ordered by privilege.
///
/// The set is closed: adding a kind means deciding its rank and whether it
/// must carry a tenant scope.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    /// Platform operator; unrestricted across all centers.
    SuperAdmin,
    /// Administrator of exactly one center.
    CenterAdmin,
    /// Center staff member. Holds no administrative grant.
    Staff,
}

impl RoleKind {
    pub const ALL: [RoleKind; 3] = [RoleKind::SuperAdmin, RoleKind::CenterAdmin, RoleKind::Staff];

    /// Higher rank wins during resolution.
    pub fn rank(self) -> u8 {
        match self {
            RoleKind::SuperAdmin => 2,
            RoleKind::CenterAdmin => 1,
            RoleKind::Staff => 0,
        }
    }

    /// Whether a stored assignment of this kind must name a tenant.
    pub fn requires_scope(self) -> bool {
        !matches!(self, RoleKind::SuperAdmin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoleKind::SuperAdmin => "super_admin",
            RoleKind::CenterAdmin => "center_admin",
            RoleKind::Staff => "staff",
        }
    }
}

impl core::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored role name is not part of the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role kind '{0}'")]
pub struct UnknownRoleKind(pub String);

impl FromStr for RoleKind {
    type Err = UnknownRoleKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownRoleKind(s.to_string()))
    }
}

/// Tenant boundary of a role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "tenant_id")]
pub enum RoleScope {
    Unrestricted,
    Tenant(TenantId),
}

/// A stored grant of a role kind, optionally scoped to a tenant.
///
/// Rows are provisioned elsewhere; this crate only reads them. Duplicates
/// (same principal, kind and scope) are legal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub id: AssignmentId,
    pub principal_id: PrincipalId,
    pub role: RoleKind,
    pub tenant_id: Option<TenantId>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl RoleAssignment {
    /// Scope this row grants, or `None` when the row is malformed (a scoped
    /// kind without a tenant). A super admin's tenant column is ignored.
    pub fn scope(&self) -> Option<RoleScope> {
        if !self.role.requires_scope() {
            return Some(RoleScope::Unrestricted);
        }
        self.tenant_id.map(RoleScope::Tenant)
    }
}

/// The single role selected for authorization decisions in one request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveRole {
    pub kind: RoleKind,
    pub scope: RoleScope,
}

impl EffectiveRole {
    pub fn new(kind: RoleKind, scope: RoleScope) -> Self {
        Self { kind, scope }
    }

    pub fn super_admin() -> Self {
        Self::new(RoleKind::SuperAdmin, RoleScope::Unrestricted)
    }

    pub fn center_admin(tenant_id: TenantId) -> Self {
        Self::new(RoleKind::CenterAdmin, RoleScope::Tenant(tenant_id))
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        match self.scope {
            RoleScope::Unrestricted => None,
            RoleScope::Tenant(t) => Some(t),
        }
    }

    pub fn scope_filter(&self) -> TenantScopeFilter {
        TenantScopeFilter::for_role(self)
    }
}
