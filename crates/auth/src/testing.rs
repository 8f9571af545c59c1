use chrono::Utc;

use bookwell_core::{AssignmentId, TenantId};

use crate::{PrincipalId, RoleAssignment, RoleKind, RoleStore, RoleStoreError};

pub fn assignment(
    principal_id: PrincipalId,
    role: RoleKind,
    tenant_id: Option<TenantId>,
) -> RoleAssignment {
    RoleAssignment {
        id: AssignmentId::new(),
        principal_id,
        role,
        tenant_id,
        active: true,
        created_at: Utc::now(),
    }
}

/// Returns a fixed set of rows, filtered by principal and active flag.
pub struct StaticRoleStore {
    rows: Vec<RoleAssignment>,
}

impl StaticRoleStore {
    pub fn new(rows: Vec<RoleAssignment>) -> Self {
        Self { rows }
    }
}

#[async_trait::async_trait]
impl RoleStore for StaticRoleStore {
    async fn list_active_role_assignments(
        &self,
        principal_id: PrincipalId,
    ) -> Result<Vec<RoleAssignment>, RoleStoreError> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.principal_id == principal_id && r.active)
            .cloned()
            .collect())
    }
}

pub struct FailingRoleStore;

#[async_trait::async_trait]
impl RoleStore for FailingRoleStore {
    async fn list_active_role_assignments(
        &self,
        _principal_id: PrincipalId,
    ) -> Result<Vec<RoleAssignment>, RoleStoreError> {
        Err(RoleStoreError::Unavailable("connection refused".to_string()))
    }
}
