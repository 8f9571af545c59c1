use std::sync::RwLock;

use chrono::{DateTime, Utc};

use bookwell_auth::{PrincipalId, RoleAssignment, RoleKind, RoleStore, RoleStoreError};
use bookwell_core::{AssignmentId, TenantId};

/// In-memory role store for tests/dev.
///
/// Behaves like the table it stands in for: no uniqueness on grants, rows are
/// deactivated rather than removed, and reads return duplicates verbatim.
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    rows: RwLock<Vec<RoleAssignment>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision an active grant and return its row id.
    pub fn grant(
        &self,
        principal_id: PrincipalId,
        role: RoleKind,
        tenant_id: Option<TenantId>,
    ) -> AssignmentId {
        self.grant_at(principal_id, role, tenant_id, Utc::now())
    }

    pub fn grant_at(
        &self,
        principal_id: PrincipalId,
        role: RoleKind,
        tenant_id: Option<TenantId>,
        created_at: DateTime<Utc>,
    ) -> AssignmentId {
        let id = AssignmentId::new();
        self.insert(RoleAssignment {
            id,
            principal_id,
            role,
            tenant_id,
            active: true,
            created_at,
        });
        id
    }

    pub fn insert(&self, row: RoleAssignment) {
        if let Ok(mut rows) = self.rows.write() {
            rows.push(row);
        }
    }

    /// Flip the active flag on a row. Returns `false` if the row does not exist.
    pub fn set_active(&self, assignment_id: AssignmentId, active: bool) -> bool {
        let Ok(mut rows) = self.rows.write() else {
            return false;
        };
        match rows.iter_mut().find(|r| r.id == assignment_id) {
            Some(row) => {
                row.active = active;
                true
            }
            None => false,
        }
    }

    pub fn deactivate(&self, assignment_id: AssignmentId) -> bool {
        self.set_active(assignment_id, false)
    }
}

#[async_trait::async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn list_active_role_assignments(
        &self,
        principal_id: PrincipalId,
    ) -> Result<Vec<RoleAssignment>, RoleStoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| RoleStoreError::Unavailable("role store lock poisoned".to_string()))?;

        let mut out: Vec<RoleAssignment> = rows
            .iter()
            .filter(|r| r.principal_id == principal_id && r.active)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }
}
