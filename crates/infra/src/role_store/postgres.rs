//! Postgres-backed role store.
//!
//! Reads `role_assignments` (see `migrations/0001_authz.sql`). The query never
//! assumes a single row per principal; duplicates come back as-is and the
//! resolver reduces them.
//!
//! ## Error Mapping
//!
//! | SQLx error | RoleStoreError |
//! |------------|----------------|
//! | `PoolClosed`, `PoolTimedOut`, `Io`, `Database` | `Unavailable` |
//! | column decode failures | `Malformed` |
//!
//! Rows naming a role kind outside the known set are skipped with a warning.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::instrument;
use uuid::Uuid;

use bookwell_auth::{PrincipalId, RoleAssignment, RoleKind, RoleStore, RoleStoreError};
use bookwell_core::{AssignmentId, TenantId};

#[derive(Debug, Clone)]
pub struct PostgresRoleStore {
    pool: Arc<PgPool>,
}

impl PostgresRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl RoleStore for PostgresRoleStore {
    #[instrument(skip(self), fields(principal_id = %principal_id), err)]
    async fn list_active_role_assignments(
        &self,
        principal_id: PrincipalId,
    ) -> Result<Vec<RoleAssignment>, RoleStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                assignment_id,
                principal_id,
                role,
                tenant_id,
                active,
                created_at
            FROM role_assignments
            WHERE principal_id = $1 AND active
            ORDER BY created_at ASC, assignment_id ASC
            "#,
        )
        .bind(principal_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_active_role_assignments", e))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(assignment) = decode_row(&row)? {
                out.push(assignment);
            }
        }
        Ok(out)
    }
}

fn decode_row(row: &PgRow) -> Result<Option<RoleAssignment>, RoleStoreError> {
    let malformed = |e: sqlx::Error| RoleStoreError::Malformed(e.to_string());

    let id: Uuid = row.try_get("assignment_id").map_err(malformed)?;
    let principal_id: Uuid = row.try_get("principal_id").map_err(malformed)?;
    let role: String = row.try_get("role").map_err(malformed)?;
    let tenant_id: Option<Uuid> = row.try_get("tenant_id").map_err(malformed)?;
    let active: bool = row.try_get("active").map_err(malformed)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(malformed)?;

    let role = match role.parse::<RoleKind>() {
        Ok(kind) => kind,
        Err(e) => {
            tracing::warn!(assignment_id = %id, error = %e, "skipping role assignment");
            return Ok(None);
        }
    };

    Ok(Some(RoleAssignment {
        id: AssignmentId::from_uuid(id),
        principal_id: PrincipalId::from_uuid(principal_id),
        role,
        tenant_id: tenant_id.map(TenantId::from_uuid),
        active,
        created_at,
    }))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RoleStoreError {
    match err {
        sqlx::Error::Database(db_err) => RoleStoreError::Unavailable(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            RoleStoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            RoleStoreError::Malformed(format!("decode error in {}: {}", operation, err))
        }
        _ => RoleStoreError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}
