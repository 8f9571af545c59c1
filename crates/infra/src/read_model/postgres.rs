//! Postgres-backed scoped stores for centers and appointments.
//!
//! The caller's [`TenantScopeFilter`] is pushed into every statement as a
//! nullable `$tenant` parameter (`$n::uuid IS NULL OR tenant_id = $n`), so the
//! scope check happens in the same statement that reads or writes the row.
//! A `Deny` filter short-circuits before any SQL is issued.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::instrument;
use uuid::Uuid;

use bookwell_auth::TenantScopeFilter;
use bookwell_booking::{Appointment, AppointmentStatus, Center};
use bookwell_core::{AppointmentId, TenantId};

use super::{ScopedStore, StoreError};

/// `None` when the filter admits nothing; otherwise the bind value for the
/// tenant predicate (`Some(None)` = unrestricted).
fn tenant_param(scope: TenantScopeFilter) -> Option<Option<Uuid>> {
    match scope {
        TenantScopeFilter::All => Some(None),
        TenantScopeFilter::Tenant(t) => Some(Some(*t.as_uuid())),
        TenantScopeFilter::Deny => None,
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Unavailable(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Malformed(format!("decode error in {}: {}", operation, err))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn malformed(e: sqlx::Error) -> StoreError {
    StoreError::Malformed(e.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Centers
// ─────────────────────────────────────────────────────────────────────────────

/// Centers are their own tenant, so the tenant predicate applies to `center_id`.
#[derive(Debug, Clone)]
pub struct PostgresCenterStore {
    pool: Arc<PgPool>,
}

impl PostgresCenterStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn decode_center(row: &PgRow) -> Result<Center, StoreError> {
    let id: Uuid = row.try_get("center_id").map_err(malformed)?;
    let name: String = row.try_get("name").map_err(malformed)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(malformed)?;
    Ok(Center {
        id: TenantId::from_uuid(id),
        name,
        created_at,
    })
}

#[async_trait::async_trait]
impl ScopedStore<Center> for PostgresCenterStore {
    #[instrument(skip(self), err)]
    async fn list(&self, scope: TenantScopeFilter) -> Result<Vec<Center>, StoreError> {
        let Some(tenant) = tenant_param(scope) else {
            return Ok(vec![]);
        };

        let rows = sqlx::query(
            r#"
            SELECT center_id, name, created_at
            FROM centers
            WHERE ($1::uuid IS NULL OR center_id = $1)
            ORDER BY created_at ASC, center_id ASC
            "#,
        )
        .bind(tenant)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_centers", e))?;

        rows.iter().map(decode_center).collect()
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn list_for_tenant(
        &self,
        scope: TenantScopeFilter,
        tenant_id: TenantId,
    ) -> Result<Vec<Center>, StoreError> {
        Ok(self.get(scope, tenant_id).await?.into_iter().collect())
    }

    #[instrument(skip(self), fields(center_id = %key), err)]
    async fn get(&self, scope: TenantScopeFilter, key: TenantId) -> Result<Option<Center>, StoreError> {
        let Some(tenant) = tenant_param(scope) else {
            return Ok(None);
        };

        let row = sqlx::query(
            r#"
            SELECT center_id, name, created_at
            FROM centers
            WHERE center_id = $1 AND ($2::uuid IS NULL OR center_id = $2)
            "#,
        )
        .bind(key.as_uuid())
        .bind(tenant)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_center", e))?;

        row.as_ref().map(decode_center).transpose()
    }

    #[instrument(skip(self, value), fields(center_id = %value.id), err)]
    async fn insert(&self, scope: TenantScopeFilter, value: Center) -> Result<bool, StoreError> {
        if !scope.allows(value.id) {
            return Ok(false);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO centers (center_id, name, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (center_id) DO NOTHING
            "#,
        )
        .bind(value.id.as_uuid())
        .bind(&value.name)
        .bind(value.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_center", e))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, value), fields(center_id = %value.id), err)]
    async fn update(&self, scope: TenantScopeFilter, value: Center) -> Result<bool, StoreError> {
        if !scope.allows(value.id) {
            return Ok(false);
        }

        let result = sqlx::query("UPDATE centers SET name = $2 WHERE center_id = $1")
            .bind(value.id.as_uuid())
            .bind(&value.name)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_center", e))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(center_id = %key), err)]
    async fn delete(&self, scope: TenantScopeFilter, key: TenantId) -> Result<bool, StoreError> {
        if !scope.allows(key) {
            return Ok(false);
        }

        let result = sqlx::query("DELETE FROM centers WHERE center_id = $1")
            .bind(key.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_center", e))?;

        Ok(result.rows_affected() == 1)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Appointments
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PostgresAppointmentStore {
    pool: Arc<PgPool>,
}

impl PostgresAppointmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn decode_appointment(row: &PgRow) -> Result<Appointment, StoreError> {
    let id: Uuid = row.try_get("appointment_id").map_err(malformed)?;
    let tenant_id: Uuid = row.try_get("tenant_id").map_err(malformed)?;
    let patient_name: String = row.try_get("patient_name").map_err(malformed)?;
    let starts_at: DateTime<Utc> = row.try_get("starts_at").map_err(malformed)?;
    let status: String = row.try_get("status").map_err(malformed)?;
    let status = status
        .parse::<AppointmentStatus>()
        .map_err(|e| StoreError::Malformed(e.to_string()))?;

    Ok(Appointment {
        id: AppointmentId::from_uuid(id),
        tenant_id: TenantId::from_uuid(tenant_id),
        patient_name,
        starts_at,
        status,
    })
}

#[async_trait::async_trait]
impl ScopedStore<Appointment> for PostgresAppointmentStore {
    #[instrument(skip(self), err)]
    async fn list(&self, scope: TenantScopeFilter) -> Result<Vec<Appointment>, StoreError> {
        let Some(tenant) = tenant_param(scope) else {
            return Ok(vec![]);
        };

        let rows = sqlx::query(
            r#"
            SELECT appointment_id, tenant_id, patient_name, starts_at, status
            FROM appointments
            WHERE ($1::uuid IS NULL OR tenant_id = $1)
            ORDER BY starts_at ASC, appointment_id ASC
            "#,
        )
        .bind(tenant)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_appointments", e))?;

        rows.iter().map(decode_appointment).collect()
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn list_for_tenant(
        &self,
        scope: TenantScopeFilter,
        tenant_id: TenantId,
    ) -> Result<Vec<Appointment>, StoreError> {
        let Some(tenant) = tenant_param(scope) else {
            return Ok(vec![]);
        };

        let rows = sqlx::query(
            r#"
            SELECT appointment_id, tenant_id, patient_name, starts_at, status
            FROM appointments
            WHERE tenant_id = $1 AND ($2::uuid IS NULL OR tenant_id = $2)
            ORDER BY starts_at ASC, appointment_id ASC
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(tenant)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_appointments_for_tenant", e))?;

        rows.iter().map(decode_appointment).collect()
    }

    #[instrument(skip(self), fields(appointment_id = %key), err)]
    async fn get(
        &self,
        scope: TenantScopeFilter,
        key: AppointmentId,
    ) -> Result<Option<Appointment>, StoreError> {
        let Some(tenant) = tenant_param(scope) else {
            return Ok(None);
        };

        let row = sqlx::query(
            r#"
            SELECT appointment_id, tenant_id, patient_name, starts_at, status
            FROM appointments
            WHERE appointment_id = $1 AND ($2::uuid IS NULL OR tenant_id = $2)
            "#,
        )
        .bind(key.as_uuid())
        .bind(tenant)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_appointment", e))?;

        row.as_ref().map(decode_appointment).transpose()
    }

    #[instrument(skip(self, value), fields(appointment_id = %value.id, tenant_id = %value.tenant_id), err)]
    async fn insert(&self, scope: TenantScopeFilter, value: Appointment) -> Result<bool, StoreError> {
        if !scope.allows(value.tenant_id) {
            return Ok(false);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO appointments (appointment_id, tenant_id, patient_name, starts_at, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (appointment_id) DO NOTHING
            "#,
        )
        .bind(value.id.as_uuid())
        .bind(value.tenant_id.as_uuid())
        .bind(&value.patient_name)
        .bind(value.starts_at)
        .bind(value.status.as_str())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_appointment", e))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, value), fields(appointment_id = %value.id, tenant_id = %value.tenant_id), err)]
    async fn update(&self, scope: TenantScopeFilter, value: Appointment) -> Result<bool, StoreError> {
        if !scope.allows(value.tenant_id) {
            return Ok(false);
        }

        // Matching on the stored tenant keeps the row where it is.
        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET patient_name = $3, starts_at = $4, status = $5
            WHERE appointment_id = $1 AND tenant_id = $2
            "#,
        )
        .bind(value.id.as_uuid())
        .bind(value.tenant_id.as_uuid())
        .bind(&value.patient_name)
        .bind(value.starts_at)
        .bind(value.status.as_str())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_appointment", e))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(appointment_id = %key), err)]
    async fn delete(&self, scope: TenantScopeFilter, key: AppointmentId) -> Result<bool, StoreError> {
        let Some(tenant) = tenant_param(scope) else {
            return Ok(false);
        };

        let result = sqlx::query(
            "DELETE FROM appointments WHERE appointment_id = $1 AND ($2::uuid IS NULL OR tenant_id = $2)",
        )
        .bind(key.as_uuid())
        .bind(tenant)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_appointment", e))?;

        Ok(result.rows_affected() == 1)
    }
}
