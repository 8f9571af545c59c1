//! Store wiring shared by all admin handlers.

use std::sync::Arc;

use bookwell_auth::{
    AccessGuard, AuthorizationResolver, AuthzError, DenialPolicy, RoleStore, ScopeConflictPolicy,
};
use bookwell_booking::{Appointment, Center};
use bookwell_infra::read_model::{PostgresAppointmentStore, PostgresCenterStore};
use bookwell_infra::role_store::PostgresRoleStore;
use bookwell_infra::{InMemoryRoleStore, InMemoryScopedStore, ScopedStore, StoreError, db};

use crate::app::errors::ApiError;
use crate::authz;
use crate::config::ApiConfig;
use crate::context::RequestIdentity;

pub struct AppServices {
    pub roles: Arc<dyn RoleStore>,
    pub centers: Arc<dyn ScopedStore<Center>>,
    pub appointments: Arc<dyn ScopedStore<Appointment>>,
    scope_conflict: ScopeConflictPolicy,
    denial: DenialPolicy,
}

impl AppServices {
    pub fn new(
        roles: Arc<dyn RoleStore>,
        centers: Arc<dyn ScopedStore<Center>>,
        appointments: Arc<dyn ScopedStore<Appointment>>,
    ) -> Self {
        Self {
            roles,
            centers,
            appointments,
            scope_conflict: ScopeConflictPolicy::default(),
            denial: DenialPolicy::default(),
        }
    }

    pub fn with_policies(mut self, scope_conflict: ScopeConflictPolicy, denial: DenialPolicy) -> Self {
        self.scope_conflict = scope_conflict;
        self.denial = denial;
        self
    }

    /// Fresh guard for one request. Roles are re-read on every request.
    pub fn guard(&self, identity: &RequestIdentity) -> AccessGuard<dyn RoleStore> {
        let resolver =
            AuthorizationResolver::new(self.roles.clone()).with_policy(self.scope_conflict);
        AccessGuard::new(identity.principal(), resolver)
    }

    pub fn denial(&self) -> &DenialPolicy {
        &self.denial
    }

    pub fn reject(&self, err: &AuthzError) -> ApiError {
        authz::reject(&self.denial, err)
    }

    /// Storage failure after authorization: fail closed like any other denial.
    pub fn storage_failure(&self, err: StoreError) -> ApiError {
        self.reject(&AuthzError::DataAccessFailure(err.to_string()))
    }
}

/// Build stores from configuration: Postgres when `DATABASE_URL` is set,
/// in-memory otherwise.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let services = match &config.database_url {
        Some(url) => {
            let pool = db::connect(url, config.db_max_connections).await?;
            db::ensure_schema(&pool).await?;
            tracing::info!("using postgres stores");
            AppServices::new(
                Arc::new(PostgresRoleStore::new(pool.clone())),
                Arc::new(PostgresCenterStore::new(pool.clone())),
                Arc::new(PostgresAppointmentStore::new(pool)),
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            AppServices::new(
                Arc::new(InMemoryRoleStore::new()),
                Arc::new(InMemoryScopedStore::<Center>::new()),
                Arc::new(InMemoryScopedStore::<Appointment>::new()),
            )
        }
    };

    Ok(services.with_policies(config.scope_conflict_policy, config.denial_policy()))
}
