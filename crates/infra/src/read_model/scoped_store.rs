use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use bookwell_auth::TenantScopeFilter;
use bookwell_booking::TenantScoped;
use bookwell_core::TenantId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Tenant-scoped storage for protected resources.
///
/// Every call takes the caller's [`TenantScopeFilter`] and applies it to the
/// rows actually read or written. A row outside the filter is reported exactly
/// like a row that does not exist (`None` / `false`), and a `Deny` filter
/// never touches storage. Updates cannot move a resource to another tenant.
#[async_trait::async_trait]
pub trait ScopedStore<V>: Send + Sync
where
    V: TenantScoped + Clone + Send + Sync + 'static,
{
    async fn list(&self, scope: TenantScopeFilter) -> Result<Vec<V>, StoreError>;

    /// Collection query narrowed to one tenant, still subject to `scope`.
    async fn list_for_tenant(
        &self,
        scope: TenantScopeFilter,
        tenant_id: TenantId,
    ) -> Result<Vec<V>, StoreError>;

    async fn get(&self, scope: TenantScopeFilter, key: V::Key) -> Result<Option<V>, StoreError>;

    /// Returns `false` when `value`'s tenant is outside `scope` or the key is taken.
    async fn insert(&self, scope: TenantScopeFilter, value: V) -> Result<bool, StoreError>;

    /// Returns `false` when the stored row is missing, outside `scope`, or owned
    /// by a different tenant than `value`.
    async fn update(&self, scope: TenantScopeFilter, value: V) -> Result<bool, StoreError>;

    async fn delete(&self, scope: TenantScopeFilter, key: V::Key) -> Result<bool, StoreError>;
}

#[async_trait::async_trait]
impl<V, S> ScopedStore<V> for Arc<S>
where
    V: TenantScoped + Clone + Send + Sync + 'static,
    S: ScopedStore<V> + ?Sized,
{
    async fn list(&self, scope: TenantScopeFilter) -> Result<Vec<V>, StoreError> {
        (**self).list(scope).await
    }

    async fn list_for_tenant(
        &self,
        scope: TenantScopeFilter,
        tenant_id: TenantId,
    ) -> Result<Vec<V>, StoreError> {
        (**self).list_for_tenant(scope, tenant_id).await
    }

    async fn get(&self, scope: TenantScopeFilter, key: V::Key) -> Result<Option<V>, StoreError> {
        (**self).get(scope, key).await
    }

    async fn insert(&self, scope: TenantScopeFilter, value: V) -> Result<bool, StoreError> {
        (**self).insert(scope, value).await
    }

    async fn update(&self, scope: TenantScopeFilter, value: V) -> Result<bool, StoreError> {
        (**self).update(scope, value).await
    }

    async fn delete(&self, scope: TenantScopeFilter, key: V::Key) -> Result<bool, StoreError> {
        (**self).delete(scope, key).await
    }
}

/// In-memory scoped store for tests/dev.
#[derive(Debug)]
pub struct InMemoryScopedStore<V: TenantScoped> {
    inner: RwLock<BTreeMap<V::Key, V>>,
}

impl<V: TenantScoped> InMemoryScopedStore<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<V: TenantScoped> Default for InMemoryScopedStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

#[async_trait::async_trait]
impl<V> ScopedStore<V> for InMemoryScopedStore<V>
where
    V: TenantScoped + Clone + Send + Sync + 'static,
{
    async fn list(&self, scope: TenantScopeFilter) -> Result<Vec<V>, StoreError> {
        if scope.is_deny() {
            return Ok(vec![]);
        }
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .values()
            .filter(|v| scope.allows(v.tenant_id()))
            .cloned()
            .collect())
    }

    async fn list_for_tenant(
        &self,
        scope: TenantScopeFilter,
        tenant_id: TenantId,
    ) -> Result<Vec<V>, StoreError> {
        if !scope.allows(tenant_id) {
            return Ok(vec![]);
        }
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .values()
            .filter(|v| v.tenant_id() == tenant_id)
            .cloned()
            .collect())
    }

    async fn get(&self, scope: TenantScopeFilter, key: V::Key) -> Result<Option<V>, StoreError> {
        if scope.is_deny() {
            return Ok(None);
        }
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&key).filter(|v| scope.allows(v.tenant_id())).cloned())
    }

    async fn insert(&self, scope: TenantScopeFilter, value: V) -> Result<bool, StoreError> {
        if !scope.allows(value.tenant_id()) {
            return Ok(false);
        }
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&value.key()) {
            return Ok(false);
        }
        map.insert(value.key(), value);
        Ok(true)
    }

    async fn update(&self, scope: TenantScopeFilter, value: V) -> Result<bool, StoreError> {
        if !scope.allows(value.tenant_id()) {
            return Ok(false);
        }
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(&value.key()) {
            Some(existing) if existing.tenant_id() == value.tenant_id() => {
                *existing = value;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, scope: TenantScopeFilter, key: V::Key) -> Result<bool, StoreError> {
        if scope.is_deny() {
            return Ok(false);
        }
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get(&key) {
            Some(existing) if scope.allows(existing.tenant_id()) => {
                map.remove(&key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
