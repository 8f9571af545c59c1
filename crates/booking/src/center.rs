use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bookwell_core::{DomainError, DomainResult, TenantId};

/// A medical center: the unit of tenancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Center {
    pub id: TenantId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Center {
    pub fn register(name: impl Into<String>, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("center name cannot be empty"));
        }

        Ok(Self {
            id: TenantId::new(),
            name: name.to_string(),
            created_at: now,
        })
    }
}
