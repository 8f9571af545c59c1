use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a principal (administrator account, service account, etc).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for PrincipalId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<PrincipalId> for Uuid {
    fn from(value: PrincipalId) -> Self {
        value.0
    }
}

impl FromStr for PrincipalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// The actor behind a request, as reported by the identity provider.
///
/// An anonymous principal carries the nil id and is never authenticated; the
/// resolver refuses it before touching the role store.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal {
    id: PrincipalId,
    authenticated: bool,
}

impl Principal {
    pub fn authenticated(id: PrincipalId) -> Self {
        Self {
            id,
            authenticated: true,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            id: PrincipalId::from_uuid(Uuid::nil()),
            authenticated: false,
        }
    }

    pub fn id(&self) -> PrincipalId {
        self.id
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
