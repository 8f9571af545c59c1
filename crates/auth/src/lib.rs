//! `bookwell-auth`: tenant-scoped administrative authorization.
//!
//! This crate is intentionally decoupled from HTTP and storage: role data is
//! read through [`RoleStore`] and every failure is a value ([`AuthzError`]) that
//! the transport layer turns into a [`Denial`].

pub mod denial;
pub mod error;
pub mod guard;
pub mod principal;
pub mod resolver;
pub mod roles;
pub mod scope;

#[cfg(test)]
pub(crate) mod testing;

pub use denial::{Denial, DenialPolicy};
pub use error::AuthzError;
pub use guard::{AccessGuard, require_tenant_scope};
pub use principal::{Principal, PrincipalId};
pub use resolver::{
    AuthorizationResolver, RoleStore, RoleStoreError, ScopeConflictPolicy, reduce_assignments,
};
pub use roles::{EffectiveRole, RoleAssignment, RoleKind, RoleScope};
pub use scope::TenantScopeFilter;
