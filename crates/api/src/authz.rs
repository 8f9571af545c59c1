//! API-side authorization helpers.
//!
//! Handlers build an [`AccessGuard`] per request, run the role check, then the
//! scope check, and turn any failure into a response through the configured
//! [`DenialPolicy`].

use bookwell_auth::{AccessGuard, AuthzError, DenialPolicy, RoleKind, RoleStore};

use crate::app::errors::ApiError;

/// Roles admitted to the admin surface.
pub const ADMIN_ROLES: &[RoleKind] = &[RoleKind::SuperAdmin, RoleKind::CenterAdmin];

/// Roles allowed to manage the set of centers.
pub const PLATFORM_ROLES: &[RoleKind] = &[RoleKind::SuperAdmin];

/// Convert an authorization failure into its client-visible outcome.
pub fn reject(policy: &DenialPolicy, err: &AuthzError) -> ApiError {
    let denial = policy.deny(err);
    match policy.location(denial) {
        Some(location) => ApiError::Redirect(location.to_string()),
        None => ApiError::NotFound,
    }
}

/// Run the role check for `allowed`, mapping a failure through `policy`.
pub async fn authorize<S>(
    guard: &AccessGuard<S>,
    policy: &DenialPolicy,
    allowed: &[RoleKind],
) -> Result<bookwell_auth::EffectiveRole, ApiError>
where
    S: RoleStore + ?Sized,
{
    guard.require_role(allowed).await.map_err(|e| reject(policy, &e))
}
