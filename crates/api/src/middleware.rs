use std::sync::Arc;

use axum::{extract::State, middleware::Next, response::Response};

use crate::context::RequestIdentity;
use crate::identity::IdentityAdapter;

#[derive(Clone)]
pub struct IdentityState {
    pub identity: Arc<dyn IdentityAdapter>,
}

/// Attach a [`RequestIdentity`] to every request.
///
/// Never rejects: a missing or invalid token yields an anonymous principal and
/// the route's guard decides what the caller sees.
pub async fn identity_middleware(
    State(state): State<IdentityState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let principal = state.identity.current_principal(req.headers());
    req.extensions_mut().insert(RequestIdentity::new(principal));
    next.run(req).await
}
