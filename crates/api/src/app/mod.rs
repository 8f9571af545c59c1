//! HTTP application wiring (Axum router + store wiring).
//!
//! - `services.rs`: store wiring and per-request guards
//! - `routes/`: admin handlers, one file per resource
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: client-facing error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::identity::{IdentityAdapter, JwtIdentityAdapter};
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router from configuration (used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let identity: Arc<dyn IdentityAdapter> =
        Arc::new(JwtIdentityAdapter::new(config.jwt_secret.as_bytes()));
    let services = Arc::new(services::build_services(config).await?);
    Ok(build_app_with(services, identity))
}

/// Build the router around pre-built services and identity adapter.
pub fn build_app_with(
    services: Arc<services::AppServices>,
    identity: Arc<dyn IdentityAdapter>,
) -> Router {
    let identity_state = middleware::IdentityState { identity };

    let admin = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            identity_state,
            middleware::identity_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/admin", admin)
        .layer(ServiceBuilder::new())
}
