use axum::{Router, routing::get};

pub mod appointments;
pub mod centers;
pub mod system;

/// Router for the admin surface. Every handler runs its own guard.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/centers", centers::router())
        .nest("/appointments", appointments::router())
}
