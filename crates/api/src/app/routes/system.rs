use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::{self, ADMIN_ROLES};
use crate::context::RequestIdentity;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
) -> Result<Response, ApiError> {
    let guard = services.guard(&identity);
    let role = authz::authorize(&guard, services.denial(), ADMIN_ROLES).await?;

    Ok(Json(dto::whoami_to_json(guard.principal(), &role)).into_response())
}
