use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use bookwell_core::AppointmentId;
use bookwell_infra::ScopedStore;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::{self, ADMIN_ROLES};
use crate::context::RequestIdentity;

pub fn router() -> Router {
    Router::new().route(
        "/:id",
        get(get_appointment)
            .patch(update_appointment)
            .delete(delete_appointment),
    )
}

pub async fn get_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let guard = services.guard(&identity);
    authz::authorize(&guard, services.denial(), ADMIN_ROLES).await?;

    let appointment_id: AppointmentId = dto::parse_id(&id)?;
    let appointment = services
        .appointments
        .get(guard.scope_filter(), appointment_id)
        .await
        .map_err(|e| services.storage_failure(e))?
        .ok_or(ApiError::NotFound)?;
    guard
        .require_tenant_scope(appointment.tenant_id)
        .map_err(|e| services.reject(&e))?;

    Ok(Json(dto::appointment_to_json(appointment)).into_response())
}

pub async fn update_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateAppointmentRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let guard = services.guard(&identity);
    authz::authorize(&guard, services.denial(), ADMIN_ROLES).await?;

    let appointment_id: AppointmentId = dto::parse_id(&id)?;
    let scope = guard.scope_filter();
    let mut appointment = services
        .appointments
        .get(scope, appointment_id)
        .await
        .map_err(|e| services.storage_failure(e))?
        .ok_or(ApiError::NotFound)?;
    guard
        .require_tenant_scope(appointment.tenant_id)
        .map_err(|e| services.reject(&e))?;

    let body = dto::json_body(body)?;
    let status = dto::parse_status(&body.status)?;
    appointment.transition(status)?;

    let updated = services
        .appointments
        .update(scope, appointment.clone())
        .await
        .map_err(|e| services.storage_failure(e))?;
    if !updated {
        return Err(ApiError::NotFound);
    }

    tracing::info!(
        appointment_id = %appointment.id,
        status = appointment.status.as_str(),
        principal_id = %guard.principal().id(),
        "appointment updated"
    );
    Ok(Json(dto::appointment_to_json(appointment)).into_response())
}

pub async fn delete_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let guard = services.guard(&identity);
    authz::authorize(&guard, services.denial(), ADMIN_ROLES).await?;

    let appointment_id: AppointmentId = dto::parse_id(&id)?;
    let deleted = services
        .appointments
        .delete(guard.scope_filter(), appointment_id)
        .await
        .map_err(|e| services.storage_failure(e))?;
    if !deleted {
        return Err(ApiError::NotFound);
    }

    tracing::info!(appointment_id = %appointment_id, principal_id = %guard.principal().id(), "appointment deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}
