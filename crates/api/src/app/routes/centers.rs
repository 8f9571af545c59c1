use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;

use bookwell_booking::{Appointment, Center};
use bookwell_core::TenantId;
use bookwell_infra::ScopedStore;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::{self, ADMIN_ROLES, PLATFORM_ROLES};
use crate::context::RequestIdentity;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_centers).post(register_center))
        .route("/:id", get(get_center))
        .route("/:id/appointments", get(list_appointments).post(book_appointment))
}

pub async fn list_centers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
) -> Result<Response, ApiError> {
    let guard = services.guard(&identity);
    authz::authorize(&guard, services.denial(), ADMIN_ROLES).await?;

    let items = services
        .centers
        .list(guard.scope_filter())
        .await
        .map_err(|e| services.storage_failure(e))?
        .into_iter()
        .map(dto::center_to_json)
        .collect::<Vec<_>>();

    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}

pub async fn register_center(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    body: Result<Json<dto::RegisterCenterRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let guard = services.guard(&identity);
    authz::authorize(&guard, services.denial(), PLATFORM_ROLES).await?;
    let body = dto::json_body(body)?;

    let center = Center::register(body.name, Utc::now())?;
    let inserted = services
        .centers
        .insert(guard.scope_filter(), center.clone())
        .await
        .map_err(|e| services.storage_failure(e))?;
    if !inserted {
        return Err(ApiError::Conflict("center already exists".to_string()));
    }

    tracing::info!(center_id = %center.id, principal_id = %guard.principal().id(), "center registered");
    Ok((StatusCode::CREATED, Json(dto::center_to_json(center))).into_response())
}

pub async fn get_center(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let guard = services.guard(&identity);
    authz::authorize(&guard, services.denial(), ADMIN_ROLES).await?;

    let center_id: TenantId = dto::parse_id(&id)?;
    guard
        .require_tenant_scope(center_id)
        .map_err(|e| services.reject(&e))?;

    let center = services
        .centers
        .get(guard.scope_filter(), center_id)
        .await
        .map_err(|e| services.storage_failure(e))?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(dto::center_to_json(center)).into_response())
}

pub async fn list_appointments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let guard = services.guard(&identity);
    authz::authorize(&guard, services.denial(), ADMIN_ROLES).await?;

    let center_id: TenantId = dto::parse_id(&id)?;
    guard
        .require_tenant_scope(center_id)
        .map_err(|e| services.reject(&e))?;

    let scope = guard.scope_filter();
    // Unknown center and empty center must not look different from a foreign one.
    services
        .centers
        .get(scope, center_id)
        .await
        .map_err(|e| services.storage_failure(e))?
        .ok_or(ApiError::NotFound)?;

    let items = services
        .appointments
        .list_for_tenant(scope, center_id)
        .await
        .map_err(|e| services.storage_failure(e))?
        .into_iter()
        .map(dto::appointment_to_json)
        .collect::<Vec<_>>();

    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}

pub async fn book_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    body: Result<Json<dto::BookAppointmentRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let guard = services.guard(&identity);
    authz::authorize(&guard, services.denial(), ADMIN_ROLES).await?;

    let center_id: TenantId = dto::parse_id(&id)?;
    guard
        .require_tenant_scope(center_id)
        .map_err(|e| services.reject(&e))?;

    let scope = guard.scope_filter();
    services
        .centers
        .get(scope, center_id)
        .await
        .map_err(|e| services.storage_failure(e))?
        .ok_or(ApiError::NotFound)?;

    let body = dto::json_body(body)?;
    let appointment = Appointment::book(center_id, body.patient_name, body.starts_at)?;
    let inserted = services
        .appointments
        .insert(scope, appointment.clone())
        .await
        .map_err(|e| services.storage_failure(e))?;
    if !inserted {
        return Err(ApiError::Conflict("appointment already exists".to_string()));
    }

    tracing::info!(
        appointment_id = %appointment.id,
        center_id = %center_id,
        principal_id = %guard.principal().id(),
        "appointment booked"
    );
    Ok((StatusCode::CREATED, Json(dto::appointment_to_json(appointment))).into_response())
}
