use axum::Json;
use axum::extract::rejection::JsonRejection;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use bookwell_auth::{EffectiveRole, Principal};
use bookwell_booking::{Appointment, AppointmentStatus, Center};

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterCenterRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_name: String,
    pub starts_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub status: String,
}

// -------------------------
// Mapping helpers
// -------------------------

/// Parse a path id. A malformed id is reported as not-found so it cannot be
/// told apart from a well-formed id the caller may not see.
pub fn parse_id<T: std::str::FromStr>(raw: &str) -> Result<T, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

/// Unwrap a JSON body whose extraction was deferred until after the guard ran.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

pub fn parse_status(raw: &str) -> Result<AppointmentStatus, ApiError> {
    raw.parse::<AppointmentStatus>().map_err(ApiError::from)
}

pub fn center_to_json(c: Center) -> serde_json::Value {
    serde_json::json!({
        "id": c.id.to_string(),
        "name": c.name,
        "created_at": c.created_at.to_rfc3339(),
    })
}

pub fn appointment_to_json(a: Appointment) -> serde_json::Value {
    serde_json::json!({
        "id": a.id.to_string(),
        "center_id": a.tenant_id.to_string(),
        "patient_name": a.patient_name,
        "starts_at": a.starts_at.to_rfc3339(),
        "status": a.status.as_str(),
    })
}

pub fn whoami_to_json(principal: &Principal, role: &EffectiveRole) -> serde_json::Value {
    serde_json::json!({
        "principal_id": principal.id().to_string(),
        "role": role.kind.as_str(),
        "center_id": role.tenant_id().map(|t| t.to_string()),
    })
}
