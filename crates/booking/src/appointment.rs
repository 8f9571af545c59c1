use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bookwell_core::{AppointmentId, DomainError, DomainResult, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl core::str::FromStr for AppointmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown appointment status '{other}'"
            ))),
        }
    }
}

/// An appointment booked at one center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub tenant_id: TenantId,
    pub patient_name: String,
    pub starts_at: DateTime<Utc>,
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn book(
        tenant_id: TenantId,
        patient_name: impl Into<String>,
        starts_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let patient_name = patient_name.into();
        let patient_name = patient_name.trim();
        if patient_name.is_empty() {
            return Err(DomainError::validation("patient name cannot be empty"));
        }

        Ok(Self {
            id: AppointmentId::new(),
            tenant_id,
            patient_name: patient_name.to_string(),
            starts_at,
            status: AppointmentStatus::Scheduled,
        })
    }

    /// Move a scheduled appointment to `next`.
    ///
    /// Completed and cancelled appointments are final.
    pub fn transition(&mut self, next: AppointmentStatus) -> DomainResult<()> {
        if self.status == next {
            return Ok(());
        }
        if self.status != AppointmentStatus::Scheduled {
            return Err(DomainError::invariant(format!(
                "appointment is already {}",
                self.status.as_str()
            )));
        }
        self.status = next;
        Ok(())
    }
}
