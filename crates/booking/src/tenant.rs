use bookwell_core::{AppointmentId, TenantId};

use crate::{Appointment, Center};

/// A resource owned by exactly one tenant.
///
/// Stores use this to apply a tenant-scope filter to every read and write
/// without knowing the concrete resource type.
pub trait TenantScoped {
    type Key: Copy + Ord + core::hash::Hash + core::fmt::Debug + Send + Sync + 'static;

    fn key(&self) -> Self::Key;
    fn tenant_id(&self) -> TenantId;
}

impl TenantScoped for Center {
    type Key = TenantId;

    fn key(&self) -> TenantId {
        self.id
    }

    /// A center is its own tenant.
    fn tenant_id(&self) -> TenantId {
        self.id
    }
}

impl TenantScoped for Appointment {
    type Key = AppointmentId;

    fn key(&self) -> AppointmentId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
