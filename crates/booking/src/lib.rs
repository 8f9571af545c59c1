//! Booking domain: the tenant-scoped resources administrators act on.
//!
//! Pure data and validation; storage and authorization live elsewhere.

pub mod appointment;
pub mod center;
pub mod tenant;

pub use appointment::{Appointment, AppointmentStatus};
pub use center::Center;
pub use tenant::TenantScoped;
