//! `bookwell-core`: shared identifiers and the domain error model.
//!
//! No infrastructure concerns live here.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{AppointmentId, AssignmentId, TenantId};
