//! Tenant-scoped storage for protected resources.

pub mod postgres;
pub mod scoped_store;

pub use postgres::{PostgresAppointmentStore, PostgresCenterStore};
pub use scoped_store::{InMemoryScopedStore, ScopedStore, StoreError};
