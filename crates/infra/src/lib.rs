//! Infrastructure layer: role storage and tenant-scoped resource storage.

pub mod db;
pub mod read_model;
pub mod role_store;

pub use read_model::{InMemoryScopedStore, ScopedStore, StoreError};
pub use role_store::InMemoryRoleStore;
