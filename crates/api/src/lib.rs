//! HTTP API: admin routes, identity wiring, and denial → response mapping.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod identity;
pub mod middleware;
