//! SAGA service library entry.
//!
//! Wires config, session context, route-level authorization, the in-memory
//! store and the HTTP routes into one axum application. Consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod context;
pub mod error;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod router;
pub mod routes;
pub mod store;
