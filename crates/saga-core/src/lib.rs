//! SAGA core: the access model and error surface shared by the server and
//! any other consumer.
//!
//! This crate carries no runtime or transport dependencies. Access decisions
//! are pure functions over an immutable [`access::PermissionTable`].
//!
//! Panics, `unwrap`, and `expect` are compile-denied here; every fallible path
//! surfaces as [`SagaError`].

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod access;
pub mod error;

/// Shared result type.
pub use error::{ClientCode, Result, SagaError};
