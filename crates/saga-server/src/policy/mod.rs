//! Route-level authorization.
//!
//! Every route makes exactly one decision through [`Authorizer`], which owns
//! the mapping from a denied grant to a client-visible error.

pub mod guard;

pub use guard::{check_writable, Authorizer};
