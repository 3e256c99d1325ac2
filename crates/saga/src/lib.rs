//! Top-level facade crate for SAGA.
//!
//! Re-exports the access model and the HTTP service so users can depend on a single crate.

pub mod core {
    pub use saga_core::*;
}

pub mod server {
    pub use saga_server::*;
}
