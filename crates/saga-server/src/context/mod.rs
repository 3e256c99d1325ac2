//! Request context: session resolution and the per-request actor.
//!
//! The actor is resolved once per request by the `CurrentActor` extractor
//! and discarded afterwards.

pub mod actor;
pub mod session;

pub use actor::{resolve_actor, CurrentActor};
pub use session::{InMemorySessionStore, SessionEntry, SessionStore};
