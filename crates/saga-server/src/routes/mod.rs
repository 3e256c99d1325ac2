//! Route handlers.
//!
//! Each handler follows the same order: resolve the actor (401), load the
//! target (404), make one decision through the authorizer (403), then act.

pub mod admin;
pub mod me;
pub mod records;
pub mod universes;
pub mod users;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use saga_core::error::{Result, SagaError};

/// Decode a JSON object already checked for writable keys.
fn decode<T: DeserializeOwned>(body: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(body))
        .map_err(|e| SagaError::BadRequest(format!("invalid body: {e}")))
}

fn keys(body: &Map<String, Value>) -> impl Iterator<Item = &str> {
    body.keys().map(String::as_str)
}
