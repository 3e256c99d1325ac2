//! Service config loader (strict parsing).

pub mod schema;

use std::fs;

use saga_core::error::{Result, SagaError};

pub use schema::{AccessSection, ServerSection, ServiceConfig, SessionSeed, UniverseSeed, UserSeed};

/// Environment variable overriding the config path.
pub const CONFIG_PATH_ENV: &str = "SAGA_CONFIG";

pub fn load_from_file(path: &str) -> Result<ServiceConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| SagaError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServiceConfig> {
    let cfg: ServiceConfig = serde_yaml::from_str(s)
        .map_err(|e| SagaError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
