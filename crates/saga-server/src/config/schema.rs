use std::collections::HashSet;
use std::net::SocketAddr;

use serde::Deserialize;
use saga_core::access::{compile_rules, Role};
use saga_core::error::{Result, SagaError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    /// Absent => built-in member table.
    #[serde(default)]
    pub access: Option<AccessSection>,

    #[serde(default)]
    pub users: Vec<UserSeed>,

    #[serde(default)]
    pub universes: Vec<UniverseSeed>,

    #[serde(default)]
    pub sessions: Vec<SessionSeed>,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(SagaError::UnsupportedVersion);
        }

        self.server.validate()?;

        if let Some(access) = &self.access {
            compile_rules(&access.member)?;
        }

        let mut ids = HashSet::new();
        let mut emails = HashSet::new();
        for u in &self.users {
            if u.id.is_empty() {
                return Err(SagaError::BadRequest("users[].id must not be empty".into()));
            }
            if !ids.insert(u.id.as_str()) {
                return Err(SagaError::BadRequest(format!("duplicate user id: {}", u.id)));
            }
            if !emails.insert(u.email.to_ascii_lowercase()) {
                return Err(SagaError::BadRequest(format!("duplicate user email: {}", u.email)));
            }
        }

        let mut universes = HashSet::new();
        for u in &self.universes {
            if u.id.is_empty() {
                return Err(SagaError::BadRequest("universes[].id must not be empty".into()));
            }
            if !universes.insert(u.id.as_str()) {
                return Err(SagaError::BadRequest(format!("duplicate universe id: {}", u.id)));
            }
            if !ids.contains(u.owner_id.as_str()) {
                return Err(SagaError::BadRequest(format!(
                    "universe {} owned by unknown user: {}",
                    u.id, u.owner_id
                )));
            }
        }

        for s in &self.sessions {
            if s.token.is_empty() {
                return Err(SagaError::BadRequest("sessions[].token must not be empty".into()));
            }
            if !ids.contains(s.user_id.as_str()) {
                return Err(SagaError::BadRequest(format!(
                    "session refers to unknown user: {}",
                    s.user_id
                )));
            }
            if let Some(uid) = &s.universe_id {
                if !universes.contains(uid.as_str()) {
                    return Err(SagaError::BadRequest(format!(
                        "session refers to unknown universe: {uid}"
                    )));
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            SagaError::BadRequest(format!("server.listen must be a socket address: {}", self.listen))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

/// Member allowances in `kind:permission[:attributes]` form.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessSection {
    #[serde(default)]
    pub member: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserSeed {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub password_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UniverseSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: String,
}

/// Pre-issued session token (session issuance itself lives elsewhere).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSeed {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub universe_id: Option<String>,
}
