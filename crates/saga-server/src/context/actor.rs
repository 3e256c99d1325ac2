use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use saga_core::access::Actor;
use saga_core::error::{Result, SagaError};

use crate::app_state::AppState;

/// Caller resolved from the `Authorization: Bearer` header. `None` when the
/// header is missing or the token/user is unknown; routes decide what that
/// means.
#[derive(Debug, Clone)]
pub struct CurrentActor {
    pub actor: Option<Actor>,
    pub token: Option<String>,
}

impl CurrentActor {
    pub fn get(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    /// The actor, or `Unauthenticated`.
    pub fn require(&self) -> Result<&Actor> {
        self.actor.as_ref().ok_or(SagaError::Unauthenticated)
    }
}

fn bearer(parts: &Parts) -> Option<String> {
    let raw = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Build the actor for a token: session first, then the user record for the role.
pub fn resolve_actor(state: &AppState, token: &str) -> Option<Actor> {
    let session = state.sessions().resolve(token)?;
    let user = state.store().user(&session.user_id)?;
    Some(Actor {
        user_id: user.id,
        role: user.role,
        universe_id: session.universe_id,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let token = bearer(parts);
        let actor = token.as_deref().and_then(|t| resolve_actor(state, t));
        Ok(Self { actor, token })
    }
}
