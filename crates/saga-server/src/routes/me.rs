use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use saga_core::access::{Action, Permission, ResourceKind};
use saga_core::error::SagaError;

use crate::app_state::AppState;
use crate::context::CurrentActor;
use crate::error::ApiResult;
use crate::store::to_value;

pub async fn show(State(state): State<AppState>, who: CurrentActor) -> ApiResult<Json<Value>> {
    let actor = who.require()?;
    let user = state
        .store()
        .user(&actor.user_id)
        .ok_or_else(|| SagaError::NotFound(format!("user {}", actor.user_id)))?;

    let grant = state
        .authorizer()
        .require_global(who.get(), Permission::own(Action::Read), ResourceKind::User)?;

    Ok(Json(json!({
        "user": grant.filter(&to_value(&user)),
        "universe_id": actor.universe_id,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchUniverse {
    pub universe_id: Option<String>,
}

/// Select the universe the session acts within (or leave it with `null`).
pub async fn switch_universe(
    State(state): State<AppState>,
    who: CurrentActor,
    Json(req): Json<SwitchUniverse>,
) -> ApiResult<Json<Value>> {
    let actor = who.require()?;

    if let Some(uid) = &req.universe_id {
        let universe = state
            .store()
            .universe(uid)
            .ok_or_else(|| SagaError::NotFound(format!("universe {uid}")))?;
        let perm = Permission::for_owner(Action::Read, actor.owns(&universe.owner_id));
        state
            .authorizer()
            .require_global(who.get(), perm, ResourceKind::Universe)?;
    }

    let token = who.token.as_deref().ok_or(SagaError::Unauthenticated)?;
    if !state.sessions().set_universe(token, req.universe_id.clone()) {
        return Err(SagaError::Unauthenticated.into());
    }

    tracing::info!(user = %actor.user_id, universe = ?req.universe_id, "current universe switched");
    Ok(Json(json!({ "universe_id": req.universe_id })))
}
