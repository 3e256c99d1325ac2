use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use saga_core::access::{Action, Permission, ResourceKind};
use saga_core::error::{Result, SagaError};

use crate::app_state::AppState;
use crate::context::CurrentActor;
use crate::error::ApiResult;
use crate::policy::check_writable;
use crate::store::Universe;

use super::{decode, keys};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UniverseBody {
    name: Option<String>,
    description: Option<String>,
}

pub(crate) fn load(state: &AppState, id: &str) -> Result<Universe> {
    state
        .store()
        .universe(id)
        .ok_or_else(|| SagaError::NotFound(format!("universe {id}")))
}

fn clean_name(name: Option<String>) -> Result<Option<String>> {
    match name {
        Some(n) if n.trim().is_empty() => Err(SagaError::BadRequest("name must not be empty".into())),
        Some(n) => Ok(Some(n.trim().to_string())),
        None => Ok(None),
    }
}

pub async fn list(State(state): State<AppState>, who: CurrentActor) -> ApiResult<Json<Value>> {
    let grant = state
        .authorizer()
        .require_global(who.get(), Permission::any(Action::Read), ResourceKind::Universe)?;

    let list = state.store().universes().iter().map(|u| u.view(&grant)).collect();
    Ok(Json(Value::Array(list)))
}

pub async fn create(
    State(state): State<AppState>,
    who: CurrentActor,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let grant = state
        .authorizer()
        .require_global(who.get(), Permission::own(Action::Create), ResourceKind::Universe)?;
    let actor = who.require()?;

    check_writable(&grant, keys(&body))?;
    let req: UniverseBody = decode(body)?;
    let name = clean_name(req.name)?.ok_or_else(|| SagaError::BadRequest("name is required".into()))?;

    let u = state.store().create_universe(&actor.user_id, name, req.description);
    tracing::info!(user = %actor.user_id, universe = %u.id, "universe created");
    Ok((StatusCode::CREATED, Json(u.view(&grant))))
}

pub async fn show(
    State(state): State<AppState>,
    who: CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let actor = who.require()?;
    let u = load(&state, &id)?;

    let perm = Permission::for_owner(Action::Read, actor.owns(&u.owner_id));
    let grant = state.authorizer().require_global(who.get(), perm, ResourceKind::Universe)?;
    Ok(Json(u.view(&grant)))
}

pub async fn update(
    State(state): State<AppState>,
    who: CurrentActor,
    Path(id): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<Json<Value>> {
    let actor = who.require()?;
    let u = load(&state, &id)?;

    let perm = Permission::for_owner(Action::Update, actor.owns(&u.owner_id));
    let grant = state.authorizer().require_global(who.get(), perm, ResourceKind::Universe)?;

    check_writable(&grant, keys(&body))?;
    let req: UniverseBody = decode(body)?;
    let name = clean_name(req.name)?;

    let u = state
        .store()
        .update_universe(&id, name, req.description)
        .ok_or_else(|| SagaError::NotFound(format!("universe {id}")))?;
    Ok(Json(u.view(&grant)))
}

pub async fn remove(
    State(state): State<AppState>,
    who: CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let actor = who.require()?;
    let u = load(&state, &id)?;

    let perm = Permission::for_owner(Action::Delete, actor.owns(&u.owner_id));
    state.authorizer().require_global(who.get(), perm, ResourceKind::Universe)?;

    state.store().remove_universe(&id);
    tracing::info!(user = %actor.user_id, universe = %id, "universe deleted");
    Ok(StatusCode::NO_CONTENT)
}
