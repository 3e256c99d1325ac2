//! Universe-scoped resources (characters, stories, species, ...).
//!
//! One set of handlers serves every universe-scoped kind; the kind comes
//! from the path and the universe is passed explicitly to every decision.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};

use saga_core::access::{Action, Permission, ResourceKind};
use saga_core::error::{Result, SagaError};

use crate::app_state::AppState;
use crate::context::CurrentActor;
use crate::error::ApiResult;
use crate::policy::check_writable;
use crate::store::Record;

use super::keys;
use super::universes::load as load_universe;

/// Unknown or non universe-scoped kinds are a missing route, not a denial.
fn parse_kind(raw: &str) -> Result<ResourceKind> {
    ResourceKind::from_name(raw)
        .filter(|k| k.is_universe_scoped())
        .ok_or_else(|| SagaError::NotFound(format!("resource kind {raw}")))
}

fn load(state: &AppState, uid: &str, kind: ResourceKind, id: &str) -> Result<Record> {
    state
        .store()
        .record(uid, kind, id)
        .ok_or_else(|| SagaError::NotFound(format!("{kind} {id}")))
}

pub async fn list(
    State(state): State<AppState>,
    who: CurrentActor,
    Path((uid, kind)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    who.require()?;
    let kind = parse_kind(&kind)?;
    load_universe(&state, &uid)?;

    let grant = state
        .authorizer()
        .require_in_universe(who.get(), &uid, Permission::any(Action::Read), kind)?;

    let list = state
        .store()
        .records(&uid, kind)
        .iter()
        .map(|r| r.view(&grant))
        .collect();
    Ok(Json(Value::Array(list)))
}

pub async fn create(
    State(state): State<AppState>,
    who: CurrentActor,
    Path((uid, kind)): Path<(String, String)>,
    Json(fields): Json<Map<String, Value>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let actor = who.require()?;
    let kind = parse_kind(&kind)?;
    load_universe(&state, &uid)?;

    let grant = state
        .authorizer()
        .require_in_universe(who.get(), &uid, Permission::own(Action::Create), kind)?;
    check_writable(&grant, keys(&fields))?;

    let r = state.store().create_record(&uid, kind, &actor.user_id, fields);
    tracing::info!(user = %actor.user_id, universe = %uid, %kind, id = %r.id, "record created");
    Ok((StatusCode::CREATED, Json(r.view(&grant))))
}

pub async fn show(
    State(state): State<AppState>,
    who: CurrentActor,
    Path((uid, kind, id)): Path<(String, String, String)>,
) -> ApiResult<Json<Value>> {
    let actor = who.require()?;
    let kind = parse_kind(&kind)?;
    load_universe(&state, &uid)?;
    let r = load(&state, &uid, kind, &id)?;

    let perm = Permission::for_owner(Action::Read, actor.owns(&r.owner_id));
    let grant = state.authorizer().require_in_universe(who.get(), &uid, perm, kind)?;
    Ok(Json(r.view(&grant)))
}

pub async fn update(
    State(state): State<AppState>,
    who: CurrentActor,
    Path((uid, kind, id)): Path<(String, String, String)>,
    Json(fields): Json<Map<String, Value>>,
) -> ApiResult<Json<Value>> {
    let actor = who.require()?;
    let kind = parse_kind(&kind)?;
    load_universe(&state, &uid)?;
    let r = load(&state, &uid, kind, &id)?;

    let perm = Permission::for_owner(Action::Update, actor.owns(&r.owner_id));
    let grant = state.authorizer().require_in_universe(who.get(), &uid, perm, kind)?;
    check_writable(&grant, keys(&fields))?;

    let r = state
        .store()
        .update_record(&uid, kind, &id, fields)
        .ok_or_else(|| SagaError::NotFound(format!("{kind} {id}")))?;
    Ok(Json(r.view(&grant)))
}

pub async fn remove(
    State(state): State<AppState>,
    who: CurrentActor,
    Path((uid, kind, id)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    let actor = who.require()?;
    let kind = parse_kind(&kind)?;
    load_universe(&state, &uid)?;
    let r = load(&state, &uid, kind, &id)?;

    let perm = Permission::for_owner(Action::Delete, actor.owns(&r.owner_id));
    state.authorizer().require_in_universe(who.get(), &uid, perm, kind)?;

    state.store().remove_record(&uid, kind, &id);
    tracing::info!(user = %actor.user_id, universe = %uid, %kind, %id, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}
