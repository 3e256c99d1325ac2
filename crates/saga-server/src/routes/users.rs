use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use saga_core::access::{Action, AttributeFilter, Permission, ResourceKind, Role};
use saga_core::error::SagaError;

use crate::app_state::AppState;
use crate::context::CurrentActor;
use crate::error::ApiResult;
use crate::policy::check_writable;
use crate::store::to_value;

use super::{decode, keys};

const PATCHABLE: &[&str] = &["name", "email", "image", "role"];

#[derive(Debug, Deserialize)]
struct UserPatch {
    name: Option<String>,
    email: Option<String>,
    image: Option<String>,
    role: Option<Role>,
}

pub async fn list(State(state): State<AppState>, who: CurrentActor) -> ApiResult<Json<Value>> {
    let grant = state
        .authorizer()
        .require_global(who.get(), Permission::any(Action::Read), ResourceKind::User)?;

    let users: Vec<Value> = state
        .store()
        .users()
        .iter()
        .map(|u| grant.filter(&to_value(u)))
        .collect();
    Ok(Json(Value::Array(users)))
}

pub async fn show(
    State(state): State<AppState>,
    who: CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let actor = who.require()?;
    let user = state
        .store()
        .user(&id)
        .ok_or_else(|| SagaError::NotFound(format!("user {id}")))?;

    let perm = Permission::for_owner(Action::Read, actor.owns(&user.id));
    let grant = state.authorizer().require_global(who.get(), perm, ResourceKind::User)?;
    Ok(Json(grant.filter(&to_value(&user))))
}

pub async fn update(
    State(state): State<AppState>,
    who: CurrentActor,
    Path(id): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<Json<Value>> {
    let actor = who.require()?;
    if state.store().user(&id).is_none() {
        return Err(SagaError::NotFound(format!("user {id}")).into());
    }

    let perm = Permission::for_owner(Action::Update, actor.owns(&id));
    let grant = state.authorizer().require_global(who.get(), perm, ResourceKind::User)?;

    if let Some(k) = keys(&body).find(|k| !PATCHABLE.contains(k)) {
        return Err(SagaError::BadRequest(format!("unknown user field: {k}")).into());
    }
    check_writable(&grant, keys(&body))?;
    let patch: UserPatch = decode(body)?;

    // What the caller may read back; a denial here only narrows the reply.
    let read = state
        .authorizer()
        .require_global(who.get(), Permission::for_owner(Action::Read, actor.owns(&id)), ResourceKind::User)
        .map(|g| g.attributes)
        .unwrap_or_else(|_| AttributeFilter::none());

    let updated = state.store().update_user(&id, patch.email, |u| {
        if let Some(n) = patch.name {
            u.name = n;
        }
        if patch.image.is_some() {
            u.image = patch.image;
        }
        if let Some(r) = patch.role {
            u.role = r;
        }
    })?;

    tracing::info!(user = %actor.user_id, target = %id, "user updated");
    Ok(Json(read.filter(&to_value(&updated))))
}

pub async fn remove(
    State(state): State<AppState>,
    who: CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let actor = who.require()?;
    if state.store().user(&id).is_none() {
        return Err(SagaError::NotFound(format!("user {id}")).into());
    }

    let perm = Permission::for_owner(Action::Delete, actor.owns(&id));
    state.authorizer().require_global(who.get(), perm, ResourceKind::User)?;

    state.store().remove_user(&id);
    let revoked = state.sessions().revoke_user(&id);
    tracing::info!(user = %actor.user_id, target = %id, revoked, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
