use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::Value;

use saga_core::access::{Action, Permission, ResourceKind, Role};
use saga_core::error::SagaError;

use crate::app_state::AppState;
use crate::context::CurrentActor;
use crate::error::ApiResult;
use crate::store::to_value;

/// User administration listing; unlike `/v1/users` this is gated on the
/// admin area itself.
pub async fn users(State(state): State<AppState>, who: CurrentActor) -> ApiResult<Json<Value>> {
    let grant = state
        .authorizer()
        .require_global(who.get(), Permission::any(Action::Read), ResourceKind::Admin)?;

    let users = state.store().users().iter().map(|u| grant.filter(&to_value(u))).collect();
    Ok(Json(Value::Array(users)))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InviteReq {
    pub email: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Member
}

pub async fn invite(
    State(state): State<AppState>,
    who: CurrentActor,
    Json(req): Json<InviteReq>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let grant = state
        .authorizer()
        .require_global(who.get(), Permission::any(Action::Create), ResourceKind::Invitation)?;
    let actor = who.require()?;

    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(SagaError::BadRequest(format!("invalid email: {email:?}")).into());
    }

    let inv = state.store().create_invitation(email.to_string(), req.role, &actor.user_id)?;
    // Delivery of the invitation mail is handled by the mailer, outside this service.
    tracing::info!(user = %actor.user_id, email = %inv.email, role = %inv.role, "invitation created");
    Ok((StatusCode::CREATED, Json(grant.filter(&to_value(&inv)))))
}

pub async fn invitations(State(state): State<AppState>, who: CurrentActor) -> ApiResult<Json<Value>> {
    let grant = state
        .authorizer()
        .require_global(who.get(), Permission::any(Action::Read), ResourceKind::Invitation)?;

    let list = state
        .store()
        .invitations()
        .iter()
        .map(|i| grant.filter(&to_value(i)))
        .collect();
    Ok(Json(Value::Array(list)))
}
