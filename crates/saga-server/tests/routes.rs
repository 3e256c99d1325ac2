//! In-process HTTP tests for the route guards.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use saga_core::access::{AccessEvaluator, Actor, Grant, Permission, ResourceKind};
use saga_server::{app_state::AppState, config, router};

const CONFIG: &str = r#"
version: 1
users:
  - { id: "admin", name: "Root", email: "root@saga.test", role: administrator, password_hash: "$argon2$x" }
  - { id: "m-1", name: "Ayla", email: "ayla@saga.test", role: member, password_hash: "$argon2$y" }
  - { id: "m-2", name: "Brann", email: "brann@saga.test", role: member }
  - { id: "m-3", name: "Cato", email: "cato@saga.test", role: member }
universes:
  - { id: "u-1", name: "Eldoria", owner_id: "m-1" }
sessions:
  - { token: "admin", user_id: "admin" }
  - { token: "m1", user_id: "m-1", universe_id: "u-1" }
  - { token: "m2", user_id: "m-2", universe_id: "u-1" }
  - { token: "m3", user_id: "m-3" }
"#;

fn state() -> AppState {
    AppState::new(config::load_from_str(CONFIG).unwrap()).unwrap()
}

fn app() -> Router {
    router::build_router(state())
}

async fn call(router: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header("authorization", format!("Bearer {t}"));
    }
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&v).unwrap())
        }
        None => Body::empty(),
    };
    let resp = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn keys(v: &Value) -> Vec<&str> {
    let mut k: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
    k.sort();
    k
}

#[tokio::test]
async fn unauthenticated_forbidden_and_not_found_stay_distinct() {
    let app = app();

    let (s, body) = call(&app, "GET", "/v1/admin/users", None, None).await;
    assert_eq!(s, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHENTICATED");

    let (s, _) = call(&app, "GET", "/v1/admin/users", Some("stale-token"), None).await;
    assert_eq!(s, StatusCode::UNAUTHORIZED);

    let (s, body) = call(&app, "GET", "/v1/admin/users", Some("m1"), None).await;
    assert_eq!(s, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let (s, body) = call(&app, "GET", "/v1/universes/u-1/character/nope", Some("m1"), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");

    let (s, _) = call(&app, "GET", "/v1/universes/u-404/character", Some("m1"), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);

    let (s, _) = call(&app, "GET", "/v1/universes/u-1/dragon", Some("m1"), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);

    // Missing resources still answer 401 without a session.
    let (s, _) = call(&app, "GET", "/v1/universes/u-1/character/nope", None, None).await;
    assert_eq!(s, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn character_ownership() {
    let app = app();

    let (s, created) = call(
        &app,
        "POST",
        "/v1/universes/u-1/character",
        Some("m1"),
        Some(json!({ "name": "Ilya", "level": 3 })),
    )
    .await;
    assert_eq!(s, StatusCode::CREATED);
    assert_eq!(created["owner_id"], "m-1");
    assert_eq!(created["kind"], "character");
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/v1/universes/u-1/character/{id}");

    let (s, updated) = call(&app, "PATCH", &uri, Some("m1"), Some(json!({ "level": 4 }))).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(updated["fields"]["level"], 4);
    assert_eq!(updated["fields"]["name"], "Ilya");

    let (s, _) = call(&app, "PATCH", &uri, Some("m2"), Some(json!({ "level": 99 }))).await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, read) = call(&app, "GET", &uri, Some("m2"), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(read["fields"]["level"], 4);

    let (s, _) = call(&app, "DELETE", &uri, Some("m2"), None).await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, _) = call(&app, "DELETE", &uri, Some("admin"), None).await;
    assert_eq!(s, StatusCode::NO_CONTENT);

    let (s, _) = call(&app, "GET", &uri, Some("m1"), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn records_do_not_leak_across_kinds() {
    let app = app();
    let (_, created) = call(&app, "POST", "/v1/universes/u-1/story", Some("m1"), Some(json!({ "title": "Prologue" }))).await;
    let id = created["id"].as_str().unwrap();

    let (s, _) = call(&app, "GET", &format!("/v1/universes/u-1/item/{id}"), Some("m1"), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);

    let (s, list) = call(&app, "GET", "/v1/universes/u-1/story", Some("m2"), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn universe_is_explicit_per_request() {
    let app = app();

    // m-3 has no current universe.
    let (s, _) = call(&app, "GET", "/v1/universes/u-1/species", Some("m3"), None).await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, body) = call(&app, "PUT", "/v1/me/universe", Some("m3"), Some(json!({ "universe_id": "u-1" }))).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body["universe_id"], "u-1");

    let (s, _) = call(&app, "GET", "/v1/universes/u-1/species", Some("m3"), None).await;
    assert_eq!(s, StatusCode::OK);

    let (s, _) = call(&app, "PUT", "/v1/me/universe", Some("m3"), Some(json!({ "universe_id": "u-404" }))).await;
    assert_eq!(s, StatusCode::NOT_FOUND);

    // Acting in a freshly created universe does not open the old one's neighbours.
    let (_, other) = call(&app, "POST", "/v1/universes", Some("m3"), Some(json!({ "name": "Frostmark" }))).await;
    let other_id = other["id"].as_str().unwrap();
    let (s, _) = call(&app, "GET", &format!("/v1/universes/{other_id}/character"), Some("m1"), None).await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, me) = call(&app, "GET", "/v1/me", Some("m3"), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(me["universe_id"], "u-1");
}

#[tokio::test]
async fn user_fields_are_filtered() {
    let app = app();

    let (s, list) = call(&app, "GET", "/v1/users", Some("m1"), None).await;
    assert_eq!(s, StatusCode::OK);
    for u in list.as_array().unwrap() {
        assert_eq!(keys(u), vec!["id", "name", "role"]);
    }

    let (_, me) = call(&app, "GET", "/v1/users/m-1", Some("m1"), None).await;
    assert_eq!(me["email"], "ayla@saga.test");
    assert!(me.get("password_hash").is_none());

    let (_, other) = call(&app, "GET", "/v1/users/m-2", Some("m1"), None).await;
    assert!(other.get("email").is_none());

    let (_, seen_by_admin) = call(&app, "GET", "/v1/users/m-1", Some("admin"), None).await;
    assert_eq!(seen_by_admin["password_hash"], "$argon2$y");

    let (s, _) = call(&app, "GET", "/v1/users/ghost", Some("m1"), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_updates() {
    let app = app();

    let (s, me) = call(&app, "PATCH", "/v1/users/m-1", Some("m1"), Some(json!({ "name": "Ayla Vey" }))).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(me["name"], "Ayla Vey");

    let (s, _) = call(&app, "PATCH", "/v1/users/m-1", Some("m1"), Some(json!({ "role": "administrator" }))).await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, _) = call(&app, "PATCH", "/v1/users/m-2", Some("m1"), Some(json!({ "name": "X" }))).await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, _) = call(&app, "PATCH", "/v1/users/m-1", Some("m1"), Some(json!({ "nickname": "A" }))).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);

    let (s, _) = call(&app, "PATCH", "/v1/users/m-1", Some("m1"), Some(json!({ "email": "brann@saga.test" }))).await;
    assert_eq!(s, StatusCode::CONFLICT);

    let (s, promoted) = call(&app, "PATCH", "/v1/users/m-2", Some("admin"), Some(json!({ "role": "administrator" }))).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(promoted["role"], "administrator");

    // Role changes apply on the next request.
    let (s, _) = call(&app, "GET", "/v1/admin/users", Some("m2"), None).await;
    assert_eq!(s, StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_user_revokes_sessions() {
    let app = app();

    let (s, _) = call(&app, "DELETE", "/v1/users/m-1", Some("m1"), None).await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, _) = call(&app, "DELETE", "/v1/users/m-2", Some("admin"), None).await;
    assert_eq!(s, StatusCode::NO_CONTENT);

    let (s, _) = call(&app, "GET", "/v1/me", Some("m2"), None).await;
    assert_eq!(s, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invitations() {
    let app = app();
    let req = json!({ "email": "dana@saga.test" });

    let (s, _) = call(&app, "POST", "/v1/admin/invitations", Some("m1"), Some(req.clone())).await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, inv) = call(&app, "POST", "/v1/admin/invitations", Some("admin"), Some(req.clone())).await;
    assert_eq!(s, StatusCode::CREATED);
    assert_eq!(inv["role"], "member");
    assert_eq!(inv["invited_by"], "admin");

    let (s, _) = call(&app, "POST", "/v1/admin/invitations", Some("admin"), Some(req)).await;
    assert_eq!(s, StatusCode::CONFLICT);

    let (s, _) = call(&app, "POST", "/v1/admin/invitations", Some("admin"), Some(json!({ "email": "ayla@saga.test" }))).await;
    assert_eq!(s, StatusCode::CONFLICT);

    let (s, _) = call(&app, "POST", "/v1/admin/invitations", Some("admin"), Some(json!({ "email": "nope" }))).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);

    let (s, list) = call(&app, "GET", "/v1/admin/invitations", Some("admin"), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn universe_lifecycle() {
    let app = app();

    let (s, _) = call(&app, "POST", "/v1/universes", Some("m2"), Some(json!({ "name": "  " }))).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);

    let (s, u) = call(&app, "POST", "/v1/universes", Some("m2"), Some(json!({ "name": "Ashfall", "description": "grim" }))).await;
    assert_eq!(s, StatusCode::CREATED);
    assert_eq!(u["owner_id"], "m-2");
    let uri = format!("/v1/universes/{}", u["id"].as_str().unwrap());

    let (s, _) = call(&app, "PATCH", &uri, Some("m1"), Some(json!({ "name": "Mine" }))).await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, renamed) = call(&app, "PATCH", &uri, Some("m2"), Some(json!({ "name": "Ashfall II" }))).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(renamed["name"], "Ashfall II");
    assert_eq!(renamed["description"], "grim");

    let (s, list) = call(&app, "GET", "/v1/universes", Some("m1"), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);

    let (s, _) = call(&app, "DELETE", &uri, Some("m1"), None).await;
    assert_eq!(s, StatusCode::FORBIDDEN);
    let (s, _) = call(&app, "DELETE", &uri, Some("m2"), None).await;
    assert_eq!(s, StatusCode::NO_CONTENT);
    let (s, _) = call(&app, "GET", &uri, Some("m2"), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_universe_drops_its_records() {
    let state = state();
    let app = router::build_router(state.clone());

    call(&app, "POST", "/v1/universes/u-1/class", Some("m1"), Some(json!({ "name": "Ranger" }))).await;
    let (s, _) = call(&app, "DELETE", "/v1/universes/u-1", Some("m1"), None).await;
    assert_eq!(s, StatusCode::NO_CONTENT);
    assert!(state.store().records("u-1", ResourceKind::Class).is_empty());
}

#[tokio::test]
async fn ops_endpoints() {
    let state = state();
    let app = router::build_router(state.clone());

    let (s, _) = call(&app, "GET", "/healthz", None, None).await;
    assert_eq!(s, StatusCode::OK);

    call(&app, "GET", "/v1/admin/users", Some("m1"), None).await;

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let text = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let text = String::from_utf8(text.to_vec()).unwrap();
    assert!(text.contains(r#"saga_access_decisions_total{kind="admin",outcome="denied"} 1"#));
    assert!(text.contains(r#"saga_http_requests_total{method="GET",status="403"} 1"#));
    assert!(text.contains("saga_users 4"));

    let (s, _) = call(&app, "GET", "/readyz", None, None).await;
    assert_eq!(s, StatusCode::OK);
    state.set_draining();
    let (s, _) = call(&app, "GET", "/readyz", None, None).await;
    assert_eq!(s, StatusCode::SERVICE_UNAVAILABLE);
}

struct DenyAll;

impl AccessEvaluator for DenyAll {
    fn evaluate_global(&self, _: Option<&Actor>, _: Permission, _: ResourceKind) -> Grant {
        Grant::denied()
    }

    fn evaluate_in_universe(&self, _: Option<&Actor>, _: &str, _: Permission, _: ResourceKind) -> Grant {
        Grant::denied()
    }
}

#[tokio::test]
async fn evaluator_is_injected() {
    let cfg = config::load_from_str(CONFIG).unwrap();
    let state = AppState::with_evaluator(cfg, Arc::new(DenyAll)).unwrap();
    let app = router::build_router(state);

    let (s, _) = call(&app, "GET", "/v1/universes", Some("admin"), None).await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, _) = call(&app, "GET", "/v1/universes", None, None).await;
    assert_eq!(s, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn configured_member_table() {
    let cfg = format!("{CONFIG}access:\n  member: [\"universe:readAny\", \"character:readAny\"]\n");
    let state = AppState::new(config::load_from_str(&cfg).unwrap()).unwrap();
    let app = router::build_router(state);

    let (s, _) = call(&app, "GET", "/v1/universes/u-1/character", Some("m1"), None).await;
    assert_eq!(s, StatusCode::OK);

    let (s, _) = call(&app, "POST", "/v1/universes/u-1/character", Some("m1"), Some(json!({ "name": "x" }))).await;
    assert_eq!(s, StatusCode::FORBIDDEN);
}

fn app_with_member_rules(rules: &[&str]) -> Router {
    let list = rules.iter().map(|r| format!("{r:?}")).collect::<Vec<_>>().join(", ");
    let cfg = format!("{CONFIG}access:\n  member: [{list}]\n");
    router::build_router(AppState::new(config::load_from_str(&cfg).unwrap()).unwrap())
}

#[tokio::test]
async fn record_attribute_rules_apply_to_fields() {
    let app = app_with_member_rules(&[
        "character:createOwn:name",
        "character:readAny:name",
        "character:updateOwn:name",
    ]);

    let (s, created) = call(&app, "POST", "/v1/universes/u-1/character", Some("m1"), Some(json!({ "name": "Ilya" }))).await;
    assert_eq!(s, StatusCode::CREATED);
    assert_eq!(created["owner_id"], "m-1");
    assert_eq!(created["fields"], json!({ "name": "Ilya" }));
    let id = created["id"].as_str().unwrap().to_string();

    let (s, _) = call(
        &app,
        "POST",
        "/v1/universes/u-1/character",
        Some("m1"),
        Some(json!({ "name": "Vor", "level": 3 })),
    )
    .await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    // Fields the member may not read are dropped, the record itself is not.
    let uri = format!("/v1/universes/u-1/character/{id}");
    let (s, _) = call(&app, "PATCH", &uri, Some("admin"), Some(json!({ "level": 7 }))).await;
    assert_eq!(s, StatusCode::OK);

    let (s, list) = call(&app, "GET", "/v1/universes/u-1/character", Some("m2"), None).await;
    assert_eq!(s, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], id.as_str());
    assert_eq!(list[0]["kind"], "character");
    assert_eq!(list[0]["fields"], json!({ "name": "Ilya" }));

    let (s, _) = call(&app, "PATCH", &uri, Some("m1"), Some(json!({ "level": 8 }))).await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, renamed) = call(&app, "PATCH", &uri, Some("m1"), Some(json!({ "name": "Ilya II" }))).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(renamed["fields"], json!({ "name": "Ilya II" }));

    let (_, full) = call(&app, "GET", &uri, Some("admin"), None).await;
    assert_eq!(full["fields"], json!({ "name": "Ilya II", "level": 7 }));
}

#[tokio::test]
async fn universe_attribute_rules_keep_identity() {
    let app = app_with_member_rules(&["universe:readAny:name", "universe:updateOwn:description"]);

    let (s, u) = call(&app, "GET", "/v1/universes/u-1", Some("m2"), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(keys(&u), vec!["created_at", "id", "name", "owner_id", "updated_at"]);

    let (s, _) = call(&app, "PATCH", "/v1/universes/u-1", Some("m1"), Some(json!({ "name": "Renamed" }))).await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, updated) = call(&app, "PATCH", "/v1/universes/u-1", Some("m1"), Some(json!({ "description": "misty" }))).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(updated["description"], "misty");
    assert!(updated.get("name").is_none());
}

#[tokio::test]
async fn user_update_without_read_access_still_applies() {
    let app = app_with_member_rules(&["user:updateOwn:name"]);

    let (s, body) = call(&app, "PATCH", "/v1/users/m-1", Some("m1"), Some(json!({ "name": "Zed" }))).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (_, stored) = call(&app, "GET", "/v1/users/m-1", Some("admin"), None).await;
    assert_eq!(stored["name"], "Zed");

    // A rejected write leaves nothing behind.
    let (s, _) = call(&app, "PATCH", "/v1/users/m-1", Some("m1"), Some(json!({ "email": "zed@saga.test" }))).await;
    assert_eq!(s, StatusCode::FORBIDDEN);
    let (_, stored) = call(&app, "GET", "/v1/users/m-1", Some("admin"), None).await;
    assert_eq!(stored["email"], "ayla@saga.test");
}

#[tokio::test]
async fn email_conflict_leaves_user_unchanged() {
    let app = app();

    let (s, _) = call(
        &app,
        "PATCH",
        "/v1/users/m-1",
        Some("m1"),
        Some(json!({ "name": "Renamed", "email": "BRANN@saga.test" })),
    )
    .await;
    assert_eq!(s, StatusCode::CONFLICT);

    let (_, me) = call(&app, "GET", "/v1/users/m-1", Some("m1"), None).await;
    assert_eq!(me["name"], "Ayla");
    assert_eq!(me["email"], "ayla@saga.test");
}
