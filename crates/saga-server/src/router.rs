//! Axum router wiring.

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use crate::{app_state::AppState, obs, ops, routes};

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/me", get(routes::me::show))
        .route("/me/universe", put(routes::me::switch_universe))
        .route("/users", get(routes::users::list))
        .route(
            "/users/:id",
            get(routes::users::show)
                .patch(routes::users::update)
                .delete(routes::users::remove),
        )
        .route("/admin/users", get(routes::admin::users))
        .route(
            "/admin/invitations",
            get(routes::admin::invitations).post(routes::admin::invite),
        )
        .route(
            "/universes",
            get(routes::universes::list).post(routes::universes::create),
        )
        .route(
            "/universes/:uid",
            get(routes::universes::show)
                .patch(routes::universes::update)
                .delete(routes::universes::remove),
        )
        .route(
            "/universes/:uid/:kind",
            get(routes::records::list).post(routes::records::create),
        )
        .route(
            "/universes/:uid/:kind/:id",
            get(routes::records::show)
                .patch(routes::records::update)
                .delete(routes::records::remove),
        );

    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .nest("/v1", api)
        .layer(middleware::from_fn_with_state(state.clone(), obs::track))
        .with_state(state)
}
