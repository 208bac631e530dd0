//! 路由装配

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::api::security_headers::security_headers;
use crate::api::state::AppState;
use crate::api::{dashboard, ops, public, session};

/// 请求体上限（CSV 上传）
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/area-codes/", get(public::area_codes))
        .route("/search/", get(public::search));

    let dashboard_routes = Router::new()
        .route("/", get(dashboard::home))
        .route("/create/", post(dashboard::create))
        .route("/{id}/edit/", get(dashboard::edit_form).post(dashboard::edit))
        .route("/{id}/delete/", post(dashboard::delete))
        .route(
            "/delete-all/",
            get(dashboard::delete_all_prompt).post(dashboard::delete_all),
        )
        .route("/upload/", post(dashboard::upload))
        .route("/password/", post(dashboard::change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    let auth_routes = Router::new()
        .route("/login", get(session::login_page).post(session::login))
        .route("/login/", get(session::login_page).post(session::login))
        .route("/logout", post(session::logout))
        .route("/logout/", post(session::logout));

    let ops_routes = Router::new()
        .route("/health", get(ops::health))
        .route("/ready", get(ops::ready))
        .route("/metrics", get(ops::metrics));

    Router::new()
        .nest("/api", public_routes)
        .merge(dashboard_routes)
        .merge(auth_routes)
        .merge(ops_routes)
        .layer(middleware::from_fn(security_headers))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
