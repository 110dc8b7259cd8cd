use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

/// Router の構築
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::welcome))
        .route("/api/health", get(handlers::health_check))
        // ユーザー管理
        .route("/users", post(handlers::register))
        .route("/users/me", get(handlers::current_user))
        // セッション
        .route(
            "/sessions",
            post(handlers::login).delete(handlers::logout),
        )
        .route("/profile", get(handlers::profile))
        // パスワードリセット
        .route(
            "/reset_password",
            post(handlers::request_password_reset).put(handlers::reset_password),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::require_identity,
        ))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                tracing::info_span!("http_request", %method, uri = %uri)
            }),
        )
}
