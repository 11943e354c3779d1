//! Router assembly.

use crate::routes;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Build the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/story/init", post(routes::story::init))
        .route("/story/verify", post(routes::story::verify))
        .route(
            "/story/{session_id}",
            get(routes::story::get).patch(routes::story::update),
        )
        .route("/health", get(routes::health));

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(&state.config.static_dir))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
