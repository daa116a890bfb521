pub mod board;
pub mod gunsmith;
pub mod map;
pub mod profile;

use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use crate::{
    state::AppState,
    utils::middleware::{auth_middleware, request_logging_middleware},
};

/// API routes with authentication applied. Transport layers (CORS,
/// compression, tracing) are added by the binary.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .nest("/api/board", board::router())
        .nest("/api/gunsmith", gunsmith::router())
        .nest("/api/map", map::router())
        .nest("/api/profile", profile::router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "squad-hub is running!"
}
