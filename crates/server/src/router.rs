//! HTTP router construction.

use std::sync::Arc;

use axum::routing::{any, get};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::AppState;

/// `/` runs one invocation for any method; `/health` reports liveness.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", any(api::invoke))
        .route("/health", get(api::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
