//! HTTP routes for offline message retrieval.

use axum::{middleware, routing::get, Router};

use super::handlers::{fetch_pending, poll_pending, MessageHandlers};
use crate::adapters::http::middleware::{auth_middleware, AuthState};

/// Creates the message router. Every route requires a Bearer token.
pub fn message_routes(handlers: MessageHandlers, auth: AuthState) -> Router {
    Router::new()
        .route("/pending", get(fetch_pending))
        .route("/poll", get(poll_pending))
        .with_state(handlers)
        .layer(middleware::from_fn_with_state(auth, auth_middleware))
}
