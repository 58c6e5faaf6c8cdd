//! HTTP adapters - REST endpoints and the assembled application router.
//!
//! ```text
//! /health                  liveness + hub occupancy
//! /api/ws                  WebSocket upgrade (token query or Bearer header)
//! /api/messages/pending    paginated offline retrieval
//! /api/messages/poll       bounded long-poll
//! ```

pub mod health;
pub mod messages;
pub mod middleware;

pub use messages::{message_routes, MessageHandlers};
pub use middleware::{auth_middleware, AuthState, RequireAuth};

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::adapters::websocket::{websocket_router, WebSocketState};

/// Builds the complete router: health, WebSocket upgrade and message retrieval.
pub fn app_router(
    ws_state: WebSocketState,
    messages: MessageHandlers,
    auth: AuthState,
    cors_origins: &[String],
) -> Router {
    let health = Router::new()
        .route("/health", get(health::health_check))
        .with_state(ws_state.hub.clone());

    let api = Router::new()
        .merge(websocket_router().with_state(ws_state))
        .nest("/messages", message_routes(messages, auth));

    Router::new()
        .merge(health)
        .nest("/api", api)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS policy; an empty origin list allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::memory::{InMemoryMessageOutbox, InMemoryRelationshipStore};
    use crate::adapters::websocket::dispatcher::tests::dispatcher_with_memory;
    use crate::adapters::websocket::{Hub, SessionSettings};
    use crate::application::handlers::messaging::{
        FetchPendingHandler, PageLimits, PollPendingHandler, PollSettings,
    };
    use crate::domain::foundation::{ConnectionId, UserId};

    fn app(hub: Hub) -> Router {
        let validator = Arc::new(MockSessionValidator::new());
        let (dispatcher, _outbox) = dispatcher_with_memory(hub.clone());
        let ws_state =
            WebSocketState::new(hub, dispatcher, validator.clone(), SessionSettings::default());
        let outbox = Arc::new(InMemoryMessageOutbox::new(Arc::new(
            InMemoryRelationshipStore::new(),
        )));
        let fetch = Arc::new(FetchPendingHandler::new(outbox, PageLimits::default()));
        let poll = Arc::new(PollPendingHandler::new(fetch.clone(), PollSettings::default()));
        app_router(ws_state, MessageHandlers::new(fetch, poll), validator, &[])
    }

    #[tokio::test]
    async fn health_reports_hub_occupancy() {
        let (hub, _task) = Hub::spawn();
        let (tx, _rx) = tokio::sync::mpsc::channel(1);
        hub.register(ConnectionId::new(), UserId::new(), tx).unwrap();

        let response = app(hub)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["connections"], 1);
        assert_eq!(json["onlineUsers"], 1);
    }

    #[tokio::test]
    async fn message_routes_are_nested_under_api() {
        let (hub, _task) = Hub::spawn();

        let response = app(hub)
            .oneshot(
                Request::builder()
                    .uri("/api/messages/pending")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn cors_layer_accepts_explicit_origins() {
        let _ = cors_layer(&["https://chat.example.com".to_string()]);
    }
}
