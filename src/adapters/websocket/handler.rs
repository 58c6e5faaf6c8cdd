//! WebSocket upgrade handler for chat connections.
//!
//! Handles the HTTP → WebSocket upgrade and hands the socket to a session:
//! 1. Authenticate the `token` query parameter (or a Bearer header)
//! 2. Upgrade to WebSocket with the inbound frame limit applied
//! 3. Run the session read/write loops until disconnect

use std::sync::Arc;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::Deserialize;

use super::{
    dispatcher::FrameDispatcher,
    hub::Hub,
    session::{run_session, SessionSettings},
};
use crate::domain::foundation::AuthError;
use crate::ports::SessionValidator;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub hub: Hub,
    pub dispatcher: Arc<FrameDispatcher>,
    pub validator: Arc<dyn SessionValidator>,
    pub settings: SessionSettings,
}

impl WebSocketState {
    pub fn new(
        hub: Hub,
        dispatcher: Arc<FrameDispatcher>,
        validator: Arc<dyn SessionValidator>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            hub,
            dispatcher,
            validator,
            settings,
        }
    }
}

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: Option<String>,
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /api/ws?token=...`
///
/// The credential is checked before upgrading; a failed check never
/// creates a session.
pub async fn ws_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Query(query): Query<WsAuthQuery>,
    headers: HeaderMap,
    State(state): State<WebSocketState>,
) -> Response {
    let Some(token) = query.token.or_else(|| bearer_token(&headers)) else {
        return unauthorized("Missing token", "MISSING_TOKEN");
    };

    let user = match state.validator.validate(&token).await {
        Ok(user) => user,
        Err(AuthError::ServiceUnavailable(msg)) => {
            tracing::error!(error = %msg, "auth service unavailable during upgrade");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "error": "Authentication service unavailable",
                    "code": "AUTH_SERVICE_UNAVAILABLE"
                })),
            )
                .into_response();
        }
        Err(AuthError::TokenExpired) => return unauthorized("Token expired", "TOKEN_EXPIRED"),
        Err(AuthError::InvalidToken) => return unauthorized("Invalid token", "INVALID_TOKEN"),
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let settings = state.settings;
    ws.max_message_size(settings.max_frame_bytes)
        .on_upgrade(move |socket| {
            let (writer, reader) = socket.split();
            run_session(
                reader,
                writer,
                user.id,
                state.hub,
                state.dispatcher,
                settings,
            )
        })
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn unauthorized(error: &str, code: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": error, "code": code })),
    )
        .into_response()
}

/// Create axum router for the WebSocket endpoint.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .nest("/api", websocket_router().with_state(ws_state));
/// ```
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}
