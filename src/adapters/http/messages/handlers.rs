//! HTTP handlers for offline message retrieval.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::messaging::{
    FetchPendingHandler, FetchPendingQuery, PollOutcome, PollPendingHandler, PollPendingQuery,
};
use crate::domain::messaging::MessagingError;

use super::dto::{ErrorResponse, PendingPageResponse, PendingQueryParams};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct MessageHandlers {
    fetch_handler: Arc<FetchPendingHandler>,
    poll_handler: Arc<PollPendingHandler>,
}

impl MessageHandlers {
    pub fn new(
        fetch_handler: Arc<FetchPendingHandler>,
        poll_handler: Arc<PollPendingHandler>,
    ) -> Self {
        Self {
            fetch_handler,
            poll_handler,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/messages/pending - One page of undelivered messages
pub async fn fetch_pending(
    State(handlers): State<MessageHandlers>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<PendingQueryParams>,
) -> Response {
    let query = FetchPendingQuery {
        user_id: user.id,
        cursor: params.cursor,
        limit: params.limit,
    };

    match handlers.fetch_handler.handle(query).await {
        Ok(page) => (StatusCode::OK, Json(PendingPageResponse::from(page))).into_response(),
        Err(e) => handle_messaging_error(e),
    }
}

/// GET /api/messages/poll - Long-poll until something is pending or the bound elapses
pub async fn poll_pending(
    State(handlers): State<MessageHandlers>,
    RequireAuth(user): RequireAuth,
) -> Response {
    let query = PollPendingQuery { user_id: user.id };

    match handlers.poll_handler.handle(query).await {
        Ok(PollOutcome::Messages(page)) => {
            (StatusCode::OK, Json(PendingPageResponse::from(page))).into_response()
        }
        Ok(PollOutcome::NoContent) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => handle_messaging_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn handle_messaging_error(error: MessagingError) -> Response {
    let code = error.code().to_string();
    match error {
        MessagingError::InvalidCursor(msg) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(code, format!("Invalid cursor: {}", msg))),
        )
            .into_response(),
        MessagingError::ValidationFailed { field, message } => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                code,
                format!("Validation failed for {}: {}", field, message),
            )),
        )
            .into_response(),
        MessagingError::NotFound(msg) => {
            (StatusCode::NOT_FOUND, Json(ErrorResponse::new(code, msg))).into_response()
        }
        MessagingError::Storage(msg) => {
            tracing::error!(error = %msg, "pending retrieval failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(code, "Failed to load pending messages")),
            )
                .into_response()
        }
    }
}
