//! Liveness endpoint reporting hub occupancy.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::adapters::websocket::Hub;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
    pub online_users: usize,
}

/// GET /health
pub async fn health_check(State(hub): State<Hub>) -> impl IntoResponse {
    match hub.snapshot().await {
        Ok(snapshot) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                connections: snapshot.connection_count,
                online_users: snapshot.user_count(),
            }),
        ),
        Err(err) => {
            tracing::error!(error = %err, "health check found hub stopped");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "hub_stopped",
                    connections: 0,
                    online_users: 0,
                }),
            )
        }
    }
}
