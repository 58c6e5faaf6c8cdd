//! Data transfer objects for the offline retrieval endpoints.

use serde::{Deserialize, Serialize};

use crate::adapters::websocket::MessageDto;
use crate::domain::messaging::PendingPage;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Query parameters for `GET /api/messages/pending`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PendingQueryParams {
    /// Keyset cursor from a previous page; empty or absent starts from the beginning.
    #[serde(default)]
    pub cursor: String,
    pub limit: Option<i64>,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPageResponse {
    pub messages: Vec<MessageDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl From<PendingPage> for PendingPageResponse {
    fn from(page: PendingPage) -> Self {
        Self {
            messages: page.messages.iter().map(MessageDto::from).collect(),
            next_cursor: page.next_cursor.map(|c| c.encode()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}
