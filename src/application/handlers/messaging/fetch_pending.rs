//! FetchPendingHandler - Query handler for one page of undelivered messages.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::messaging::{MessagingError, PageCursor, PendingPage};
use crate::ports::MessageOutbox;

/// Query for messages still awaiting delivery confirmation.
#[derive(Debug, Clone)]
pub struct FetchPendingQuery {
    pub user_id: UserId,
    /// Wire cursor; empty means from the beginning.
    pub cursor: String,
    /// Requested page size; missing or non-positive uses the default.
    pub limit: Option<i64>,
}

/// Page size bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl PageLimits {
    /// Resolves a requested limit against the bounds.
    pub fn resolve(&self, requested: Option<i64>) -> u32 {
        match requested {
            Some(n) if n > 0 => n.min(self.max_limit as i64) as u32,
            _ => self.default_limit,
        }
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// Handler for pending-message pages.
pub struct FetchPendingHandler {
    outbox: Arc<dyn MessageOutbox>,
    limits: PageLimits,
}

impl FetchPendingHandler {
    pub fn new(outbox: Arc<dyn MessageOutbox>, limits: PageLimits) -> Self {
        Self { outbox, limits }
    }

    pub fn limits(&self) -> PageLimits {
        self.limits
    }

    pub async fn handle(&self, query: FetchPendingQuery) -> Result<PendingPage, MessagingError> {
        let cursor = PageCursor::parse(&query.cursor)
            .map_err(|e| MessagingError::invalid_cursor(e.to_string()))?;
        self.fetch(&query.user_id, &cursor, self.limits.resolve(query.limit))
            .await
    }

    pub(crate) async fn fetch(
        &self,
        user_id: &UserId,
        cursor: &PageCursor,
        limit: u32,
    ) -> Result<PendingPage, MessagingError> {
        let page = self.outbox.list_pending(user_id, cursor, limit).await?;

        tracing::debug!(
            user_id = %user_id,
            count = page.items.len(),
            has_more = page.has_more,
            "fetched pending messages"
        );

        Ok(PendingPage::from_messages(page.items, limit as usize))
    }
}
