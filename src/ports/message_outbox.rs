//! MessageOutbox port - Durable store of messages awaiting delivery.
//!
//! Every accepted message is written here before the sender is acknowledged.
//! An entry lives until the recipient confirms delivery (`retire`) or its
//! time-to-live passes. Expired entries are filtered out on read; nothing
//! sweeps them proactively.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, MessageId, UserId};
use crate::domain::messaging::{Message, PageCursor};

/// Raw result of a pending listing.
#[derive(Debug, Clone, Default)]
pub struct OutboxPage {
    /// Entries ordered by creation time ascending.
    pub items: Vec<Message>,
    /// True when `items` filled the requested limit.
    pub has_more: bool,
}

/// Port for the durable message outbox.
///
/// # Contract
///
/// - `persist` is atomic: on error nothing was stored.
/// - `retire` of an absent or already-retired id is `Ok(())`.
/// - `list_pending` returns unexpired entries addressed to `user_id`
///   directly or via a group `user_id` belongs to, never the user's own
///   messages, and never messages whose sender is in a block relationship
///   with `user_id` in either direction. Items are strictly newer than
///   `cursor`, ascending by creation time, at most `limit` of them.
/// - An unknown direct recipient fails `persist` with `RecipientNotFound`.
#[async_trait]
pub trait MessageOutbox: Send + Sync {
    /// Stores a message with an expiry of `created_at + ttl`.
    async fn persist(&self, message: &Message, ttl: chrono::Duration) -> Result<(), DomainError>;

    /// Deletes the entry for `message_id`.
    async fn retire(&self, message_id: &MessageId) -> Result<(), DomainError>;

    /// Lists entries pending delivery to `user_id`.
    async fn list_pending(
        &self,
        user_id: &UserId,
        cursor: &PageCursor,
        limit: u32,
    ) -> Result<OutboxPage, DomainError>;
}
