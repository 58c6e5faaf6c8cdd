//! Message aggregate.

use super::{MessageContent, MessageStatus, MessageTarget};
use crate::domain::foundation::{GroupId, MessageId, Timestamp, UserId};

/// A chat message accepted by the server.
///
/// Construction goes through validated value objects, so every `Message`
/// carries 1..=500 code points and exactly one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    sender_id: UserId,
    target: MessageTarget,
    content: MessageContent,
    status: MessageStatus,
    created_at: Timestamp,
}

impl Message {
    /// Creates a freshly accepted message: new id, current time, status `sent`.
    pub fn new(sender_id: UserId, target: MessageTarget, content: MessageContent) -> Self {
        Self {
            id: MessageId::new(),
            sender_id,
            target,
            content,
            status: MessageStatus::Sent,
            created_at: Timestamp::unique_now_micros(),
        }
    }

    /// Rebuilds a message loaded from storage.
    pub fn reconstitute(
        id: MessageId,
        sender_id: UserId,
        target: MessageTarget,
        content: MessageContent,
        status: MessageStatus,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            sender_id,
            target,
            content,
            status,
            created_at,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn sender_id(&self) -> UserId {
        self.sender_id
    }

    pub fn target(&self) -> MessageTarget {
        self.target
    }

    pub fn recipient_id(&self) -> Option<UserId> {
        self.target.recipient_id()
    }

    pub fn group_id(&self) -> Option<GroupId> {
        self.target.group_id()
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    pub fn status(&self) -> MessageStatus {
        self.status
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Outbox expiry for this message given a retention window.
    pub fn expires_at(&self, ttl: chrono::Duration) -> Timestamp {
        self.created_at.plus(ttl)
    }
}
