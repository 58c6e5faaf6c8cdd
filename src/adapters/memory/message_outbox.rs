//! In-memory message outbox.
//!
//! Mirrors the PostgreSQL adapter's visibility rules so handler and
//! integration tests exercise the same pending semantics.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, MessageId, Timestamp, UserId};
use crate::domain::messaging::{Message, MessageTarget, PageCursor};
use crate::ports::{MessageOutbox, OutboxPage};

use super::relationship_store::InMemoryRelationshipStore;

#[derive(Debug, Clone)]
struct OutboxEntry {
    message: Message,
    expires_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct InMemoryMessageOutbox {
    entries: Arc<RwLock<HashMap<MessageId, OutboxEntry>>>,
    relationships: Arc<InMemoryRelationshipStore>,
}

impl InMemoryMessageOutbox {
    pub fn new(relationships: Arc<InMemoryRelationshipStore>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            relationships,
        }
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn contains(&self, message_id: &MessageId) -> bool {
        self.entries.read().await.contains_key(message_id)
    }

    async fn addressed_to(&self, message: &Message, user_id: &UserId) -> bool {
        match message.target() {
            MessageTarget::Direct(recipient) => recipient == *user_id,
            MessageTarget::Group(group_id) => {
                self.relationships.is_member(&group_id, user_id).await
            }
        }
    }
}

#[async_trait]
impl MessageOutbox for InMemoryMessageOutbox {
    async fn persist(&self, message: &Message, ttl: chrono::Duration) -> Result<(), DomainError> {
        let entry = OutboxEntry {
            message: message.clone(),
            expires_at: message.expires_at(ttl),
        };
        self.entries.write().await.insert(message.id(), entry);
        Ok(())
    }

    async fn retire(&self, message_id: &MessageId) -> Result<(), DomainError> {
        self.entries.write().await.remove(message_id);
        Ok(())
    }

    async fn list_pending(
        &self,
        user_id: &UserId,
        cursor: &PageCursor,
        limit: u32,
    ) -> Result<OutboxPage, DomainError> {
        let now = Timestamp::now();
        let candidates: Vec<Message> = {
            let entries = self.entries.read().await;
            entries
                .values()
                .filter(|e| e.expires_at.is_after(&now))
                .filter(|e| e.message.sender_id() != *user_id)
                .filter(|e| cursor.admits(&e.message.created_at()))
                .map(|e| e.message.clone())
                .collect()
        };

        let mut items = Vec::with_capacity(candidates.len());
        for message in candidates {
            if !self.addressed_to(&message, user_id).await {
                continue;
            }
            if self
                .relationships
                .blocked_between(&message.sender_id(), user_id)
                .await
            {
                continue;
            }
            items.push(message);
        }

        items.sort_by_key(|m| m.created_at());
        items.truncate(limit as usize);
        let has_more = limit > 0 && items.len() == limit as usize;

        Ok(OutboxPage { items, has_more })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::GroupId;
    use crate::domain::messaging::{MessageContent, MessageStatus};

    fn outbox() -> (InMemoryMessageOutbox, Arc<InMemoryRelationshipStore>) {
        let relationships = Arc::new(InMemoryRelationshipStore::new());
        (InMemoryMessageOutbox::new(relationships.clone()), relationships)
    }

    fn direct_at(sender: UserId, recipient: UserId, micros: i64) -> Message {
        let created_at = Timestamp::from_datetime(
            chrono::DateTime::from_timestamp_micros(1_700_000_000_000_000 + micros).unwrap(),
        );
        Message::reconstitute(
            MessageId::new(),
            sender,
            MessageTarget::Direct(recipient),
            MessageContent::new("hello").unwrap(),
            MessageStatus::Sent,
            created_at,
        )
    }

    fn fresh(sender: UserId, target: MessageTarget) -> Message {
        Message::new(sender, target, MessageContent::new("hello").unwrap())
    }

    const TTL_HOURS: i64 = 24;

    #[tokio::test]
    async fn pending_is_sorted_ascending_and_limited() {
        let (outbox, _) = outbox();
        let (sender, recipient) = (UserId::new(), UserId::new());
        let ttl = chrono::Duration::days(365 * 50);
        for micros in [30, 10, 20] {
            outbox
                .persist(&direct_at(sender, recipient, micros), ttl)
                .await
                .unwrap();
        }

        let page = outbox
            .list_pending(&recipient, &PageCursor::Start, 2)
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);
        assert!(page.items[0].created_at().is_before(&page.items[1].created_at()));
    }

    #[tokio::test]
    async fn cursor_is_exclusive() {
        let (outbox, _) = outbox();
        let (sender, recipient) = (UserId::new(), UserId::new());
        let ttl = chrono::Duration::days(365 * 50);
        let first = direct_at(sender, recipient, 1);
        let second = direct_at(sender, recipient, 2);
        outbox.persist(&first, ttl).await.unwrap();
        outbox.persist(&second, ttl).await.unwrap();

        let page = outbox
            .list_pending(&recipient, &PageCursor::After(first.created_at()), 10)
            .await
            .unwrap();

        assert_eq!(page.items, vec![second]);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn expired_entries_are_hidden() {
        let (outbox, _) = outbox();
        let recipient = UserId::new();
        let message = fresh(UserId::new(), MessageTarget::Direct(recipient));
        outbox
            .persist(&message, chrono::Duration::seconds(-1))
            .await
            .unwrap();

        let page = outbox
            .list_pending(&recipient, &PageCursor::Start, 10)
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(outbox.len().await, 1);
    }

    #[tokio::test]
    async fn own_messages_are_excluded() {
        let (outbox, relationships) = outbox();
        let group = GroupId::new();
        let author = UserId::new();
        relationships.add_group_member(group, author).await;
        outbox
            .persist(
                &fresh(author, MessageTarget::Group(group)),
                chrono::Duration::hours(TTL_HOURS),
            )
            .await
            .unwrap();

        let page = outbox
            .list_pending(&author, &PageCursor::Start, 10)
            .await
            .unwrap();

        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn group_messages_reach_members_only() {
        let (outbox, relationships) = outbox();
        let group = GroupId::new();
        let (member, outsider) = (UserId::new(), UserId::new());
        relationships.add_group_member(group, member).await;
        outbox
            .persist(
                &fresh(UserId::new(), MessageTarget::Group(group)),
                chrono::Duration::hours(TTL_HOURS),
            )
            .await
            .unwrap();

        let member_page = outbox
            .list_pending(&member, &PageCursor::Start, 10)
            .await
            .unwrap();
        let outsider_page = outbox
            .list_pending(&outsider, &PageCursor::Start, 10)
            .await
            .unwrap();

        assert_eq!(member_page.items.len(), 1);
        assert!(outsider_page.items.is_empty());
    }

    #[tokio::test]
    async fn blocked_senders_are_excluded_in_both_directions() {
        let (outbox, relationships) = outbox();
        let (sender, recipient) = (UserId::new(), UserId::new());
        outbox
            .persist(
                &fresh(sender, MessageTarget::Direct(recipient)),
                chrono::Duration::hours(TTL_HOURS),
            )
            .await
            .unwrap();

        relationships.block(sender, recipient).await;
        let page = outbox
            .list_pending(&recipient, &PageCursor::Start, 10)
            .await
            .unwrap();
        assert!(page.items.is_empty());

        relationships.unblock(sender, recipient).await;
        relationships.block(recipient, sender).await;
        let page = outbox
            .list_pending(&recipient, &PageCursor::Start, 10)
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn retire_removes_entry_and_tolerates_absence() {
        let (outbox, _) = outbox();
        let recipient = UserId::new();
        let message = fresh(UserId::new(), MessageTarget::Direct(recipient));
        outbox
            .persist(&message, chrono::Duration::hours(TTL_HOURS))
            .await
            .unwrap();

        outbox.retire(&message.id()).await.unwrap();
        outbox.retire(&message.id()).await.unwrap();

        assert!(!outbox.contains(&message.id()).await);
    }
}
