//! SubmitMessageHandler - Accepts a new chat message from a live session.
//!
//! Ordering is what makes delivery at-least-once: the message is persisted
//! before the sender is acknowledged, and live push only happens after that.
//! A failure at any step before the ack leaves no trace and sends no ack.

use std::sync::Arc;

use crate::domain::foundation::{ConnectionId, GroupId, UserId};
use crate::domain::messaging::{Message, MessageContent, MessageTarget, MessagingError};
use crate::ports::{MessageBroadcaster, MessageOutbox, RelationshipChecker, SentAcknowledgement};

/// Command to submit a new message.
#[derive(Debug, Clone)]
pub struct SubmitMessageCommand {
    pub sender_id: UserId,
    /// Connection the message arrived on; receives the acknowledgement.
    pub connection_id: ConnectionId,
    /// Client-chosen id echoed back in the acknowledgement.
    pub temp_id: String,
    pub recipient_id: Option<UserId>,
    pub group_id: Option<GroupId>,
    pub content: String,
}

/// What happened on the live push path after the message was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveDelivery {
    /// Handed to the recipient's live sessions (which may hold none).
    Pushed,
    /// Sender and recipient are a blocked pair; nothing was pushed.
    Suppressed,
    /// Group-addressed; stored only, fan-out is not performed.
    GroupDeferred,
    /// The block lookup failed; nothing was pushed.
    CheckFailed,
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmitMessageResult {
    pub message: Message,
    pub live_delivery: LiveDelivery,
}

/// Handler for message submission.
pub struct SubmitMessageHandler {
    outbox: Arc<dyn MessageOutbox>,
    relationships: Arc<dyn RelationshipChecker>,
    broadcaster: Arc<dyn MessageBroadcaster>,
    ttl: chrono::Duration,
}

impl SubmitMessageHandler {
    pub fn new(
        outbox: Arc<dyn MessageOutbox>,
        relationships: Arc<dyn RelationshipChecker>,
        broadcaster: Arc<dyn MessageBroadcaster>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            outbox,
            relationships,
            broadcaster,
            ttl,
        }
    }

    pub async fn handle(
        &self,
        cmd: SubmitMessageCommand,
    ) -> Result<SubmitMessageResult, MessagingError> {
        // 1. Validate shape and content
        let target = MessageTarget::from_parts(cmd.recipient_id, cmd.group_id)?;
        let content = MessageContent::new(cmd.content)?;
        let message = Message::new(cmd.sender_id, target, content);

        // 2. Persist before anything leaves the server
        self.outbox.persist(&message, self.ttl).await?;

        tracing::debug!(
            message_id = %message.id(),
            sender_id = %message.sender_id(),
            "message persisted"
        );

        // 3. Acknowledge the sender on the connection it used
        self.broadcaster.acknowledge_sender(
            &cmd.connection_id,
            &SentAcknowledgement {
                temp_id: cmd.temp_id,
                message_id: message.id(),
                created_at: message.created_at(),
            },
        );

        // 4. Live push
        let live_delivery = match message.target() {
            MessageTarget::Group(group_id) => {
                tracing::debug!(
                    message_id = %message.id(),
                    group_id = %group_id,
                    "group message stored; live fan-out not performed"
                );
                LiveDelivery::GroupDeferred
            }
            MessageTarget::Direct(recipient_id) => {
                self.push_direct(&message, &recipient_id).await
            }
        };

        Ok(SubmitMessageResult {
            message,
            live_delivery,
        })
    }

    async fn push_direct(&self, message: &Message, recipient_id: &UserId) -> LiveDelivery {
        match self
            .relationships
            .is_blocked(&message.sender_id(), recipient_id)
            .await
        {
            Ok(true) => {
                tracing::debug!(
                    message_id = %message.id(),
                    recipient_id = %recipient_id,
                    "live push suppressed for blocked pair"
                );
                LiveDelivery::Suppressed
            }
            Ok(false) => {
                self.broadcaster.push_to_user(recipient_id, message);
                LiveDelivery::Pushed
            }
            Err(err) => {
                tracing::warn!(
                    message_id = %message.id(),
                    recipient_id = %recipient_id,
                    error = %err,
                    "block check failed; live push skipped"
                );
                LiveDelivery::CheckFailed
            }
        }
    }
}
