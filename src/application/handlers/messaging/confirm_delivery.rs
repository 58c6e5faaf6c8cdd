//! ConfirmDeliveryHandler - Applies a recipient's delivery acknowledgement.
//!
//! Nothing here is reported back to a client. A failed retire is logged and
//! left for the outbox TTL to clean up.

use std::sync::Arc;

use crate::domain::foundation::{MessageId, UserId};
use crate::domain::messaging::MessageStatus;
use crate::ports::MessageOutbox;

/// Acknowledgement received from a recipient session.
#[derive(Debug, Clone)]
pub struct ConfirmDeliveryCommand {
    /// The authenticated user of the acknowledging session.
    pub user_id: UserId,
    pub message_id: MessageId,
    pub status: MessageStatus,
}

/// What the acknowledgement caused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// `delivered`: the outbox entry was removed.
    Retired,
    /// `delivered`, but the outbox call failed.
    RetireFailed,
    /// `seen`: accepted; nothing is sent to the original sender.
    SeenNotPropagated,
    /// `sent` carries no information from a recipient.
    Ignored,
}

/// Handler for delivery acknowledgements.
pub struct ConfirmDeliveryHandler {
    outbox: Arc<dyn MessageOutbox>,
}

impl ConfirmDeliveryHandler {
    pub fn new(outbox: Arc<dyn MessageOutbox>) -> Self {
        Self { outbox }
    }

    pub async fn handle(&self, cmd: ConfirmDeliveryCommand) -> AckOutcome {
        // Every outbox entry is still `sent`; only a forward move means anything.
        if MessageStatus::Sent.advance_to(cmd.status).is_err() {
            tracing::debug!(
                message_id = %cmd.message_id,
                user_id = %cmd.user_id,
                status = %cmd.status,
                "ignoring acknowledgement that does not advance the message"
            );
            return AckOutcome::Ignored;
        }

        match cmd.status {
            MessageStatus::Delivered => match self.outbox.retire(&cmd.message_id).await {
                Ok(()) => {
                    tracing::debug!(
                        message_id = %cmd.message_id,
                        user_id = %cmd.user_id,
                        "message retired from outbox"
                    );
                    AckOutcome::Retired
                }
                Err(err) => {
                    tracing::error!(
                        message_id = %cmd.message_id,
                        user_id = %cmd.user_id,
                        error = %err,
                        "failed to retire delivered message"
                    );
                    AckOutcome::RetireFailed
                }
            },
            MessageStatus::Seen => {
                tracing::info!(
                    message_id = %cmd.message_id,
                    user_id = %cmd.user_id,
                    "seen status not propagated"
                );
                AckOutcome::SeenNotPropagated
            }
            MessageStatus::Sent => AckOutcome::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::DomainError;
    use crate::domain::messaging::{Message, PageCursor};
    use crate::ports::OutboxPage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockOutbox {
        retired: Mutex<Vec<MessageId>>,
        fail_retire: bool,
    }

    #[async_trait]
    impl MessageOutbox for MockOutbox {
        async fn persist(&self, _message: &Message, _ttl: chrono::Duration) -> Result<(), DomainError> {
            Ok(())
        }

        async fn retire(&self, message_id: &MessageId) -> Result<(), DomainError> {
            if self.fail_retire {
                return Err(DomainError::database("Simulated retire failure"));
            }
            self.retired.lock().unwrap().push(*message_id);
            Ok(())
        }

        async fn list_pending(
            &self,
            _user_id: &UserId,
            _cursor: &PageCursor,
            _limit: u32,
        ) -> Result<OutboxPage, DomainError> {
            Ok(OutboxPage::default())
        }
    }

    fn command(status: MessageStatus) -> ConfirmDeliveryCommand {
        ConfirmDeliveryCommand {
            user_id: UserId::new(),
            message_id: MessageId::new(),
            status,
        }
    }

    #[tokio::test]
    async fn delivered_retires_the_message() {
        let outbox = Arc::new(MockOutbox::default());
        let handler = ConfirmDeliveryHandler::new(outbox.clone());
        let cmd = command(MessageStatus::Delivered);
        let id = cmd.message_id;

        assert_eq!(handler.handle(cmd).await, AckOutcome::Retired);
        assert_eq!(*outbox.retired.lock().unwrap(), vec![id]);
    }

    #[tokio::test]
    async fn seen_does_not_retire() {
        let outbox = Arc::new(MockOutbox::default());
        let handler = ConfirmDeliveryHandler::new(outbox.clone());

        assert_eq!(
            handler.handle(command(MessageStatus::Seen)).await,
            AckOutcome::SeenNotPropagated
        );
        assert!(outbox.retired.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sent_is_ignored() {
        let outbox = Arc::new(MockOutbox::default());
        let handler = ConfirmDeliveryHandler::new(outbox.clone());

        assert_eq!(handler.handle(command(MessageStatus::Sent)).await, AckOutcome::Ignored);
        assert!(outbox.retired.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn retire_failure_is_absorbed() {
        let outbox = Arc::new(MockOutbox {
            fail_retire: true,
            ..Default::default()
        });
        let handler = ConfirmDeliveryHandler::new(outbox);

        assert_eq!(
            handler.handle(command(MessageStatus::Delivered)).await,
            AckOutcome::RetireFailed
        );
    }
}
