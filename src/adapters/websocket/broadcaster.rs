//! `MessageBroadcaster` backed by the connection hub.

use super::hub::{Hub, HubError};
use super::messages::{MessageDto, ServerFrame};
use crate::domain::foundation::{ConnectionId, UserId};
use crate::domain::messaging::Message;
use crate::ports::{MessageBroadcaster, SentAcknowledgement, SubmissionRejection};

/// Encodes frames once and hands them to the hub.
#[derive(Debug, Clone)]
pub struct HubBroadcaster {
    hub: Hub,
}

impl HubBroadcaster {
    pub fn new(hub: Hub) -> Self {
        Self { hub }
    }

    fn encode(frame: &ServerFrame) -> Option<String> {
        match frame.encode() {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::error!(error = %err, "failed to encode server frame");
                None
            }
        }
    }

    fn report(result: Result<(), HubError>) {
        if let Err(err) = result {
            tracing::warn!(error = %err, "live delivery skipped");
        }
    }
}

impl MessageBroadcaster for HubBroadcaster {
    fn acknowledge_sender(&self, connection_id: &ConnectionId, ack: &SentAcknowledgement) {
        if let Some(text) = Self::encode(&ServerFrame::MessageSentAck(ack.into())) {
            Self::report(self.hub.send_to_connection(*connection_id, text));
        }
    }

    fn reject_submission(&self, connection_id: &ConnectionId, rejection: &SubmissionRejection) {
        if let Some(text) = Self::encode(&ServerFrame::Error(rejection.into())) {
            Self::report(self.hub.send_to_connection(*connection_id, text));
        }
    }

    fn push_to_user(&self, user_id: &UserId, message: &Message) {
        if let Some(text) = Self::encode(&ServerFrame::NewMessage(MessageDto::from(message))) {
            Self::report(self.hub.send_to_user(*user_id, text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{MessageId, Timestamp};
    use crate::domain::messaging::{MessageContent, MessageTarget};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn ack_goes_only_to_the_submitting_connection() {
        let (hub, _task) = Hub::spawn();
        let user = UserId::new();
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        hub.register(a, user, tx_a).unwrap();
        hub.register(b, user, tx_b).unwrap();

        HubBroadcaster::new(hub.clone()).acknowledge_sender(
            &a,
            &SentAcknowledgement {
                temp_id: "t".to_string(),
                message_id: MessageId::new(),
                created_at: Timestamp::now_micros(),
            },
        );
        hub.snapshot().await.unwrap();

        assert!(rx_a.try_recv().unwrap().contains("MESSAGE_SENT_ACK"));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn push_reaches_all_sessions_of_recipient() {
        let (hub, _task) = Hub::spawn();
        let recipient = UserId::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        hub.register(ConnectionId::new(), recipient, tx_a).unwrap();
        hub.register(ConnectionId::new(), recipient, tx_b).unwrap();
        let message = Message::new(
            UserId::new(),
            MessageTarget::Direct(recipient),
            MessageContent::new("ping pong").unwrap(),
        );

        HubBroadcaster::new(hub.clone()).push_to_user(&recipient, &message);
        hub.snapshot().await.unwrap();

        assert!(rx_a.try_recv().unwrap().contains(&message.id().to_string()));
        assert!(rx_b.try_recv().unwrap().contains(&message.id().to_string()));
    }

    #[tokio::test]
    async fn stopped_hub_is_absorbed() {
        let (hub, task) = Hub::spawn();
        let broadcaster = HubBroadcaster::new(hub.clone());
        task.abort();
        let _ = task.await;

        let message = Message::new(
            UserId::new(),
            MessageTarget::Direct(UserId::new()),
            MessageContent::new("lost").unwrap(),
        );
        broadcaster.push_to_user(&UserId::new(), &message);
    }
}
