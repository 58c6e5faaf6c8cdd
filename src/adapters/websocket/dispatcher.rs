//! Routes decoded client frames to the messaging handlers.

use std::sync::Arc;

use super::messages::{ClientFrame, MessageAckPayload, NewMessagePayload};
use crate::application::handlers::messaging::{
    ConfirmDeliveryCommand, ConfirmDeliveryHandler, SubmitMessageCommand, SubmitMessageHandler,
};
use crate::domain::foundation::{ConnectionId, UserId};
use crate::domain::messaging::MessagingError;
use crate::ports::{MessageBroadcaster, SubmissionRejection};

/// Identity of the session a frame arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOrigin {
    pub user_id: UserId,
    pub connection_id: ConnectionId,
}

/// Dispatches frames from any session.
pub struct FrameDispatcher {
    submit: SubmitMessageHandler,
    confirm: ConfirmDeliveryHandler,
    broadcaster: Arc<dyn MessageBroadcaster>,
}

impl FrameDispatcher {
    pub fn new(
        submit: SubmitMessageHandler,
        confirm: ConfirmDeliveryHandler,
        broadcaster: Arc<dyn MessageBroadcaster>,
    ) -> Self {
        Self {
            submit,
            confirm,
            broadcaster,
        }
    }

    pub async fn dispatch(&self, origin: &SessionOrigin, frame: ClientFrame) {
        match frame {
            ClientFrame::NewMessage(payload) => self.on_new_message(origin, payload).await,
            ClientFrame::MessageAck(payload) => self.on_ack(origin, payload).await,
            // Answered by the read loop.
            ClientFrame::Ping => {}
        }
    }

    async fn on_new_message(&self, origin: &SessionOrigin, payload: NewMessagePayload) {
        let temp_id = payload.temp_id.clone();
        let cmd = SubmitMessageCommand {
            sender_id: origin.user_id,
            connection_id: origin.connection_id,
            temp_id: payload.temp_id,
            recipient_id: payload.recipient_id,
            group_id: payload.group_id,
            content: payload.content,
        };

        match self.submit.handle(cmd).await {
            Ok(result) => {
                tracing::debug!(
                    user_id = %origin.user_id,
                    message_id = %result.message.id(),
                    live_delivery = ?result.live_delivery,
                    "message submitted"
                );
            }
            Err(err) => {
                log_rejection(origin, &err);
                self.broadcaster.reject_submission(
                    &origin.connection_id,
                    &SubmissionRejection {
                        temp_id: Some(temp_id),
                        code: err.code().to_string(),
                        message: err.message(),
                    },
                );
            }
        }
    }

    async fn on_ack(&self, origin: &SessionOrigin, payload: MessageAckPayload) {
        if let Some(declared) = payload.user_id.as_deref() {
            if declared != origin.user_id.to_string() {
                tracing::debug!(
                    user_id = %origin.user_id,
                    declared_user_id = declared,
                    "ack declares a different user; using session identity"
                );
            }
        }

        self.confirm
            .handle(ConfirmDeliveryCommand {
                user_id: origin.user_id,
                message_id: payload.message_id,
                status: payload.status,
            })
            .await;
    }
}

fn log_rejection(origin: &SessionOrigin, err: &MessagingError) {
    match err {
        MessagingError::Storage(_) => tracing::error!(
            user_id = %origin.user_id,
            connection_id = %origin.connection_id,
            error = %err,
            "message submission failed"
        ),
        _ => tracing::info!(
            user_id = %origin.user_id,
            connection_id = %origin.connection_id,
            error = %err,
            "message submission rejected"
        ),
    }
}
