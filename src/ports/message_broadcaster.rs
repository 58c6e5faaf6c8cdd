//! MessageBroadcaster port - Best-effort live delivery to open connections.
//!
//! Calls never block on a slow peer and never fail: a frame that cannot be
//! queued is dropped. The outbox remains the correctness backstop.

use crate::domain::foundation::{ConnectionId, MessageId, Timestamp, UserId};
use crate::domain::messaging::Message;

/// Correlates a client's temporary id with the server-assigned identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentAcknowledgement {
    pub temp_id: String,
    pub message_id: MessageId,
    pub created_at: Timestamp,
}

/// Rejection reported to the connection that submitted a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRejection {
    pub temp_id: Option<String>,
    pub code: String,
    pub message: String,
}

/// Pushes frames to live sessions.
pub trait MessageBroadcaster: Send + Sync {
    /// Sends the acknowledgement to the submitting connection only.
    fn acknowledge_sender(&self, connection_id: &ConnectionId, ack: &SentAcknowledgement);

    /// Sends a rejection to the submitting connection only.
    fn reject_submission(&self, connection_id: &ConnectionId, rejection: &SubmissionRejection);

    /// Pushes the message to every live session of `user_id`.
    fn push_to_user(&self, user_id: &UserId, message: &Message);
}
