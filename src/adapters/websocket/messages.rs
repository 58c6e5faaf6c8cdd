//! WebSocket frame types for chat delivery.
//!
//! Every frame is a JSON envelope `{"type": KIND, "payload": {...}}` with
//! camelCase payload fields:
//! - Client → Server: `NEW_MESSAGE`, `MESSAGE_ACK`, `PING`
//! - Server → Client: `MESSAGE_SENT_ACK`, `NEW_MESSAGE`, `PONG`, `ERROR`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{GroupId, MessageId, UserId};
use crate::domain::messaging::{Message, MessageStatus};
use crate::ports::{SentAcknowledgement, SubmissionRejection};

// ============================================
// Client → Server Frames
// ============================================

/// A decoded frame from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    /// Submit a new message.
    NewMessage(NewMessagePayload),
    /// Recipient confirms delivery (or seen) of a message.
    MessageAck(MessageAckPayload),
    /// Application-level liveness request.
    Ping,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessagePayload {
    pub temp_id: String,
    #[serde(default)]
    pub recipient_id: Option<UserId>,
    #[serde(default)]
    pub group_id: Option<GroupId>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAckPayload {
    pub message_id: MessageId,
    pub status: MessageStatus,
    /// Declared by the client; the session's own identity is authoritative.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Why an inbound frame could not be decoded.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Decodes a text frame.
///
/// Returns `Ok(None)` for well-formed envelopes of a kind this server does
/// not handle.
pub fn decode_client_frame(text: &str) -> Result<Option<ClientFrame>, FrameError> {
    let envelope: RawEnvelope = serde_json::from_str(text).map_err(FrameError::Malformed)?;

    let payload_error = |source| FrameError::InvalidPayload {
        kind: envelope.kind.clone(),
        source,
    };

    let frame = match envelope.kind.as_str() {
        "NEW_MESSAGE" => ClientFrame::NewMessage(
            serde_json::from_value(envelope.payload.clone()).map_err(payload_error)?,
        ),
        "MESSAGE_ACK" => ClientFrame::MessageAck(
            serde_json::from_value(envelope.payload.clone()).map_err(payload_error)?,
        ),
        "PING" => ClientFrame::Ping,
        _ => return Ok(None),
    };
    Ok(Some(frame))
}

// ============================================
// Server → Client Frames
// ============================================

/// All frames the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerFrame {
    /// Correlates the sender's temporary id with the stored message.
    MessageSentAck(MessageSentAckPayload),
    /// Live push of a message to its recipient.
    NewMessage(MessageDto),
    /// Answer to `PING`.
    Pong,
    /// A submission was rejected or failed.
    Error(ErrorPayload),
}

impl ServerFrame {
    /// Serializes the frame to its JSON text form.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSentAckPayload {
    pub temp_id: String,
    pub message_id: String,
    pub created_at: String,
}

impl From<&SentAcknowledgement> for MessageSentAckPayload {
    fn from(ack: &SentAcknowledgement) -> Self {
        Self {
            temp_id: ack.temp_id.clone(),
            message_id: ack.message_id.to_string(),
            created_at: ack.created_at.to_rfc3339_nanos(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,
    pub code: String,
    pub message: String,
}

impl From<&SubmissionRejection> for ErrorPayload {
    fn from(rejection: &SubmissionRejection) -> Self {
        Self {
            temp_id: rejection.temp_id.clone(),
            code: rejection.code.clone(),
            message: rejection.message.clone(),
        }
    }
}

/// Full message as seen by clients, over WebSocket and HTTP alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub sender_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: String,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id().to_string(),
            sender_id: message.sender_id().to_string(),
            recipient_id: message.recipient_id().map(|id| id.to_string()),
            group_id: message.group_id().map(|id| id.to_string()),
            content: message.content().as_str().to_string(),
            status: message.status(),
            created_at: message.created_at().to_rfc3339_nanos(),
        }
    }
}
