//! Message lifecycle status.

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delivery status of a message.
///
/// Moves only forward: `sent -> delivered -> seen`. A message may skip
/// `delivered` when the recipient reports it as seen directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Persisted by the server, not yet confirmed by the recipient.
    Sent,
    /// A recipient device confirmed receipt.
    Delivered,
    /// The recipient opened the message.
    Seen,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Sent => "sent",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Seen => "seen",
        }
    }

    /// Advances to `target`; backward and same-state moves are rejected.
    pub fn advance_to(&self, target: MessageStatus) -> Result<MessageStatus, ValidationError> {
        self.transition_to(target)
    }

    fn rank(&self) -> u8 {
        match self {
            MessageStatus::Sent => 0,
            MessageStatus::Delivered => 1,
            MessageStatus::Seen => 2,
        }
    }
}

impl StateMachine for MessageStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        target.rank() > self.rank()
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            MessageStatus::Sent => vec![MessageStatus::Delivered, MessageStatus::Seen],
            MessageStatus::Delivered => vec![MessageStatus::Seen],
            MessageStatus::Seen => vec![],
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(MessageStatus::Sent),
            "delivered" => Ok(MessageStatus::Delivered),
            "seen" => Ok(MessageStatus::Seen),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}
