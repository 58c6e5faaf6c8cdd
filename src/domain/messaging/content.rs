//! Message body and addressing value objects.

use crate::domain::foundation::{GroupId, UserId, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message body holding between 1 and 500 Unicode scalar values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageContent(String);

impl MessageContent {
    /// Maximum length in code points.
    pub const MAX_CHARS: usize = 500;

    /// Validates and wraps a message body.
    ///
    /// Length is counted in code points, not bytes: 500 emoji are accepted.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let len = value.chars().count();
        if len == 0 {
            return Err(ValidationError::empty_field("content"));
        }
        if len > Self::MAX_CHARS {
            return Err(ValidationError::out_of_range(
                "content",
                1,
                Self::MAX_CHARS as i32,
                len.min(i32::MAX as usize) as i32,
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MessageContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a message is addressed: exactly one user or exactly one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTarget {
    Direct(UserId),
    Group(GroupId),
}

impl MessageTarget {
    /// Builds a target from the optional pair a client declares.
    ///
    /// Naming both or neither is rejected.
    pub fn from_parts(
        recipient_id: Option<UserId>,
        group_id: Option<GroupId>,
    ) -> Result<Self, ValidationError> {
        match (recipient_id, group_id) {
            (Some(user), None) => Ok(MessageTarget::Direct(user)),
            (None, Some(group)) => Ok(MessageTarget::Group(group)),
            (Some(_), Some(_)) => Err(ValidationError::invalid_format(
                "target",
                "message cannot name both a recipient and a group",
            )),
            (None, None) => Err(ValidationError::empty_field("target")),
        }
    }

    pub fn recipient_id(&self) -> Option<UserId> {
        match self {
            MessageTarget::Direct(user) => Some(*user),
            MessageTarget::Group(_) => None,
        }
    }

    pub fn group_id(&self) -> Option<GroupId> {
        match self {
            MessageTarget::Direct(_) => None,
            MessageTarget::Group(group) => Some(*group),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, MessageTarget::Group(_))
    }
}
