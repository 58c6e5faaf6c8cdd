//! Keyset pagination over message creation time.

use super::Message;
use crate::domain::foundation::{Timestamp, ValidationError};
use std::fmt;

/// Exclusive lower bound for a pending-message page.
///
/// On the wire the cursor is the RFC 3339 creation time of the last item of
/// the previous page; an empty string means "from the beginning".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageCursor {
    #[default]
    Start,
    After(Timestamp),
}

impl PageCursor {
    /// Parses the wire form. Empty or whitespace-only input is `Start`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(PageCursor::Start);
        }
        Timestamp::parse_rfc3339(raw)
            .map(PageCursor::After)
            .map_err(|e| ValidationError::invalid_format("cursor", e.to_string()))
    }

    /// The timestamp items must be strictly newer than, if any.
    pub fn after(&self) -> Option<Timestamp> {
        match self {
            PageCursor::Start => None,
            PageCursor::After(ts) => Some(*ts),
        }
    }

    /// True if `at` lies strictly after this cursor.
    pub fn admits(&self, at: &Timestamp) -> bool {
        match self {
            PageCursor::Start => true,
            PageCursor::After(ts) => at.is_after(ts),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            PageCursor::Start => String::new(),
            PageCursor::After(ts) => ts.to_rfc3339_nanos(),
        }
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// One page of messages awaiting delivery confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PendingPage {
    pub messages: Vec<Message>,
    /// Present only when the page came back full.
    pub next_cursor: Option<PageCursor>,
}

impl PendingPage {
    /// Builds a page, emitting a next cursor only for a full page.
    ///
    /// A short page is the end-of-data signal.
    pub fn from_messages(messages: Vec<Message>, limit: usize) -> Self {
        let next_cursor = if limit > 0 && messages.len() == limit {
            messages.last().map(|m| PageCursor::After(m.created_at()))
        } else {
            None
        };
        Self {
            messages,
            next_cursor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
