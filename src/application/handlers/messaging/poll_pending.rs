//! PollPendingHandler - Bounded long-poll over the pending listing.
//!
//! Samples the outbox right away and then once per interval until something
//! shows up or the wall-clock bound passes. Dropping the returned future
//! stops the poll and releases its timers.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use super::FetchPendingHandler;
use crate::domain::foundation::UserId;
use crate::domain::messaging::{MessagingError, PageCursor, PendingPage};

/// Query for a long-poll.
#[derive(Debug, Clone)]
pub struct PollPendingQuery {
    pub user_id: UserId,
}

/// Result of a long-poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// At least one pending message, from the start of retained history.
    Messages(PendingPage),
    /// The bound elapsed with nothing pending.
    NoContent,
}

/// Poll timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(25),
        }
    }
}

/// Handler for long-polls.
pub struct PollPendingHandler {
    fetch: Arc<FetchPendingHandler>,
    settings: PollSettings,
}

impl PollPendingHandler {
    pub fn new(fetch: Arc<FetchPendingHandler>, settings: PollSettings) -> Self {
        Self { fetch, settings }
    }

    pub async fn handle(&self, query: PollPendingQuery) -> Result<PollOutcome, MessagingError> {
        let limit = self.fetch.limits().default_limit;
        let deadline = Instant::now() + self.settings.timeout;
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::debug!(user_id = %query.user_id, "poll elapsed with nothing pending");
                    return Ok(PollOutcome::NoContent);
                }
                _ = ticker.tick() => {
                    // A sample still in flight at the deadline is abandoned.
                    let sample = self.fetch.fetch(&query.user_id, &PageCursor::Start, limit);
                    let Ok(page) = tokio::time::timeout_at(deadline, sample).await else {
                        tracing::debug!(user_id = %query.user_id, "poll elapsed during a sample");
                        return Ok(PollOutcome::NoContent);
                    };
                    let page = page?;
                    if !page.is_empty() {
                        return Ok(PollOutcome::Messages(page));
                    }
                }
            }
        }
    }
}
