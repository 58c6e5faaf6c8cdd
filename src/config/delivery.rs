//! Delivery tuning: session pumps, outbox retention and offline retrieval.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::websocket::SessionSettings;
use crate::application::handlers::messaging::{PageLimits, PollSettings};

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Outbound frames buffered per session before live pushes are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Largest inbound frame accepted, in bytes
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default = "default_ping_period")]
    pub ping_period_secs: u64,

    /// Read deadline; must exceed two probe periods
    #[serde(default = "default_pong_wait")]
    pub pong_wait_secs: u64,

    #[serde(default = "default_write_wait")]
    pub write_wait_secs: u64,

    /// How long an unacknowledged message stays retrievable
    #[serde(default = "default_outbox_ttl")]
    pub outbox_ttl_hours: i64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    #[serde(default = "default_page_limit")]
    pub default_page_limit: u32,

    #[serde(default = "default_max_page_limit")]
    pub max_page_limit: u32,
}

impl DeliveryConfig {
    pub fn to_session_settings(&self) -> SessionSettings {
        SessionSettings {
            queue_capacity: self.queue_capacity,
            max_frame_bytes: self.max_frame_bytes,
            ping_period: Duration::from_secs(self.ping_period_secs),
            pong_wait: Duration::from_secs(self.pong_wait_secs),
            write_wait: Duration::from_secs(self.write_wait_secs),
        }
    }

    pub fn to_poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_secs(self.poll_timeout_secs),
        }
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_limit: self.default_page_limit,
            max_limit: self.max_page_limit,
        }
    }

    pub fn outbox_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.outbox_ttl_hours)
            .unwrap_or_else(|| chrono::Duration::hours(default_outbox_ttl()))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive: [(&'static str, bool); 9] = [
            ("queue_capacity", self.queue_capacity > 0),
            ("max_frame_bytes", self.max_frame_bytes > 0),
            ("ping_period_secs", self.ping_period_secs > 0),
            ("write_wait_secs", self.write_wait_secs > 0),
            ("outbox_ttl_hours", self.outbox_ttl_hours > 0),
            ("poll_interval_ms", self.poll_interval_ms > 0),
            ("poll_timeout_secs", self.poll_timeout_secs > 0),
            ("default_page_limit", self.default_page_limit > 0),
            ("max_page_limit", self.max_page_limit > 0),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, ok)| !ok) {
            return Err(ValidationError::ZeroDeliverySetting { field });
        }

        if self.pong_wait_secs <= self.ping_period_secs.saturating_mul(2) {
            return Err(ValidationError::LivenessRatio {
                ping_period: self.ping_period_secs,
                pong_wait: self.pong_wait_secs,
            });
        }
        if self.default_page_limit > self.max_page_limit {
            return Err(ValidationError::PageLimitOrder {
                default: self.default_page_limit,
                max: self.max_page_limit,
            });
        }
        if self.poll_interval_ms >= self.poll_timeout_secs.saturating_mul(1000) {
            return Err(ValidationError::PollIntervalTooLong);
        }
        let expiry = chrono::Duration::try_hours(self.outbox_ttl_hours)
            .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl));
        if expiry.is_none() {
            return Err(ValidationError::OutboxTtlTooLong(self.outbox_ttl_hours));
        }
        Ok(())
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_frame_bytes: default_max_frame_bytes(),
            ping_period_secs: default_ping_period(),
            pong_wait_secs: default_pong_wait(),
            write_wait_secs: default_write_wait(),
            outbox_ttl_hours: default_outbox_ttl(),
            poll_interval_ms: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
            default_page_limit: default_page_limit(),
            max_page_limit: default_max_page_limit(),
        }
    }
}

fn default_queue_capacity() -> usize {
    256
}

fn default_max_frame_bytes() -> usize {
    4096
}

fn default_ping_period() -> u64 {
    30
}

fn default_pong_wait() -> u64 {
    70
}

fn default_write_wait() -> u64 {
    10
}

fn default_outbox_ttl() -> i64 {
    24
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_poll_timeout() -> u64 {
    25
}

fn default_page_limit() -> u32 {
    20
}

fn default_max_page_limit() -> u32 {
    100
}
