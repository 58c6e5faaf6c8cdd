//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Host and port do not form a valid socket address")]
    InvalidBindAddress,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("JWT secret must be at least 32 bytes in production")]
    WeakJwtSecret,

    #[error("Delivery setting {field} must be greater than zero")]
    ZeroDeliverySetting { field: &'static str },

    #[error("pong_wait_secs ({pong_wait}) must exceed twice ping_period_secs ({ping_period})")]
    LivenessRatio { ping_period: u64, pong_wait: u64 },

    #[error("default_page_limit ({default}) exceeds max_page_limit ({max})")]
    PageLimitOrder { default: u32, max: u32 },

    #[error("poll_interval_ms must be shorter than poll_timeout_secs")]
    PollIntervalTooLong,

    #[error("outbox_ttl_hours ({0}) is too large to compute an expiry")]
    OutboxTtlTooLong(i64),
}
