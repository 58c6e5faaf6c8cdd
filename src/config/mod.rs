//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `CHATTERBOX` prefix and
//! nested values are separated by a double underscore.
//!
//! # Example
//!
//! ```no_run
//! use chatterbox::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod delivery;
mod error;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use delivery::DeliveryConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL storage; when absent the in-memory adapters are used
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Token verification
    pub auth: AuthConfig,

    /// Session pump, outbox and retrieval tuning
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `CHATTERBOX` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// - `CHATTERBOX__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CHATTERBOX__AUTH__JWT_SECRET=...` -> `auth.jwt_secret = ...`
    /// - `CHATTERBOX__DELIVERY__PING_PERIOD_SECS=20` -> `delivery.ping_period_secs = 20`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CHATTERBOX")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.auth.validate(&self.server.environment)?;
        self.delivery.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
