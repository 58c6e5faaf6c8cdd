//! Authentication configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Shortest HS256 secret accepted in production.
const MIN_PRODUCTION_SECRET_BYTES: usize = 32;

/// HS256 JWT verification settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared signing secret
    pub jwt_secret: Secret<String>,

    /// Clock skew tolerated on `exp`, in seconds
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

impl AuthConfig {
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if *environment == Environment::Production && secret.len() < MIN_PRODUCTION_SECRET_BYTES {
            return Err(ValidationError::WeakJwtSecret);
        }
        Ok(())
    }
}

fn default_leeway() -> u64 {
    30
}
