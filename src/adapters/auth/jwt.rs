//! HS256 JWT adapter for access token validation.
//!
//! Access tokens are minted by the account service with a shared secret and
//! carry the user's UUID in a `user_id` claim. This adapter checks the
//! signature and expiry and maps the claim to an `AuthenticatedUser`.
//!
//! # Example
//!
//! ```ignore
//! use chatterbox::adapters::auth::JwtSessionValidator;
//!
//! let validator = JwtSessionValidator::new(&config.auth);
//! let user = validator.validate("eyJ...").await?;
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// The authenticated user's id.
    pub user_id: Uuid,

    /// Expiry timestamp (Unix epoch seconds)
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Validates HS256-signed access tokens.
pub struct JwtSessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.expose_secret().as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("Token expired");
                        AuthError::TokenExpired
                    }
                    _ => {
                        tracing::debug!("Token validation failed: {}", e);
                        AuthError::InvalidToken
                    }
                }
            },
        )?;

        Ok(AuthenticatedUser::new(UserId::from_uuid(data.claims.user_id)))
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}
