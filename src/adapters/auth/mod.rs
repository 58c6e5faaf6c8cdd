//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 access tokens signed with the shared secret
//! - `mock` - Test implementation that doesn't require real tokens

mod jwt;
mod mock;

pub use jwt::{AccessClaims, JwtSessionValidator};
pub use mock::MockSessionValidator;
