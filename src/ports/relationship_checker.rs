//! RelationshipChecker port - Block relationships between users.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

/// Answers whether two users have blocked each other.
///
/// The relation is symmetric: `is_blocked(a, b) == is_blocked(b, a)`, and it
/// holds when either user blocked the other.
#[async_trait]
pub trait RelationshipChecker: Send + Sync {
    async fn is_blocked(&self, a: &UserId, b: &UserId) -> Result<bool, DomainError>;
}
