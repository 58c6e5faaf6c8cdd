//! PostgreSQL implementation of RelationshipChecker.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::RelationshipChecker;

/// Reads the `blocked_users` table; a row in either direction blocks the pair.
#[derive(Clone)]
pub struct PostgresRelationshipChecker {
    pool: PgPool,
}

impl PostgresRelationshipChecker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelationshipChecker for PostgresRelationshipChecker {
    async fn is_blocked(&self, a: &UserId, b: &UserId) -> Result<bool, DomainError> {
        let (blocked,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM blocked_users
                WHERE (blocker_id = $1 AND blocked_id = $2)
                   OR (blocker_id = $2 AND blocked_id = $1)
            )
            "#,
        )
        .bind(a.as_uuid())
        .bind(b.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to check block list: {}", e)))?;

        Ok(blocked)
    }
}
