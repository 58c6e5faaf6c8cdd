//! PostgreSQL implementation of MessageOutbox.
//!
//! Pending messages live in `unsent_messages` until the recipient
//! acknowledges delivery or `expires_at` passes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, GroupId, MessageId, Timestamp, UserId,
};
use crate::domain::messaging::{Message, MessageContent, MessageStatus, MessageTarget, PageCursor};
use crate::ports::{MessageOutbox, OutboxPage};

/// Postgres error code for a foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL implementation of the MessageOutbox port.
#[derive(Clone)]
pub struct PostgresMessageOutbox {
    pool: PgPool,
}

impl PostgresMessageOutbox {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageOutbox for PostgresMessageOutbox {
    async fn persist(&self, message: &Message, ttl: chrono::Duration) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO unsent_messages (
                id, sender_id, recipient_id, group_id, content, status, created_at, expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(message.id().as_uuid())
        .bind(message.sender_id().as_uuid())
        .bind(message.recipient_id().map(|id| *id.as_uuid()))
        .bind(message.group_id().map(|id| *id.as_uuid()))
        .bind(message.content().as_str())
        .bind(message.status().as_str())
        .bind(message.created_at().as_datetime())
        .bind(message.expires_at(ttl).as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
                DomainError::new(
                    ErrorCode::RecipientNotFound,
                    "Recipient or group does not exist",
                )
            }
            _ => DomainError::database(format!("Failed to persist message: {}", e)),
        })?;

        Ok(())
    }

    async fn retire(&self, message_id: &MessageId) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM unsent_messages WHERE id = $1")
            .bind(message_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to retire message: {}", e)))?;

        Ok(())
    }

    async fn list_pending(
        &self,
        user_id: &UserId,
        cursor: &PageCursor,
        limit: u32,
    ) -> Result<OutboxPage, DomainError> {
        let after: Option<DateTime<Utc>> = cursor.after().map(|t| *t.as_datetime());

        let rows = sqlx::query(
            r#"
            SELECT m.id, m.sender_id, m.recipient_id, m.group_id, m.content, m.status, m.created_at
            FROM unsent_messages m
            WHERE m.expires_at > NOW()
              AND m.sender_id <> $1
              AND ($2::timestamptz IS NULL OR m.created_at > $2)
              AND (
                    m.recipient_id = $1
                 OR EXISTS (
                        SELECT 1 FROM group_members gm
                        WHERE gm.group_id = m.group_id AND gm.user_id = $1
                    )
              )
              AND NOT EXISTS (
                    SELECT 1 FROM blocked_users b
                    WHERE (b.blocker_id = $1 AND b.blocked_id = m.sender_id)
                       OR (b.blocker_id = m.sender_id AND b.blocked_id = $1)
              )
            ORDER BY m.created_at ASC
            LIMIT $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(after)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list pending messages: {}", e)))?;

        let items = rows
            .into_iter()
            .map(row_to_message)
            .collect::<Result<Vec<_>, _>>()?;
        let has_more = limit > 0 && items.len() == limit as usize;

        Ok(OutboxPage { items, has_more })
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::database(format!("Failed to get {}: {}", name, e)))
}

fn row_to_message(row: PgRow) -> Result<Message, DomainError> {
    let id: Uuid = column(&row, "id")?;
    let sender_id: Uuid = column(&row, "sender_id")?;
    let recipient_id: Option<Uuid> = column(&row, "recipient_id")?;
    let group_id: Option<Uuid> = column(&row, "group_id")?;
    let content: String = column(&row, "content")?;
    let status: String = column(&row, "status")?;
    let created_at: DateTime<Utc> = column(&row, "created_at")?;

    let target = MessageTarget::from_parts(
        recipient_id.map(UserId::from_uuid),
        group_id.map(GroupId::from_uuid),
    )
    .map_err(|e| DomainError::database(format!("Stored message has bad target: {}", e)))?;
    let content = MessageContent::new(content)
        .map_err(|e| DomainError::database(format!("Stored message has bad content: {}", e)))?;

    Ok(Message::reconstitute(
        MessageId::from_uuid(id),
        UserId::from_uuid(sender_id),
        target,
        content,
        parse_status(&status)?,
        Timestamp::from_datetime(created_at),
    ))
}

fn parse_status(s: &str) -> Result<MessageStatus, DomainError> {
    s.parse().map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )
    })
}
