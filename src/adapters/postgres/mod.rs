//! PostgreSQL adapters - Database implementations for the storage ports.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE unsent_messages (
//!     id           UUID PRIMARY KEY,
//!     sender_id    UUID NOT NULL REFERENCES users(id),
//!     recipient_id UUID REFERENCES users(id),
//!     group_id     UUID REFERENCES groups(id),
//!     content      TEXT NOT NULL,
//!     status       TEXT NOT NULL,
//!     created_at   TIMESTAMPTZ NOT NULL,
//!     expires_at   TIMESTAMPTZ NOT NULL,
//!     CHECK ((recipient_id IS NULL) <> (group_id IS NULL))
//! );
//! CREATE INDEX unsent_messages_recipient_created ON unsent_messages (recipient_id, created_at);
//! CREATE INDEX unsent_messages_group_created ON unsent_messages (group_id, created_at);
//!
//! CREATE TABLE blocked_users (
//!     blocker_id UUID NOT NULL,
//!     blocked_id UUID NOT NULL,
//!     PRIMARY KEY (blocker_id, blocked_id)
//! );
//!
//! CREATE TABLE group_members (
//!     group_id UUID NOT NULL,
//!     user_id  UUID NOT NULL,
//!     PRIMARY KEY (group_id, user_id)
//! );
//! ```

mod message_outbox;
mod relationship_checker;

pub use message_outbox::PostgresMessageOutbox;
pub use relationship_checker::PostgresRelationshipChecker;
