//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `MessageOutbox` - Durable store of messages pending delivery
//! - `RelationshipChecker` - Block relationships between users
//! - `SessionValidator` - Bearer credential validation
//! - `MessageBroadcaster` - Best-effort push to live connections

mod message_broadcaster;
mod message_outbox;
mod relationship_checker;
mod session_validator;

pub use message_broadcaster::{MessageBroadcaster, SentAcknowledgement, SubmissionRejection};
pub use message_outbox::{MessageOutbox, OutboxPage};
pub use relationship_checker::RelationshipChecker;
pub use session_validator::SessionValidator;
