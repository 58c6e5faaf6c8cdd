//! In-memory adapters for the storage ports.

mod message_outbox;
mod relationship_store;

pub use message_outbox::InMemoryMessageOutbox;
pub use relationship_store::InMemoryRelationshipStore;
