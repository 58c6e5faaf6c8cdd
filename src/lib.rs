//! Chatterbox - real-time chat message delivery.
//!
//! Routes messages between authenticated WebSocket sessions, persists each
//! message to a durable outbox until the recipient acknowledges it, and
//! offers paginated fetch and long-poll retrieval for clients that were
//! offline when a message arrived.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
