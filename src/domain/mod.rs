//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, auth)
//! - `messaging` - Messages, delivery status, and pending-page cursors

pub mod foundation;
pub mod messaging;
