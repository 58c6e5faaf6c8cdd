//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - JWT session validation (and a mock for tests)
//! - `http` - REST endpoints, auth middleware, application router
//! - `memory` - In-memory outbox and relationship store
//! - `postgres` - PostgreSQL outbox and relationship checker
//! - `websocket` - Connection hub, session pumps, frame routing

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod websocket;
