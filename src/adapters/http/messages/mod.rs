//! HTTP adapter for offline message retrieval.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ErrorResponse, PendingPageResponse, PendingQueryParams};
pub use handlers::MessageHandlers;
pub use routes::message_routes;
