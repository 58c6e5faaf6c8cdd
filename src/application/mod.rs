//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers (submit, confirm) write; query handlers (fetch, poll) read.

pub mod handlers;

pub use handlers::{
    // Command handlers
    AckOutcome, ConfirmDeliveryCommand, ConfirmDeliveryHandler,
    LiveDelivery, SubmitMessageCommand, SubmitMessageHandler, SubmitMessageResult,
    // Query handlers
    FetchPendingHandler, FetchPendingQuery, PageLimits,
    PollOutcome, PollPendingHandler, PollPendingQuery, PollSettings,
};
