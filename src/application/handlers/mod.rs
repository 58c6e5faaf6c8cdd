//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod messaging;

pub use messaging::{
    AckOutcome, ConfirmDeliveryCommand, ConfirmDeliveryHandler, FetchPendingHandler,
    FetchPendingQuery, LiveDelivery, PageLimits, PollOutcome, PollPendingHandler,
    PollPendingQuery, PollSettings, SubmitMessageCommand, SubmitMessageHandler,
    SubmitMessageResult,
};
