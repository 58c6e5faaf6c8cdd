//! Messaging command and query handlers.

mod confirm_delivery;
mod fetch_pending;
mod poll_pending;
mod submit_message;

pub use confirm_delivery::{AckOutcome, ConfirmDeliveryCommand, ConfirmDeliveryHandler};
pub use fetch_pending::{FetchPendingHandler, FetchPendingQuery, PageLimits};
pub use poll_pending::{PollOutcome, PollPendingHandler, PollPendingQuery, PollSettings};
pub use submit_message::{
    LiveDelivery, SubmitMessageCommand, SubmitMessageHandler, SubmitMessageResult,
};
