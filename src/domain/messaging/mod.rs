//! Messaging domain module.
//!
//! Chat messages, their addressing and lifecycle, and the keyset cursor used
//! to page through messages still awaiting delivery confirmation.

mod content;
mod cursor;
mod errors;
mod message;
mod status;

pub use content::{MessageContent, MessageTarget};
pub use cursor::{PageCursor, PendingPage};
pub use errors::MessagingError;
pub use message::Message;
pub use status::MessageStatus;
