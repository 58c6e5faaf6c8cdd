//! WebSocket adapters for real-time message delivery.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                       ws_handler (upgrade)                           │
//! │   - Validates the credential before upgrading                        │
//! │   - Splits the socket and runs one session                           │
//! └──────────────────────────────────────────────────────────────────────┘
//!                │ read loop                         ▲ write loop
//!                ▼                                   │
//! ┌──────────────────────────────┐    ┌──────────────────────────────────┐
//! │ FrameDispatcher              │    │ per-session outbound queue       │
//! │   NEW_MESSAGE → submit       │    │   batched writes, PING probes    │
//! │   MESSAGE_ACK → confirm      │    └──────────────────────────────────┘
//! └──────────────────────────────┘                   ▲
//!                │ HubBroadcaster                    │ try_send
//!                ▼                                   │
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                               Hub                                    │
//! │   single task owning connection → queue and user → connections maps  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

pub mod broadcaster;
pub mod dispatcher;
pub mod handler;
pub mod hub;
pub mod messages;
pub mod session;

pub use broadcaster::HubBroadcaster;
pub use dispatcher::{FrameDispatcher, SessionOrigin};
pub use handler::{websocket_router, ws_handler, WebSocketState, WsAuthQuery};
pub use hub::{Hub, HubError, HubSnapshot};
pub use messages::{
    decode_client_frame, ClientFrame, ErrorPayload, FrameError, MessageAckPayload, MessageDto,
    MessageSentAckPayload, NewMessagePayload, ServerFrame,
};
pub use session::{run_session, PumpError, SessionSettings};
