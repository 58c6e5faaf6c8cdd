//! Per-connection read and write loops.
//!
//! Each connection runs a read loop (inline) and a write loop (spawned).
//! The loops are generic over any `Stream`/`Sink` of websocket messages so
//! they can be driven without a socket in tests.
//!
//! Shutdown converges on one path: the read loop owns an
//! [`UnregisterGuard`]; when it ends for any reason the hub drops the
//! session queue, and the write loop sees the closed queue, sends a close
//! frame and exits.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{timeout, Instant};

use super::dispatcher::{FrameDispatcher, SessionOrigin};
use super::hub::Hub;
use super::messages::{decode_client_frame, ClientFrame, ServerFrame};
use crate::domain::foundation::{ConnectionId, UserId};

/// Timing and sizing for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Capacity of the outbound frame queue.
    pub queue_capacity: usize,
    /// Largest accepted inbound frame, in bytes.
    pub max_frame_bytes: usize,
    /// How often the writer sends a liveness probe.
    pub ping_period: Duration,
    /// Longest silence tolerated from the peer before disconnecting.
    pub pong_wait: Duration,
    /// Deadline for any single write batch.
    pub write_wait: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            max_frame_bytes: 4096,
            ping_period: Duration::from_secs(30),
            pong_wait: Duration::from_secs(70),
            write_wait: Duration::from_secs(10),
        }
    }
}

/// Why a write loop stopped early.
#[derive(Debug, Error)]
pub enum PumpError {
    #[error("write timed out")]
    WriteTimeout,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Sends `Unregister` for its connection when dropped.
///
/// Owned by the read loop so that every exit path, including cancellation
/// of the future, unregisters exactly once.
pub struct UnregisterGuard {
    hub: Hub,
    connection_id: ConnectionId,
}

impl UnregisterGuard {
    pub fn new(hub: Hub, connection_id: ConnectionId) -> Self {
        Self { hub, connection_id }
    }
}

impl Drop for UnregisterGuard {
    fn drop(&mut self) {
        if self.hub.unregister(self.connection_id).is_err() {
            tracing::debug!(
                connection_id = %self.connection_id,
                "hub already stopped during unregister"
            );
        }
    }
}

/// Runs one connection until either side goes away.
pub async fn run_session<R, W, E>(
    reader: R,
    writer: W,
    user_id: UserId,
    hub: Hub,
    dispatcher: Arc<FrameDispatcher>,
    settings: SessionSettings,
) where
    R: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: Display + Send,
    W: Sink<Message> + Unpin + Send + 'static,
    W::Error: Display + Send,
{
    let origin = SessionOrigin {
        user_id,
        connection_id: ConnectionId::new(),
    };
    let (outbound, queue) = mpsc::channel(settings.queue_capacity);
    let pong = outbound.downgrade();

    if hub.register(origin.connection_id, user_id, outbound).is_err() {
        tracing::warn!(user_id = %user_id, "hub stopped; rejecting session");
        return;
    }
    let guard = UnregisterGuard::new(hub, origin.connection_id);

    tracing::info!(
        user_id = %user_id,
        connection_id = %origin.connection_id,
        "session opened"
    );

    let mut writer_task = tokio::spawn(write_loop(writer, queue, settings, origin.connection_id));
    let read = read_loop(reader, guard, origin, pong, dispatcher, settings);
    tokio::pin!(read);

    tokio::select! {
        _ = &mut read => {
            if timeout(settings.write_wait, &mut writer_task).await.is_err() {
                writer_task.abort();
            }
        }
        result = &mut writer_task => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::debug!(
                    connection_id = %origin.connection_id,
                    error = %err,
                    "write loop failed"
                ),
                Err(err) => tracing::error!(
                    connection_id = %origin.connection_id,
                    error = %err,
                    "write loop panicked"
                ),
            }
        }
    }

    tracing::info!(
        user_id = %user_id,
        connection_id = %origin.connection_id,
        "session closed"
    );
}

/// Reads frames until the peer closes, errors, goes silent, or oversteps the size limit.
pub async fn read_loop<R, E>(
    mut reader: R,
    _guard: UnregisterGuard,
    origin: SessionOrigin,
    pong: mpsc::WeakSender<String>,
    dispatcher: Arc<FrameDispatcher>,
    settings: SessionSettings,
) where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        // A fresh deadline per read: any frame, including a pong, resets it.
        let message = match timeout(settings.pong_wait, reader.next()).await {
            Err(_) => {
                tracing::debug!(connection_id = %origin.connection_id, "read deadline passed");
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(err))) => {
                tracing::debug!(
                    connection_id = %origin.connection_id,
                    error = %err,
                    "read error"
                );
                break;
            }
            Ok(Some(Ok(message))) => message,
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Binary(data) => {
                if data.len() > settings.max_frame_bytes {
                    tracing::warn!(
                        connection_id = %origin.connection_id,
                        size = data.len(),
                        "inbound frame too large"
                    );
                    break;
                }
                tracing::warn!(
                    connection_id = %origin.connection_id,
                    "binary frames are not supported"
                );
                continue;
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => {
                tracing::debug!(connection_id = %origin.connection_id, "peer sent close");
                break;
            }
        };

        if text.len() > settings.max_frame_bytes {
            tracing::warn!(
                connection_id = %origin.connection_id,
                size = text.len(),
                "inbound frame too large"
            );
            break;
        }

        match decode_client_frame(&text) {
            Ok(Some(ClientFrame::Ping)) => reply_pong(&pong, &origin),
            Ok(Some(frame)) => dispatcher.dispatch(&origin, frame).await,
            Ok(None) => {
                tracing::debug!(connection_id = %origin.connection_id, "ignoring unknown frame kind");
            }
            Err(err) => {
                tracing::warn!(
                    connection_id = %origin.connection_id,
                    error = %err,
                    "undecodable frame"
                );
            }
        }
    }
}

fn reply_pong(pong: &mpsc::WeakSender<String>, origin: &SessionOrigin) {
    let Some(outbound) = pong.upgrade() else {
        return;
    };
    match ServerFrame::Pong.encode() {
        Ok(frame) => {
            if outbound.try_send(frame).is_err() {
                tracing::debug!(connection_id = %origin.connection_id, "pong dropped");
            }
        }
        Err(err) => tracing::error!(error = %err, "failed to encode pong"),
    }
}

/// Drains the session queue to the transport and sends liveness probes.
///
/// Exits cleanly when the queue closes; exits with an error when a write
/// fails or misses its deadline.
pub async fn write_loop<W>(
    mut writer: W,
    mut queue: mpsc::Receiver<String>,
    settings: SessionSettings,
    connection_id: ConnectionId,
) -> Result<(), PumpError>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let mut probe = tokio::time::interval_at(
        Instant::now() + settings.ping_period,
        settings.ping_period,
    );

    loop {
        tokio::select! {
            frame = queue.recv() => match frame {
                Some(first) => {
                    let written = write_batch(&mut writer, first, &mut queue, &settings).await?;
                    tracing::trace!(connection_id = %connection_id, frames = written, "batch written");
                }
                None => {
                    let _ = timeout(settings.write_wait, writer.send(Message::Close(None))).await;
                    tracing::debug!(connection_id = %connection_id, "queue closed; write loop done");
                    return Ok(());
                }
            },
            _ = probe.tick() => {
                timeout(settings.write_wait, writer.send(Message::Ping(Vec::new())))
                    .await
                    .map_err(|_| PumpError::WriteTimeout)?
                    .map_err(|e| PumpError::Transport(e.to_string()))?;
            }
        }
    }
}

/// Writes `first` plus whatever is already queued, then flushes once.
async fn write_batch<W>(
    writer: &mut W,
    first: String,
    queue: &mut mpsc::Receiver<String>,
    settings: &SessionSettings,
) -> Result<usize, PumpError>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let batch = async {
        writer.feed(Message::Text(first)).await?;
        let mut written = 1;
        while written < settings.queue_capacity {
            match queue.try_recv() {
                Ok(next) => {
                    writer.feed(Message::Text(next)).await?;
                    written += 1;
                }
                Err(_) => break,
            }
        }
        writer.flush().await?;
        Ok::<usize, W::Error>(written)
    };

    timeout(settings.write_wait, batch)
        .await
        .map_err(|_| PumpError::WriteTimeout)?
        .map_err(|e| PumpError::Transport(e.to_string()))
}
