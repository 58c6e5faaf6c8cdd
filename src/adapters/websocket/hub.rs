//! Connection hub: the single owner of live session state.
//!
//! One tokio task holds the session maps. Everything else talks to it by
//! sending [`HubCommand`]s, so register, unregister and sends for a given
//! session are applied in the order they were issued.
//!
//! # Architecture
//!
//! ```text
//! session read loops ──┐                    ┌──▶ queue(conn-a) ──▶ writer
//! HubBroadcaster ──────┼──▶ control loop ───┼──▶ queue(conn-b) ──▶ writer
//! drop guards ─────────┘   (owns the maps)  └──▶ queue(conn-c) ──▶ writer
//!
//! users: user-1 → {conn-a, conn-b}    user-2 → {conn-c}
//! ```
//!
//! The hub keeps the only strong sender for each session queue. Dropping it
//! on unregister is what tells the writer to close the connection.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::domain::foundation::{ConnectionId, UserId};

/// Hub errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The control loop is no longer running.
    #[error("connection hub has stopped")]
    Stopped,
}

/// Requests processed by the control loop.
#[derive(Debug)]
pub enum HubCommand {
    Register {
        connection_id: ConnectionId,
        user_id: UserId,
        outbound: mpsc::Sender<String>,
    },
    Unregister {
        connection_id: ConnectionId,
    },
    SendToUser {
        user_id: UserId,
        frame: String,
    },
    SendToConnection {
        connection_id: ConnectionId,
        frame: String,
    },
    Snapshot(oneshot::Sender<HubSnapshot>),
}

/// Point-in-time view of hub membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubSnapshot {
    pub connection_count: usize,
    /// Live connection count per user; users with none are absent.
    pub connections_per_user: HashMap<UserId, usize>,
}

impl HubSnapshot {
    pub fn user_count(&self) -> usize {
        self.connections_per_user.len()
    }

    pub fn connections_for(&self, user_id: &UserId) -> usize {
        self.connections_per_user.get(user_id).copied().unwrap_or(0)
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.connections_per_user.contains_key(user_id)
    }
}

/// Cloneable handle to the hub's control loop.
#[derive(Debug, Clone)]
pub struct Hub {
    commands: mpsc::UnboundedSender<HubCommand>,
}

impl Hub {
    /// Starts the control loop.
    ///
    /// The loop ends once every `Hub` clone has been dropped; all remaining
    /// session queues are closed at that point.
    pub fn spawn() -> (Hub, JoinHandle<()>) {
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(control_loop(rx));
        (Hub { commands }, task)
    }

    pub fn register(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        outbound: mpsc::Sender<String>,
    ) -> Result<(), HubError> {
        self.submit(HubCommand::Register {
            connection_id,
            user_id,
            outbound,
        })
    }

    /// Removes a session and closes its queue. Unknown ids are ignored.
    pub fn unregister(&self, connection_id: ConnectionId) -> Result<(), HubError> {
        self.submit(HubCommand::Unregister { connection_id })
    }

    /// Queues `frame` on every live session of `user_id` without blocking.
    pub fn send_to_user(&self, user_id: UserId, frame: String) -> Result<(), HubError> {
        self.submit(HubCommand::SendToUser { user_id, frame })
    }

    /// Queues `frame` on a single session without blocking.
    pub fn send_to_connection(
        &self,
        connection_id: ConnectionId,
        frame: String,
    ) -> Result<(), HubError> {
        self.submit(HubCommand::SendToConnection {
            connection_id,
            frame,
        })
    }

    pub async fn snapshot(&self) -> Result<HubSnapshot, HubError> {
        let (reply, rx) = oneshot::channel();
        self.submit(HubCommand::Snapshot(reply))?;
        rx.await.map_err(|_| HubError::Stopped)
    }

    fn submit(&self, command: HubCommand) -> Result<(), HubError> {
        self.commands.send(command).map_err(|_| HubError::Stopped)
    }
}

struct SessionEntry {
    user_id: UserId,
    outbound: mpsc::Sender<String>,
}

#[derive(Default)]
struct HubState {
    sessions: HashMap<ConnectionId, SessionEntry>,
    users: HashMap<UserId, HashSet<ConnectionId>>,
}

async fn control_loop(mut rx: mpsc::UnboundedReceiver<HubCommand>) {
    let mut state = HubState::default();
    tracing::info!("connection hub started");

    while let Some(command) = rx.recv().await {
        state.apply(command);
    }

    tracing::info!(
        remaining = state.sessions.len(),
        "connection hub stopped"
    );
}

impl HubState {
    fn apply(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register {
                connection_id,
                user_id,
                outbound,
            } => self.register(connection_id, user_id, outbound),
            HubCommand::Unregister { connection_id } => self.unregister(connection_id),
            HubCommand::SendToUser { user_id, frame } => self.send_to_user(&user_id, frame),
            HubCommand::SendToConnection {
                connection_id,
                frame,
            } => {
                if let Some(entry) = self.sessions.get(&connection_id) {
                    enqueue(&connection_id, entry, frame);
                }
            }
            HubCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn register(
        &mut self,
        connection_id: ConnectionId,
        user_id: UserId,
        outbound: mpsc::Sender<String>,
    ) {
        if self.sessions.contains_key(&connection_id) {
            tracing::warn!(
                connection_id = %connection_id,
                user_id = %user_id,
                "duplicate session registration ignored"
            );
            return;
        }

        self.sessions
            .insert(connection_id, SessionEntry { user_id, outbound });
        self.users.entry(user_id).or_default().insert(connection_id);

        tracing::debug!(
            connection_id = %connection_id,
            user_id = %user_id,
            sessions = self.sessions.len(),
            "session registered"
        );
    }

    fn unregister(&mut self, connection_id: ConnectionId) {
        // Dropping the entry drops the queue sender.
        let Some(entry) = self.sessions.remove(&connection_id) else {
            return;
        };

        if let Some(connections) = self.users.get_mut(&entry.user_id) {
            connections.remove(&connection_id);
            if connections.is_empty() {
                self.users.remove(&entry.user_id);
            }
        }

        tracing::debug!(
            connection_id = %connection_id,
            user_id = %entry.user_id,
            sessions = self.sessions.len(),
            "session unregistered"
        );
    }

    fn send_to_user(&self, user_id: &UserId, frame: String) {
        let Some(connections) = self.users.get(user_id) else {
            tracing::trace!(user_id = %user_id, "no live sessions for user");
            return;
        };

        for connection_id in connections {
            if let Some(entry) = self.sessions.get(connection_id) {
                enqueue(connection_id, entry, frame.clone());
            }
        }
    }

    fn snapshot(&self) -> HubSnapshot {
        HubSnapshot {
            connection_count: self.sessions.len(),
            connections_per_user: self
                .users
                .iter()
                .map(|(user_id, connections)| (*user_id, connections.len()))
                .collect(),
        }
    }
}

fn enqueue(connection_id: &ConnectionId, entry: &SessionEntry, frame: String) {
    match entry.outbound.try_send(frame) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::warn!(
                connection_id = %connection_id,
                user_id = %entry.user_id,
                "outbound queue full; frame dropped"
            );
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::debug!(
                connection_id = %connection_id,
                user_id = %entry.user_id,
                "outbound queue closed; frame dropped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(hub: &Hub, user_id: UserId, capacity: usize) -> (ConnectionId, mpsc::Receiver<String>) {
        let connection_id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(capacity);
        hub.register(connection_id, user_id, tx).unwrap();
        (connection_id, rx)
    }

    #[tokio::test]
    async fn register_adds_session_to_user_index() {
        let (hub, _task) = Hub::spawn();
        let user = UserId::new();
        let (_conn, _rx) = session(&hub, user, 8);

        let snapshot = hub.snapshot().await.unwrap();
        assert_eq!(snapshot.connection_count, 1);
        assert_eq!(snapshot.connections_for(&user), 1);
    }

    #[tokio::test]
    async fn send_to_user_reaches_every_session_of_that_user() {
        let (hub, _task) = Hub::spawn();
        let user = UserId::new();
        let (_a, mut rx_a) = session(&hub, user, 8);
        let (_b, mut rx_b) = session(&hub, user, 8);
        let (_other, mut rx_other) = session(&hub, UserId::new(), 8);

        hub.send_to_user(user, "hello".to_string()).unwrap();
        hub.snapshot().await.unwrap();

        assert_eq!(rx_a.try_recv().unwrap(), "hello");
        assert_eq!(rx_b.try_recv().unwrap(), "hello");
        assert!(rx_other.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_connection_targets_one_session() {
        let (hub, _task) = Hub::spawn();
        let user = UserId::new();
        let (a, mut rx_a) = session(&hub, user, 8);
        let (_b, mut rx_b) = session(&hub, user, 8);

        hub.send_to_connection(a, "ack".to_string()).unwrap();
        hub.snapshot().await.unwrap();

        assert_eq!(rx_a.try_recv().unwrap(), "ack");
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_closes_queue_and_keeps_sibling_reachable() {
        let (hub, _task) = Hub::spawn();
        let user = UserId::new();
        let (a, mut rx_a) = session(&hub, user, 8);
        let (_b, mut rx_b) = session(&hub, user, 8);

        hub.unregister(a).unwrap();
        hub.send_to_user(user, "still here".to_string()).unwrap();

        assert_eq!(rx_a.recv().await, None);
        assert_eq!(rx_b.recv().await.as_deref(), Some("still here"));
        assert_eq!(hub.snapshot().await.unwrap().connections_for(&user), 1);
    }

    #[tokio::test]
    async fn unregistering_last_session_removes_user() {
        let (hub, _task) = Hub::spawn();
        let user = UserId::new();
        let (a, _rx_a) = session(&hub, user, 8);
        let (b, _rx_b) = session(&hub, user, 8);

        hub.unregister(a).unwrap();
        hub.unregister(b).unwrap();

        let snapshot = hub.snapshot().await.unwrap();
        assert!(!snapshot.is_online(&user));
        assert_eq!(snapshot.user_count(), 0);
        assert_eq!(snapshot.connection_count, 0);
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let (hub, _task) = Hub::spawn();
        let user = UserId::new();
        let (a, _rx) = session(&hub, user, 8);

        hub.unregister(a).unwrap();
        hub.unregister(a).unwrap();
        hub.unregister(ConnectionId::new()).unwrap();

        assert_eq!(hub.snapshot().await.unwrap(), HubSnapshot::default());
    }

    #[tokio::test]
    async fn duplicate_register_does_not_corrupt_state() {
        let (hub, _task) = Hub::spawn();
        let user = UserId::new();
        let connection_id = ConnectionId::new();
        let (tx, mut rx) = mpsc::channel(8);

        hub.register(connection_id, user, tx.clone()).unwrap();
        hub.register(connection_id, user, tx).unwrap();
        hub.send_to_user(user, "once".to_string()).unwrap();

        let snapshot = hub.snapshot().await.unwrap();
        assert_eq!(snapshot.connection_count, 1);
        assert_eq!(snapshot.connections_for(&user), 1);
        assert_eq!(rx.try_recv().unwrap(), "once");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_queue_drops_frame_without_stalling_others() {
        let (hub, _task) = Hub::spawn();
        let user = UserId::new();
        let (_slow, mut rx_slow) = session(&hub, user, 1);
        let (_fast, mut rx_fast) = session(&hub, user, 8);

        hub.send_to_user(user, "first".to_string()).unwrap();
        hub.send_to_user(user, "second".to_string()).unwrap();
        hub.snapshot().await.unwrap();

        assert_eq!(rx_slow.try_recv().unwrap(), "first");
        assert!(rx_slow.try_recv().is_err());
        assert_eq!(rx_fast.try_recv().unwrap(), "first");
        assert_eq!(rx_fast.try_recv().unwrap(), "second");
    }

    #[tokio::test]
    async fn send_to_offline_user_is_noop() {
        let (hub, _task) = Hub::spawn();
        hub.send_to_user(UserId::new(), "nobody".to_string()).unwrap();
        assert_eq!(hub.snapshot().await.unwrap().connection_count, 0);
    }

    #[tokio::test]
    async fn hub_stops_when_all_handles_drop() {
        let (hub, task) = Hub::spawn();
        let (_conn, mut rx) = session(&hub, UserId::new(), 8);

        drop(hub);
        task.await.unwrap();

        assert_eq!(rx.recv().await, None);
    }
}
