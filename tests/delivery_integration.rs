//! Integration tests for end-to-end message delivery.
//!
//! Drives real session loops over in-process streams against a live hub,
//! with the in-memory outbox and relationship store behind the handlers:
//! 1. Submit over a session → ack to sender, push to every recipient session
//! 2. Offline recipient → message retrievable through fetch/poll
//! 3. MESSAGE_ACK{delivered} → message retired from the outbox
//! 4. Blocked pairs, group targets, pagination and slow consumers

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message as WsMessage;
use futures::channel::mpsc as fmpsc;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use chatterbox::adapters::memory::{InMemoryMessageOutbox, InMemoryRelationshipStore};
use chatterbox::adapters::websocket::{
    run_session, FrameDispatcher, Hub, HubBroadcaster, SessionSettings,
};
use chatterbox::application::handlers::messaging::{
    ConfirmDeliveryHandler, FetchPendingHandler, FetchPendingQuery, PageLimits, PollOutcome,
    PollPendingHandler, PollPendingQuery, PollSettings, SubmitMessageHandler,
};
use chatterbox::domain::foundation::{ConnectionId, GroupId, UserId};
use chatterbox::domain::messaging::PendingPage;
use chatterbox::ports::MessageBroadcaster;

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    hub: Hub,
    dispatcher: Arc<FrameDispatcher>,
    relationships: Arc<InMemoryRelationshipStore>,
    outbox: Arc<InMemoryMessageOutbox>,
    fetch: Arc<FetchPendingHandler>,
    _hub_task: JoinHandle<()>,
}

impl Harness {
    fn new() -> Self {
        let (hub, hub_task) = Hub::spawn();
        let relationships = Arc::new(InMemoryRelationshipStore::new());
        let outbox = Arc::new(InMemoryMessageOutbox::new(relationships.clone()));
        let broadcaster: Arc<dyn MessageBroadcaster> = Arc::new(HubBroadcaster::new(hub.clone()));
        let dispatcher = Arc::new(FrameDispatcher::new(
            SubmitMessageHandler::new(
                outbox.clone(),
                relationships.clone(),
                broadcaster.clone(),
                chrono::Duration::hours(24),
            ),
            ConfirmDeliveryHandler::new(outbox.clone()),
            broadcaster,
        ));
        let fetch = Arc::new(FetchPendingHandler::new(outbox.clone(), PageLimits::default()));

        Self {
            hub,
            dispatcher,
            relationships,
            outbox,
            fetch,
            _hub_task: hub_task,
        }
    }

    /// Opens a session for `user` and waits until the hub has registered it.
    async fn connect(&self, user: UserId) -> Client {
        let before = self.connections_for(user).await;
        let (inbound, inbound_rx) = fmpsc::unbounded::<Result<WsMessage, String>>();
        let (outbound_tx, outbound) = fmpsc::unbounded::<WsMessage>();
        let task = tokio::spawn(run_session(
            inbound_rx,
            outbound_tx,
            user,
            self.hub.clone(),
            self.dispatcher.clone(),
            SessionSettings::default(),
        ));
        self.wait_for_connections(user, before + 1).await;
        Client {
            inbound,
            outbound,
            task,
        }
    }

    async fn connections_for(&self, user: UserId) -> usize {
        self.hub.snapshot().await.unwrap().connections_for(&user)
    }

    async fn wait_for_connections(&self, user: UserId, expected: usize) {
        for _ in 0..200 {
            if self.connections_for(user).await == expected {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("user never reached {} connections", expected);
    }

    async fn pending(&self, user: UserId, cursor: &str, limit: i64) -> PendingPage {
        self.fetch
            .handle(FetchPendingQuery {
                user_id: user,
                cursor: cursor.to_string(),
                limit: Some(limit),
            })
            .await
            .unwrap()
    }
}

struct Client {
    inbound: fmpsc::UnboundedSender<Result<WsMessage, String>>,
    outbound: fmpsc::UnboundedReceiver<WsMessage>,
    task: JoinHandle<()>,
}

impl Client {
    fn send(&self, frame: Value) {
        self.inbound
            .unbounded_send(Ok(WsMessage::Text(frame.to_string())))
            .unwrap();
    }

    fn send_direct(&self, temp_id: &str, recipient: UserId, content: &str) {
        self.send(json!({
            "type": "NEW_MESSAGE",
            "payload": {
                "tempId": temp_id,
                "recipientId": recipient.to_string(),
                "content": content,
            }
        }));
    }

    fn ack(&self, message_id: &str, status: &str) {
        self.send(json!({
            "type": "MESSAGE_ACK",
            "payload": { "messageId": message_id, "status": status }
        }));
    }

    /// Next application frame, skipping liveness probes.
    async fn next_frame(&mut self) -> Value {
        let next = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match self.outbound.next().await {
                    Some(WsMessage::Text(text)) => return serde_json::from_str::<Value>(&text).unwrap(),
                    Some(WsMessage::Ping(_)) => continue,
                    other => panic!("expected text frame, got {:?}", other),
                }
            }
        })
        .await;
        next.expect("no frame arrived")
    }

    /// Round-trips a PING so every earlier frame from this client has been handled.
    async fn sync(&mut self) {
        self.send(json!({ "type": "PING" }));
        loop {
            if self.next_frame().await["type"] == "PONG" {
                return;
            }
        }
    }

    fn assert_no_frame(&mut self) {
        if let Ok(Some(WsMessage::Text(text))) = self.outbound.try_next() {
            panic!("unexpected frame: {}", text);
        }
    }

    async fn close(self) {
        self.inbound
            .unbounded_send(Ok(WsMessage::Close(None)))
            .unwrap();
        self.task.await.unwrap();
    }
}

// =============================================================================
// Live delivery
// =============================================================================

#[tokio::test]
async fn message_is_acked_to_sender_and_pushed_to_every_recipient_session() {
    let harness = Harness::new();
    let (alice, bob) = (UserId::new(), UserId::new());
    let mut sender = harness.connect(alice).await;
    let mut phone = harness.connect(bob).await;
    let mut laptop = harness.connect(bob).await;

    sender.send_direct("tmp-1", bob, "hello bob");

    let ack = sender.next_frame().await;
    assert_eq!(ack["type"], "MESSAGE_SENT_ACK");
    assert_eq!(ack["payload"]["tempId"], "tmp-1");
    let message_id = ack["payload"]["messageId"].clone();

    for session in [&mut phone, &mut laptop] {
        let push = session.next_frame().await;
        assert_eq!(push["type"], "NEW_MESSAGE");
        assert_eq!(push["payload"]["id"], message_id);
        assert_eq!(push["payload"]["senderId"], alice.to_string());
        assert_eq!(push["payload"]["content"], "hello bob");
        assert_eq!(push["payload"]["status"], "sent");
    }
}

#[tokio::test]
async fn ack_goes_only_to_the_submitting_connection() {
    let harness = Harness::new();
    let alice = UserId::new();
    let mut first = harness.connect(alice).await;
    let mut second = harness.connect(alice).await;

    first.send_direct("tmp-7", UserId::new(), "hi");

    assert_eq!(first.next_frame().await["type"], "MESSAGE_SENT_ACK");
    second.sync().await;
    second.assert_no_frame();
}

#[tokio::test]
async fn invalid_submission_returns_error_and_stores_nothing() {
    let harness = Harness::new();
    let mut sender = harness.connect(UserId::new()).await;
    let recipient = UserId::new();

    sender.send_direct("tmp-empty", recipient, "");

    let error = sender.next_frame().await;
    assert_eq!(error["type"], "ERROR");
    assert_eq!(error["payload"]["tempId"], "tmp-empty");
    assert!(harness.outbox.is_empty().await);
}

#[tokio::test]
async fn blocked_pair_gets_no_push_and_no_pending_entry() {
    let harness = Harness::new();
    let (alice, bob) = (UserId::new(), UserId::new());
    harness.relationships.block(bob, alice).await;
    let mut sender = harness.connect(alice).await;
    let mut recipient = harness.connect(bob).await;

    sender.send_direct("tmp-b", bob, "are you there?");

    // Sender is still acknowledged; the message is stored.
    assert_eq!(sender.next_frame().await["type"], "MESSAGE_SENT_ACK");
    assert_eq!(harness.outbox.len().await, 1);

    recipient.sync().await;
    recipient.assert_no_frame();
    assert!(harness.pending(bob, "", 20).await.is_empty());
}

#[tokio::test]
async fn group_message_is_stored_for_members_without_live_push() {
    let harness = Harness::new();
    let group = GroupId::new();
    let (alice, bob) = (UserId::new(), UserId::new());
    harness.relationships.add_group_member(group, alice).await;
    harness.relationships.add_group_member(group, bob).await;
    let mut sender = harness.connect(alice).await;
    let mut member = harness.connect(bob).await;

    sender.send(json!({
        "type": "NEW_MESSAGE",
        "payload": { "tempId": "g1", "groupId": group.to_string(), "content": "team update" }
    }));
    assert_eq!(sender.next_frame().await["type"], "MESSAGE_SENT_ACK");

    member.sync().await;
    member.assert_no_frame();

    let page = harness.pending(bob, "", 20).await;
    assert_eq!(page.messages.len(), 1);
    assert_eq!(page.messages[0].group_id(), Some(group));
    assert!(harness.pending(alice, "", 20).await.is_empty());
}

// =============================================================================
// Offline retrieval and acknowledgement
// =============================================================================

#[tokio::test]
async fn offline_recipient_fetches_then_acknowledges_delivery() {
    let harness = Harness::new();
    let (alice, bob) = (UserId::new(), UserId::new());
    let mut sender = harness.connect(bob).await;

    sender.send_direct("tmp-off", alice, "see you tomorrow");
    assert_eq!(sender.next_frame().await["type"], "MESSAGE_SENT_ACK");

    let page = harness.pending(alice, "", 20).await;
    assert_eq!(page.messages.len(), 1);
    assert_eq!(page.messages[0].status().as_str(), "sent");
    assert!(page.next_cursor.is_none());
    let message_id = page.messages[0].id().to_string();

    let mut recipient = harness.connect(alice).await;
    recipient.ack(&message_id, "delivered");
    recipient.sync().await;

    assert!(harness.pending(alice, "", 20).await.is_empty());
}

#[tokio::test]
async fn seen_and_sent_acks_do_not_retire() {
    let harness = Harness::new();
    let (alice, bob) = (UserId::new(), UserId::new());
    let mut sender = harness.connect(bob).await;
    sender.send_direct("tmp-s", alice, "read me");
    sender.next_frame().await;
    let message_id = harness.pending(alice, "", 20).await.messages[0]
        .id()
        .to_string();

    let mut recipient = harness.connect(alice).await;
    recipient.ack(&message_id, "seen");
    recipient.ack(&message_id, "sent");
    recipient.sync().await;

    assert_eq!(harness.pending(alice, "", 20).await.messages.len(), 1);
}

#[tokio::test]
async fn pagination_walks_every_message_exactly_once() {
    let harness = Harness::new();
    let (alice, bob) = (UserId::new(), UserId::new());
    let mut sender = harness.connect(bob).await;
    for i in 0..7 {
        sender.send_direct(&format!("tmp-{}", i), alice, &format!("message {}", i));
        sender.next_frame().await;
    }

    let mut seen = Vec::new();
    let mut cursor = String::new();
    loop {
        let page = harness.pending(alice, &cursor, 3).await;
        assert!(page.messages.len() <= 3);
        seen.extend(page.messages.iter().map(|m| m.content().as_str().to_string()));
        match page.next_cursor {
            Some(next) => cursor = next.encode(),
            None => break,
        }
    }

    let expected: Vec<String> = (0..7).map(|i| format!("message {}", i)).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn long_poll_returns_once_a_message_arrives() {
    let harness = Harness::new();
    let (alice, bob) = (UserId::new(), UserId::new());
    let poll = PollPendingHandler::new(
        harness.fetch.clone(),
        PollSettings {
            interval: Duration::from_millis(20),
            timeout: Duration::from_secs(5),
        },
    );
    let mut sender = harness.connect(bob).await;

    let waiting = tokio::spawn(async move { poll.handle(PollPendingQuery { user_id: alice }).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    sender.send_direct("tmp-p", alice, "wake up");

    match waiting.await.unwrap().unwrap() {
        PollOutcome::Messages(page) => assert_eq!(page.messages.len(), 1),
        PollOutcome::NoContent => panic!("poll missed the message"),
    }
}

#[tokio::test]
async fn long_poll_reports_no_content_after_its_bound() {
    let harness = Harness::new();
    let poll = PollPendingHandler::new(
        harness.fetch.clone(),
        PollSettings {
            interval: Duration::from_millis(10),
            timeout: Duration::from_millis(60),
        },
    );

    let outcome = poll
        .handle(PollPendingQuery {
            user_id: UserId::new(),
        })
        .await
        .unwrap();

    assert!(matches!(outcome, PollOutcome::NoContent));
}

// =============================================================================
// Registry behavior
// =============================================================================

#[tokio::test]
async fn slow_session_does_not_stall_delivery_to_healthy_one() {
    let harness = Harness::new();
    let (alice, bob) = (UserId::new(), UserId::new());

    // A registered queue that is never drained.
    let (stuck_tx, _stuck_rx) = mpsc::channel::<String>(1);
    harness
        .hub
        .register(ConnectionId::new(), bob, stuck_tx)
        .unwrap();
    let mut healthy = harness.connect(bob).await;
    let mut sender = harness.connect(alice).await;

    for i in 0..5 {
        sender.send_direct(&format!("tmp-{}", i), bob, &format!("burst {}", i));
        sender.next_frame().await;
    }

    for i in 0..5 {
        let push = healthy.next_frame().await;
        assert_eq!(push["payload"]["content"], format!("burst {}", i));
    }
}

#[tokio::test]
async fn closing_a_session_unregisters_it() {
    let harness = Harness::new();
    let alice = UserId::new();
    let first = harness.connect(alice).await;
    let _second = harness.connect(alice).await;

    first.close().await;

    harness.wait_for_connections(alice, 1).await;
    let snapshot = harness.hub.snapshot().await.unwrap();
    assert!(snapshot.is_online(&alice));
    assert_eq!(snapshot.connection_count, 1);
}
