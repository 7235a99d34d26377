//! Async client for the Letter Rush game protocol.
//!
//! [`LetterRushClient`] is a thin handle that communicates with a background
//! transport loop task via an unbounded MPSC channel. Events are emitted on a
//! bounded channel ([`tokio::sync::mpsc::Receiver<LetterRushEvent>`]) returned
//! from [`LetterRushClient::start`].
//!
//! The background loop is the single place inbound events touch room state,
//! so roster updates, timer ticks, and state changes are applied one at a
//! time in arrival order — never coalesced or reordered. Tearing the client
//! down stops the loop before the handle is released, so no event callback
//! can fire against a stale state holder.
//!
//! # Example
//!
//! ```rust,ignore
//! let transport = connect_somehow().await;
//! let config = LetterRushConfig::new("Alice", "fruit-salad");
//! let store = SettingsStore::new(MemoryCache::new());
//! let (client, mut events) = LetterRushClient::start(transport, config, store);
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         LetterRushEvent::PhaseChanged { phase, .. } => { /* render it */ }
//!         LetterRushEvent::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, warn};

use crate::error::{LetterRushError, Result};
use crate::event::LetterRushEvent;
use crate::protocol::{CategorySelection, ClientMessage, GamePhase, GameSettings, ServerMessage};
use crate::room::RoomState;
use crate::store::SettingsStore;
use crate::transport::Transport;

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`LetterRushClient`] connection.
///
/// Must be supplied to [`LetterRushClient::start`]. The required fields are
/// the `(user_name, room_name)` identity; all others have sensible defaults.
///
/// # Example
///
/// ```
/// use letter_rush_client::client::LetterRushConfig;
///
/// let config = LetterRushConfig::new("Alice", "fruit-salad");
/// assert_eq!(config.user_name, "Alice");
/// assert_eq!(config.room_name, "fruit-salad");
/// ```
///
/// # Tuning
///
/// ```
/// use letter_rush_client::client::LetterRushConfig;
/// use std::time::Duration;
///
/// let config = LetterRushConfig::new("Alice", "fruit-salad")
///     .with_event_channel_capacity(512)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct LetterRushConfig {
    /// Display name for the local player.
    pub user_name: String,
    /// Name of the room to join.
    pub room_name: String,
    /// Capacity of the bounded event channel.
    ///
    /// When the consumer cannot keep up with incoming server messages, events
    /// are dropped (with a warning logged) to avoid blocking the transport
    /// loop. State is still applied for dropped events; only the notification
    /// is lost. One extra slot beyond this capacity is reserved for the final
    /// `Disconnected` event, so it is delivered even when the channel is full.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// Timeout for the graceful shutdown.
    ///
    /// When [`LetterRushClient::shutdown`] is called, the background transport
    /// loop is given this much time to close the transport and emit a final
    /// `Disconnected` event. If the timeout expires the task is aborted.
    ///
    /// Defaults to **1 second**. A zero timeout aborts the transport loop
    /// immediately without waiting for graceful shutdown.
    pub shutdown_timeout: Duration,
}

impl LetterRushConfig {
    /// Create a new configuration for the given identity with default values.
    pub fn new(user_name: impl Into<String>, room_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            room_name: room_name.into(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Set the capacity of the bounded event channel.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Set the timeout for the graceful shutdown.
    ///
    /// Defaults to **1 second**. A zero timeout aborts the transport loop
    /// immediately without waiting for graceful shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

// ── Shared state ────────────────────────────────────────────────────

/// Internal shared state between the client handle and the transport loop.
struct ClientShared {
    connected: AtomicBool,
    room: Mutex<RoomState>,
}

impl ClientShared {
    fn new(user_name: String, room_name: String) -> Self {
        Self {
            connected: AtomicBool::new(true),
            room: Mutex::new(RoomState::new(user_name, room_name)),
        }
    }
}

// ── Client handle ───────────────────────────────────────────────────

/// Async client handle for a Letter Rush room session.
///
/// Created via [`LetterRushClient::start`], which spawns a background
/// transport loop and returns this handle together with an event receiver.
///
/// Outbound intents serialize a [`ClientMessage`] and queue it to the
/// transport loop over an unbounded channel; they return once the message is
/// queued (no round-trip await). The guarded emitters are deliberately
/// permissive about lifecycle phase: an answer submitted outside a round
/// lands in a buffer the next legitimate transition discards, rather than
/// raising an error.
pub struct LetterRushClient {
    /// Sender half of the command channel to the transport loop.
    cmd_tx: mpsc::UnboundedSender<ClientMessage>,
    /// Shared state updated by the transport loop.
    shared: Arc<ClientShared>,
    /// Settings persistence, consulted by [`start_game`](Self::start_game).
    store: SettingsStore,
    /// Handle to the background transport loop task.
    task: Option<tokio::task::JoinHandle<()>>,
    /// Oneshot sender to signal the transport loop to shut down gracefully.
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    /// Timeout for the graceful shutdown.
    shutdown_timeout: Duration,
}

impl LetterRushClient {
    /// Start the client transport loop and return a handle plus event receiver.
    ///
    /// The transport loop immediately sends a
    /// [`JoinRoom`](ClientMessage::JoinRoom) handshake for the configured
    /// `(user_name, room_name)` identity — exactly once per identity pair
    /// (see [`rejoin`](Self::rejoin) for switching rooms on a live
    /// transport).
    ///
    /// # Arguments
    ///
    /// * `transport` — A connected [`Transport`] implementation.
    /// * `config` — Client configuration including the room identity.
    /// * `store` — Settings persistence used for the game-start side effects.
    ///
    /// # Returns
    ///
    /// A tuple of `(client_handle, event_receiver)`. The event receiver
    /// yields [`LetterRushEvent`]s until the transport closes or the client
    /// shuts down.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn start(
        transport: impl Transport,
        config: LetterRushConfig,
        store: SettingsStore,
    ) -> (Self, mpsc::Receiver<LetterRushEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<ClientMessage>();
        // Clamp capacity to at least 1 (tokio panics on 0). One extra slot
        // is reserved for the final `Disconnected` event; ordinary events
        // never occupy it (see `emit_event`).
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<LetterRushEvent>(capacity + 1);
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let shared = Arc::new(ClientShared::new(
            config.user_name.clone(),
            config.room_name.clone(),
        ));
        let loop_shared = Arc::clone(&shared);

        // Send the JoinRoom handshake through the command channel so the
        // transport loop picks it up as the very first outgoing message.
        let join_msg = ClientMessage::JoinRoom {
            user_name: config.user_name,
            room_name: config.room_name,
        };
        // This cannot fail because we just created the channel.
        let _ = cmd_tx.send(join_msg);

        let task = tokio::spawn(transport_loop(
            transport,
            cmd_rx,
            event_tx,
            loop_shared,
            shutdown_rx,
        ));

        let client = Self {
            cmd_tx,
            shared,
            store,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        };

        (client, event_rx)
    }

    // ── Public API methods ──────────────────────────────────────────

    /// Join a (possibly different) room under a (possibly different) name.
    ///
    /// The join handshake runs exactly once per `(user_name, room_name)`
    /// pair: when the identity is unchanged this is a no-op. Otherwise the
    /// previous room session's state is reset and a fresh
    /// [`JoinRoom`](ClientMessage::JoinRoom) is sent.
    ///
    /// # Errors
    ///
    /// Returns [`LetterRushError::NotConnected`] if the transport has closed.
    pub async fn rejoin(
        &self,
        user_name: impl Into<String>,
        room_name: impl Into<String>,
    ) -> Result<()> {
        let user_name = user_name.into();
        let room_name = room_name.into();
        {
            let mut room = self.shared.room.lock().await;
            if room.user_name() == user_name && room.room_name() == room_name {
                debug!(user = %user_name, room = %room_name, "already joined, skipping handshake");
                return Ok(());
            }
            room.adopt_identity(user_name.clone(), room_name.clone());
        }
        self.send(ClientMessage::JoinRoom {
            user_name,
            room_name,
        })
    }

    /// Ask the server to start the game with the given lobby configuration.
    ///
    /// Clears the cached `ratings` key through the settings store as an
    /// observable side effect — regardless of the current lifecycle phase —
    /// then forwards the start intent with identity, settings, and
    /// categories. The UI is expected to only offer this from the lobby, but
    /// the operation itself is safe to call in any phase.
    ///
    /// # Errors
    ///
    /// Returns [`LetterRushError::NotConnected`] if the transport has closed.
    pub async fn start_game(
        &self,
        settings: GameSettings,
        categories: CategorySelection,
    ) -> Result<()> {
        self.store.clear_ratings();
        let (user_name, room_name) = {
            let room = self.shared.room.lock().await;
            (room.user_name().to_string(), room.room_name().to_string())
        };
        self.send(ClientMessage::StartGame {
            user_name,
            room_name,
            game_settings: settings,
            categories,
        })
    }

    /// Record an answer for the current round and forward the single changed
    /// value to the server.
    ///
    /// Only the delta travels — the full buffer is never re-sent. An empty
    /// buffer is first seeded from the current round's category list.
    ///
    /// # Errors
    ///
    /// Returns [`LetterRushError::NotConnected`] if the transport has closed.
    pub async fn submit_answer(&self, index: usize, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let room_name = {
            let mut room = self.shared.room.lock().await;
            room.record_answer(index, &value);
            room.room_name().to_string()
        };
        self.send(ClientMessage::SubmitAnswer {
            room_name,
            index,
            value,
        })
    }

    /// Cast a vote on a submitted answer.
    ///
    /// Stateless forward; mutates no local state.
    ///
    /// # Errors
    ///
    /// Returns [`LetterRushError::NotConnected`] if the transport has closed.
    pub fn submit_vote(&self, answer_id: impl Into<String>, value: i32) -> Result<()> {
        self.send(ClientMessage::SubmitVote {
            answer_id: answer_id.into(),
            value,
        })
    }

    /// Ask the server to advance to the next category during voting.
    ///
    /// Stateless forward; the advance only takes effect once the server
    /// echoes back a state-change event.
    ///
    /// # Errors
    ///
    /// Returns [`LetterRushError::NotConnected`] if the transport has closed.
    pub async fn next_category(&self) -> Result<()> {
        let room_name = self.shared.room.lock().await.room_name().to_string();
        self.send(ClientMessage::NextCategory { room_name })
    }

    /// Shut down the client, closing the transport and stopping the background task.
    ///
    /// After calling this method, the event receiver will yield `None` once
    /// the transport loop exits. Teardown is deterministic: the loop is
    /// stopped (gracefully or by abort) before this method returns, so no
    /// event is applied against the session's state afterwards.
    pub async fn shutdown(&mut self) {
        debug!("LetterRushClient: shutdown requested");

        // Signal the transport loop to shut down gracefully.
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        // Await the transport loop with a timeout. If it doesn't exit in time,
        // abort it so the task cannot detach and run indefinitely.
        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("transport loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("transport loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("transport loop aborted: {join_err}");
                    }
                }
            }
        }

        self.shared.connected.store(false, Ordering::Release);
    }

    // ── State accessors ─────────────────────────────────────────────

    /// Returns `true` if the transport is believed to be connected.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// The current roster of participant identifiers.
    pub async fn roster(&self) -> Vec<String> {
        self.shared.room.lock().await.users().to_vec()
    }

    /// The room name of the current session.
    pub async fn room_name(&self) -> String {
        self.shared.room.lock().await.room_name().to_string()
    }

    /// The current lifecycle phase.
    pub async fn phase(&self) -> GamePhase {
        self.shared.room.lock().await.phase()
    }

    /// The 0-based index of the current round.
    pub async fn current_round(&self) -> usize {
        self.shared.room.lock().await.current_round()
    }

    /// The latest `"mm:ss"` timer display (empty before the first tick).
    pub async fn timer(&self) -> String {
        self.shared.room.lock().await.timer().to_string()
    }

    /// The in-progress answer at `index`, if the buffer holds that slot.
    pub async fn answer(&self, index: usize) -> Option<String> {
        self.shared
            .room
            .lock()
            .await
            .answers()
            .get(index)
            .map(str::to_string)
    }

    /// A clone of the full room state snapshot, for rendering.
    pub async fn room_snapshot(&self) -> RoomState {
        self.shared.room.lock().await.clone()
    }

    /// The settings store this client writes through.
    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    // ── Internal helpers ────────────────────────────────────────────

    /// Queue a `ClientMessage` to the transport loop.
    fn send(&self, msg: ClientMessage) -> Result<()> {
        if !self.shared.connected.load(Ordering::Acquire) {
            return Err(LetterRushError::NotConnected);
        }
        self.cmd_tx
            .send(msg)
            .map_err(|_| LetterRushError::NotConnected)
    }
}

impl std::fmt::Debug for LetterRushClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LetterRushClient")
            .field("connected", &self.is_connected())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for LetterRushClient {
    fn drop(&mut self) {
        // `Drop` is synchronous so we cannot await a graceful shutdown.
        // The only safe action is to abort the spawned task, which causes
        // the transport loop future to be dropped immediately.  The
        // `shutdown_tx` oneshot is intentionally *not* sent here: sending
        // it would trigger a graceful path that calls async `transport.close()`,
        // but there is no executor context to drive it inside `Drop`.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Transport loop ──────────────────────────────────────────────────

/// Background transport loop that multiplexes send/receive via `tokio::select!`.
///
/// The single place inbound events meet room state: each `ServerMessage` is
/// applied to the shared [`RoomState`] in arrival order, then forwarded to
/// the consumer as a [`LetterRushEvent`].
///
/// Exits when:
/// - The command channel closes (client handle dropped or shutdown called)
/// - The transport returns `None` (server closed connection)
/// - A transport error occurs
async fn transport_loop(
    mut transport: impl Transport,
    mut cmd_rx: mpsc::UnboundedReceiver<ClientMessage>,
    event_tx: mpsc::Sender<LetterRushEvent>,
    shared: Arc<ClientShared>,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) {
    debug!("transport loop started");

    // Emit the synthetic Connected event before entering the select loop.
    emit_event(&event_tx, LetterRushEvent::Connected);

    loop {
        tokio::select! {
            // Branch 1: outgoing intent from the client handle
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(msg) => {
                        debug!("sending client message: {:?}", std::mem::discriminant(&msg));
                        match serde_json::to_string(&msg) {
                            Ok(json) => {
                                if let Err(e) = transport.send(json).await {
                                    error!("transport send error: {e}");
                                    emit_disconnected(
                                        &event_tx,
                                        &shared,
                                        Some(format!("transport send error: {e}")),
                                    );
                                    break;
                                }
                            }
                            Err(e) => {
                                error!("failed to serialize ClientMessage: {e}");
                                // Serialization errors are programming bugs; don't kill the loop.
                            }
                        }
                    }
                    // Command channel closed — client handle dropped.
                    None => {
                        debug!("command channel closed, shutting down transport loop");
                        let _ = transport.close().await;
                        emit_disconnected(&event_tx, &shared, Some("client shut down".into()));
                        break;
                    }
                }
            }

            // Branch 2: shutdown signal
            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                let _ = transport.close().await;
                emit_disconnected(&event_tx, &shared, Some("client shut down".into()));
                break;
            }

            // Branch 3: incoming event from the server
            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => {
                        match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(server_msg) => {
                                // Apply to room state first, then notify —
                                // consumers reading accessors after an event
                                // always see it reflected.
                                apply_server_message(&shared, &server_msg).await;
                                emit_event(&event_tx, LetterRushEvent::from(server_msg));
                            }
                            Err(e) => {
                                warn!("failed to deserialize server message: {e} — raw: {text}");
                            }
                        }
                    }
                    Some(Err(e)) => {
                        error!("transport receive error: {e}");
                        emit_disconnected(
                            &event_tx,
                            &shared,
                            Some(format!("transport receive error: {e}")),
                        );
                        break;
                    }
                    // Transport closed cleanly.
                    None => {
                        debug!("transport closed by server");
                        emit_disconnected(&event_tx, &shared, None);
                        break;
                    }
                }
            }
        }
    }

    debug!("transport loop exited");
}

/// Apply a received [`ServerMessage`] to the shared [`RoomState`].
async fn apply_server_message(shared: &ClientShared, msg: &ServerMessage) {
    match msg {
        ServerMessage::RosterChanged {
            users,
            room,
            game_state,
        } => {
            shared.room.lock().await.apply_roster_update(
                users.clone(),
                room.clone(),
                game_state.clone(),
            );
        }
        ServerMessage::TimerTick { seconds } => {
            shared.room.lock().await.apply_timer_tick(*seconds);
        }
        ServerMessage::StateChanged(snapshot) => {
            shared.room.lock().await.apply_state_change(snapshot.clone());
        }
    }
}

/// Emit an event to the event channel. If only the reserved slot is left,
/// log a warning and drop the event to avoid blocking the transport loop.
///
/// The channel is created one slot larger than the configured capacity; that
/// last slot belongs to [`emit_disconnected`]. Since the transport loop is
/// the only sender, refusing to send here when a single permit remains
/// guarantees the final `Disconnected` always finds room.
fn emit_event(event_tx: &mpsc::Sender<LetterRushEvent>, event: LetterRushEvent) {
    if event_tx.capacity() <= 1 {
        warn!(
            "event channel full, dropping event: {:?}",
            std::mem::discriminant(&event)
        );
        return;
    }
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!(
                "event channel full, dropping event: {:?}",
                std::mem::discriminant(&dropped)
            );
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

/// Emit a [`Disconnected`](LetterRushEvent::Disconnected) event and update state.
///
/// Sends into the reserved channel slot, so this never blocks and never
/// drops: `Disconnected` is always the last event a consumer observes.
fn emit_disconnected(
    event_tx: &mpsc::Sender<LetterRushEvent>,
    shared: &ClientShared,
    reason: Option<String>,
) {
    shared.connected.store(false, Ordering::Release);
    let event = LetterRushEvent::Disconnected { reason };
    if event_tx.try_send(event).is_err() {
        debug!("event channel closed, receiver dropped");
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::protocol::{GameSnapshot, RoundCategory};
    use crate::store::MemoryCache;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    // ── Mock transport ──────────────────────────────────────────────

    /// A mock transport that records sent messages and replays scripted responses.
    struct MockTransport {
        /// Messages that `recv()` will yield in order.
        incoming: VecDeque<Option<std::result::Result<String, LetterRushError>>>,
        /// Recorded outgoing messages.
        sent: Arc<StdMutex<Vec<String>>>,
        /// Whether `close()` was called.
        closed: Arc<AtomicBool>,
    }

    impl MockTransport {
        fn new(
            incoming: Vec<Option<std::result::Result<String, LetterRushError>>>,
        ) -> (Self, Arc<StdMutex<Vec<String>>>, Arc<AtomicBool>) {
            let sent = Arc::new(StdMutex::new(Vec::new()));
            let closed = Arc::new(AtomicBool::new(false));
            let transport = Self {
                incoming: VecDeque::from(incoming),
                sent: Arc::clone(&sent),
                closed: Arc::clone(&closed),
            };
            (transport, sent, closed)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&mut self, message: String) -> std::result::Result<(), LetterRushError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, LetterRushError>> {
            if let Some(item) = self.incoming.pop_front() {
                // An explicit `None` entry signals a clean transport close;
                // `Some(result)` delivers the scripted message or error.
                item
            } else {
                // All scripted messages have been delivered — hang forever
                // so the transport loop stays alive until shutdown.
                std::future::pending().await
            }
        }

        async fn close(&mut self) -> std::result::Result<(), LetterRushError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn roster_json(users: &[&str], room: &str) -> String {
        serde_json::to_string(&ServerMessage::RosterChanged {
            users: users.iter().map(|u| u.to_string()).collect(),
            room: room.into(),
            game_state: None,
        })
        .unwrap()
    }

    fn in_round_json() -> String {
        serde_json::to_string(&ServerMessage::StateChanged(GameSnapshot {
            state: GamePhase::InRound,
            current_round: 0,
            categories: vec![vec![
                RoundCategory::new("A fruit"),
                RoundCategory::new("A city"),
            ]],
        }))
        .unwrap()
    }

    fn test_store() -> SettingsStore {
        SettingsStore::new(MemoryCache::new())
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn start_sends_join_room_handshake() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);

        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        // First event should be Connected.
        let event = events.recv().await.unwrap();
        assert!(matches!(event, LetterRushEvent::Connected));

        // Give the loop a moment to flush the handshake.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        {
            let messages = sent.lock().unwrap();
            assert!(!messages.is_empty());
            let first: ClientMessage = serde_json::from_str(&messages[0]).unwrap();
            if let ClientMessage::JoinRoom {
                user_name,
                room_name,
            } = first
            {
                assert_eq!(user_name, "Alice");
                assert_eq!(room_name, "fruit-salad");
            } else {
                panic!("expected JoinRoom as first message");
            }
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn roster_event_updates_state() {
        let (transport, _sent, _closed) =
            MockTransport::new(vec![Some(Ok(roster_json(&["alice", "bob"], "fruit-salad")))]);

        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        let _ = events.recv().await; // Connected
        let event = events.recv().await.unwrap();
        assert!(matches!(event, LetterRushEvent::RosterChanged { .. }));

        assert_eq!(client.roster().await, vec!["alice", "bob"]);
        assert_eq!(client.room_name().await, "fruit-salad");

        client.shutdown().await;
    }

    #[tokio::test]
    async fn timer_state_reflects_latest_tick() {
        let tick = serde_json::to_string(&ServerMessage::TimerTick { seconds: 125 }).unwrap();
        let (transport, _sent, _closed) = MockTransport::new(vec![Some(Ok(tick))]);

        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        let _ = events.recv().await; // Connected
        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            LetterRushEvent::TimerTick {
                display: "02:05".into()
            }
        );
        assert_eq!(client.timer().await, "02:05");

        client.shutdown().await;
    }

    #[tokio::test]
    async fn submit_answer_records_and_sends_delta() {
        let (transport, sent, _closed) = MockTransport::new(vec![Some(Ok(in_round_json()))]);

        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        let _ = events.recv().await; // Connected
        let _ = events.recv().await; // PhaseChanged(InRound)

        client.submit_answer(1, "amsterdam").await.unwrap();
        assert_eq!(client.answer(1).await.as_deref(), Some("amsterdam"));
        // Seeded from the round's two categories.
        assert_eq!(client.answer(0).await.as_deref(), Some(""));

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        {
            let messages = sent.lock().unwrap();
            let last: ClientMessage = serde_json::from_str(messages.last().unwrap()).unwrap();
            if let ClientMessage::SubmitAnswer {
                room_name,
                index,
                value,
            } = last
            {
                assert_eq!(room_name, "fruit-salad");
                assert_eq!(index, 1);
                assert_eq!(value, "amsterdam");
            } else {
                panic!("expected SubmitAnswer message, got {last:?}");
            }
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn start_game_clears_ratings_and_sends_intent() {
        let cache = MemoryCache::new();
        use crate::store::{keys, Cache};
        cache.save(keys::RATINGS, r#"{"alice":5}"#).unwrap();
        let store = SettingsStore::new(cache);

        let (transport, sent, _closed) = MockTransport::new(vec![]);
        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, store);

        let _ = events.recv().await; // Connected

        client
            .start_game(GameSettings::default(), CategorySelection::default())
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        {
            let messages = sent.lock().unwrap();
            let last: ClientMessage = serde_json::from_str(messages.last().unwrap()).unwrap();
            assert!(matches!(last, ClientMessage::StartGame { .. }));
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn submit_vote_is_stateless_forward() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);
        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        let _ = events.recv().await; // Connected
        client.submit_vote("answer-17", 2).unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        {
            let messages = sent.lock().unwrap();
            let last: ClientMessage = serde_json::from_str(messages.last().unwrap()).unwrap();
            if let ClientMessage::SubmitVote { answer_id, value } = last {
                assert_eq!(answer_id, "answer-17");
                assert_eq!(value, 2);
            } else {
                panic!("expected SubmitVote message, got {last:?}");
            }
        }
        assert!(client.answer(0).await.is_none());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn rejoin_same_identity_is_noop() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);
        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        let _ = events.recv().await; // Connected
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        client.rejoin("Alice", "fruit-salad").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        // Only the initial handshake went out.
        assert_eq!(sent.lock().unwrap().len(), 1);

        client.shutdown().await;
    }

    #[tokio::test]
    async fn rejoin_new_room_sends_fresh_handshake() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);
        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        let _ = events.recv().await; // Connected

        client.rejoin("Alice", "veggie-tray").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        {
            let messages = sent.lock().unwrap();
            assert_eq!(messages.len(), 2);
            let last: ClientMessage = serde_json::from_str(messages.last().unwrap()).unwrap();
            if let ClientMessage::JoinRoom { room_name, .. } = last {
                assert_eq!(room_name, "veggie-tray");
            } else {
                panic!("expected JoinRoom message");
            }
        }
        assert_eq!(client.room_name().await, "veggie-tray");
        assert_eq!(client.phase().await, GamePhase::InLobby);

        client.shutdown().await;
    }

    #[tokio::test]
    async fn disconnected_on_transport_close() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            Some(Ok(roster_json(&["alice"], "fruit-salad"))),
            // Explicit None signals clean transport close.
            None,
        ]);

        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        let _ = events.recv().await; // Connected
        let _ = events.recv().await; // RosterChanged
        let event = events.recv().await.unwrap(); // Disconnected
        assert!(matches!(event, LetterRushEvent::Disconnected { .. }));

        assert!(!client.is_connected());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn not_connected_error_after_shutdown() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        let _ = events.recv().await; // Connected
        client.shutdown().await;

        let result = client.submit_vote("answer-1", 1);
        assert!(matches!(result, Err(LetterRushError::NotConnected)));
    }

    #[tokio::test]
    async fn shutdown_emits_disconnected() {
        let (transport, _sent, closed) = MockTransport::new(vec![]);

        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        let _ = events.recv().await; // Connected
        client.shutdown().await;

        let event = events.recv().await.unwrap();
        assert!(matches!(event, LetterRushEvent::Disconnected { .. }));
        if let LetterRushEvent::Disconnected { reason } = event {
            assert_eq!(reason.as_deref(), Some("client shut down"));
        }

        // The transport should have been closed.
        assert!(closed.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn malformed_payload_is_skipped_not_fatal() {
        let tick = serde_json::to_string(&ServerMessage::TimerTick { seconds: 5 }).unwrap();
        let (transport, _sent, _closed) = MockTransport::new(vec![
            Some(Ok("{not json at all".into())),
            Some(Ok(r#"{"type":"Unknown","data":{}}"#.into())),
            Some(Ok(tick)),
        ]);

        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        let _ = events.recv().await; // Connected
        // Both malformed frames were skipped; the tick still arrives.
        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            LetterRushEvent::TimerTick {
                display: "00:05".into()
            }
        );

        client.shutdown().await;
    }

    #[tokio::test]
    async fn transport_recv_error_emits_disconnected() {
        let (transport, _sent, _closed) = MockTransport::new(vec![Some(Err(
            LetterRushError::TransportReceive("boom".into()),
        ))]);

        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        let _ = events.recv().await; // Connected
        let event = events.recv().await.unwrap();
        assert!(matches!(event, LetterRushEvent::Disconnected { .. }));
        if let LetterRushEvent::Disconnected { reason } = event {
            assert!(reason.unwrap().contains("boom"));
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn double_shutdown_does_not_panic() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        let _ = events.recv().await; // Connected
        client.shutdown().await;
        client.shutdown().await; // should not panic
    }

    #[tokio::test]
    async fn drop_without_explicit_shutdown() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (client, mut events) = LetterRushClient::start(transport, config, test_store());

        let _ = events.recv().await; // Connected

        // Drop the client without calling shutdown.
        drop(client);

        // The transport loop should eventually exit; the event channel
        // will close. We just verify we don't hang or panic.
        while let Some(_event) = events.recv().await {}
    }

    #[tokio::test]
    async fn config_defaults() {
        let config = LetterRushConfig::new("Alice", "fruit-salad");
        assert_eq!(config.user_name, "Alice");
        assert_eq!(config.room_name, "fruit-salad");
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.shutdown_timeout, std::time::Duration::from_secs(1));
    }

    #[tokio::test]
    async fn event_channel_capacity_is_clamped_to_one() {
        let config = LetterRushConfig::new("Alice", "r").with_event_channel_capacity(0);
        assert_eq!(config.event_channel_capacity, 1);
    }

    #[tokio::test]
    async fn small_event_channel_drops_notifications_but_applies_state() {
        // Flood more ticks than a capacity-1 channel can hold; the final
        // timer state must still reflect the last tick even though most
        // TimerTick notifications were dropped.
        let mut incoming: Vec<Option<std::result::Result<String, LetterRushError>>> = Vec::new();
        for s in (0..20).rev() {
            incoming
                .push(Some(Ok(serde_json::to_string(
                    &ServerMessage::TimerTick { seconds: s },
                )
                .unwrap())));
        }

        let (transport, _sent, _closed) = MockTransport::new(incoming);
        let config = LetterRushConfig::new("Alice", "fruit-salad").with_event_channel_capacity(1);
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        // Let the loop chew through the ticks without draining events.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        assert_eq!(client.timer().await, "00:00");

        client.shutdown().await;
        while let Some(_event) = events.recv().await {}
    }

    #[tokio::test]
    async fn disconnected_is_delivered_even_when_channel_is_full() {
        // Fill a capacity-1 channel and never drain it, then shut down with
        // a generous timeout. Shutdown must not wait on channel space, and
        // the reserved slot must carry the final Disconnected.
        let mut incoming: Vec<Option<std::result::Result<String, LetterRushError>>> = Vec::new();
        for s in (0..5).rev() {
            incoming
                .push(Some(Ok(serde_json::to_string(
                    &ServerMessage::TimerTick { seconds: s },
                )
                .unwrap())));
        }

        let (transport, _sent, _closed) = MockTransport::new(incoming);
        let config = LetterRushConfig::new("Alice", "fruit-salad")
            .with_event_channel_capacity(1)
            .with_shutdown_timeout(std::time::Duration::from_secs(30));
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        // Let the loop fill the channel without draining events.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        // With the 30s grace period a blocked transport loop would stall
        // here far past this deadline.
        tokio::time::timeout(std::time::Duration::from_secs(5), client.shutdown())
            .await
            .expect("shutdown must not wait for channel space");

        let mut last = None;
        while let Some(event) = events.recv().await {
            last = Some(event);
        }
        assert!(matches!(last, Some(LetterRushEvent::Disconnected { .. })));
    }

    #[tokio::test]
    async fn debug_impl_for_client() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let config = LetterRushConfig::new("Alice", "fruit-salad");
        let (mut client, mut events) = LetterRushClient::start(transport, config, test_store());

        let _ = events.recv().await; // Connected

        let debug_str = format!("{:?}", client);
        assert!(debug_str.contains("LetterRushClient"));
        assert!(debug_str.contains("connected"));

        client.shutdown().await;
    }
}
