#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for Letter Rush Client integration tests.
//!
//! Provides a scripted [`MockTransport`], a push-driven [`ChannelTransport`]
//! for tests that need to interleave inbound events with client actions, and
//! helper functions for constructing common server event JSON strings.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use letter_rush_client::protocol::{GamePhase, GameSnapshot, RoundCategory, ServerMessage};
use letter_rush_client::store::{MemoryCache, SettingsStore};
use letter_rush_client::{LetterRushError, Transport};
use tokio::sync::mpsc;

// ── MockTransport ───────────────────────────────────────────────────

/// A scripted mock transport for integration testing.
///
/// Scripted server responses are consumed in order by `recv()`.
/// All messages sent by the client are recorded in `sent`.
pub struct MockTransport {
    /// Scripted server responses (consumed in order by `recv`).
    incoming: VecDeque<Option<Result<String, LetterRushError>>>,
    /// Recorded outgoing messages from the client.
    pub sent: Arc<StdMutex<Vec<String>>>,
    /// Whether `close()` has been called.
    pub closed: Arc<AtomicBool>,
}

impl MockTransport {
    /// Create a new mock transport with the given scripted incoming messages.
    ///
    /// Returns the transport plus shared handles for inspecting sent messages
    /// and whether close was called.
    pub fn new(
        incoming: Vec<Option<Result<String, LetterRushError>>>,
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
    async fn send(&mut self, message: String) -> Result<(), LetterRushError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, LetterRushError>> {
        if let Some(item) = self.incoming.pop_front() {
            item
        } else {
            // No more scripted messages — hang forever so the transport loop
            // stays alive until shutdown is called.
            std::future::pending().await
        }
    }

    async fn close(&mut self) -> Result<(), LetterRushError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── ChannelTransport ────────────────────────────────────────────────

/// A push-driven transport: the test holds a [`ServerHandle`] and injects
/// inbound frames whenever it wants, so client actions can be interleaved
/// with server events deterministically.
pub struct ChannelTransport {
    incoming: mpsc::UnboundedReceiver<Result<String, LetterRushError>>,
    pub sent: Arc<StdMutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
}

/// Test-side handle for pushing frames into a [`ChannelTransport`].
///
/// Dropping the handle does NOT close the transport (recv hangs instead);
/// call [`ServerHandle::push`] with frames or shut the client down.
#[derive(Clone)]
pub struct ServerHandle {
    tx: mpsc::UnboundedSender<Result<String, LetterRushError>>,
}

impl ServerHandle {
    /// Deliver one inbound frame to the client.
    pub fn push(&self, frame: impl Into<String>) {
        self.tx.send(Ok(frame.into())).expect("transport loop gone");
    }

    /// Deliver a typed server message to the client.
    pub fn push_message(&self, msg: &ServerMessage) {
        self.push(serde_json::to_string(msg).expect("serialize server message"));
    }

    /// Deliver a transport-level error to the client.
    pub fn push_error(&self, error: LetterRushError) {
        self.tx.send(Err(error)).expect("transport loop gone");
    }
}

impl ChannelTransport {
    pub fn new() -> (Self, ServerHandle, Arc<StdMutex<Vec<String>>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let transport = Self {
            incoming: rx,
            sent: Arc::clone(&sent),
            closed: Arc::new(AtomicBool::new(false)),
        };
        (transport, ServerHandle { tx }, sent)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, message: String) -> Result<(), LetterRushError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, LetterRushError>> {
        // mpsc recv is cancel-safe, which keeps this safe inside select!.
        match self.incoming.recv().await {
            Some(item) => Some(item),
            // All ServerHandles dropped — keep the connection "open" so the
            // test controls when the session ends.
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), LetterRushError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── JSON helper functions ───────────────────────────────────────────

/// Returns the JSON string for a `RosterChanged` server message carrying no
/// lifecycle snapshot (a pure membership update).
pub fn roster_json(users: &[&str], room: &str) -> String {
    serde_json::to_string(&ServerMessage::RosterChanged {
        users: users.iter().map(|u| u.to_string()).collect(),
        room: room.into(),
        game_state: None,
    })
    .expect("roster_json serialization")
}

/// Returns the JSON string for a `TimerTick` server message.
pub fn timer_json(seconds: u64) -> String {
    serde_json::to_string(&ServerMessage::TimerTick { seconds })
        .expect("timer_json serialization")
}

/// Returns the JSON string for a `StateChanged` message with the given phase
/// and no categories.
pub fn state_json(phase: GamePhase, current_round: usize) -> String {
    serde_json::to_string(&ServerMessage::StateChanged(GameSnapshot {
        state: phase,
        current_round,
        categories: vec![],
    }))
    .expect("state_json serialization")
}

/// Returns the JSON string for a `StateChanged` message entering a round
/// with the given category prompts.
pub fn in_round_json(current_round: usize, prompts: &[&str]) -> String {
    let round: Vec<RoundCategory> = prompts.iter().map(|p| RoundCategory::new(*p)).collect();
    let mut categories = vec![Vec::new(); current_round];
    categories.push(round);
    serde_json::to_string(&ServerMessage::StateChanged(GameSnapshot {
        state: GamePhase::InRound,
        current_round,
        categories,
    }))
    .expect("in_round_json serialization")
}

/// A settings store over a fresh in-memory cache.
pub fn memory_store() -> SettingsStore {
    SettingsStore::new(MemoryCache::new())
}
