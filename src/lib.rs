//! # Letter Rush Client
//!
//! Transport-agnostic Rust client for the Letter Rush multiplayer word game.
//!
//! This crate is the client-side coordinator for a category-based word game
//! played in timed rounds with voting on submitted answers. It reconciles
//! locally-held game state with authoritative updates pushed by the server,
//! drives the room lifecycle (lobby → round → voting → post-round), and
//! persists user-configurable settings across sessions.
//!
//! ## Features
//!
//! - **Transport-agnostic** — implement the [`Transport`] trait for any backend
//! - **Server-authoritative** — inbound events are adopted wholesale, applied
//!   in arrival order, and never rejected; stale per-round answers are cleared
//!   on every transition out of a round
//! - **WebSocket built-in** — default `transport-websocket` feature provides
//!   `WebSocketTransport`
//! - **Event-driven** — receive typed [`LetterRushEvent`]s via a channel
//! - **Pluggable persistence** — settings round-trip through the
//!   [`Cache`](store::Cache) trait with compiled-in default fallback
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use letter_rush_client::{
//!     LetterRushClient, LetterRushConfig, LetterRushEvent, MemoryCache, SettingsStore,
//!     WebSocketTransport,
//! };
//!
//! let transport = WebSocketTransport::connect("ws://localhost:4000/ws").await?;
//! let config = LetterRushConfig::new("Alice", "fruit-salad");
//! let store = SettingsStore::new(MemoryCache::new());
//! let (client, mut events) = LetterRushClient::start(transport, config, store);
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         LetterRushEvent::PhaseChanged { phase, .. } => { /* render */ }
//!         LetterRushEvent::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

pub mod answers;
pub mod client;
pub mod error;
pub mod event;
pub mod protocol;
pub mod room;
pub mod store;
pub mod timer;
pub mod transport;
pub mod transports;

// Re-export primary types for ergonomic imports.
pub use client::{LetterRushClient, LetterRushConfig};
pub use error::LetterRushError;
pub use event::LetterRushEvent;
pub use protocol::{
    CategorySelection, ClientMessage, GamePhase, GameSettings, GameSnapshot, ServerMessage,
};
pub use room::RoomState;
pub use store::{MemoryCache, SettingsStore};
pub use transport::Transport;

#[cfg(feature = "transport-websocket")]
pub use transports::WebSocketTransport;
