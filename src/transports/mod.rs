//! Bundled [`Transport`](crate::Transport) implementations.
//!
//! Each lives behind its own Cargo feature so consumers that bring their own
//! transport pay nothing for the bundled ones. `transport-websocket` (a
//! default feature) provides [`WebSocketTransport`] for the `ws://` and
//! `wss://` endpoints Letter Rush servers expose.

#[cfg(feature = "transport-websocket")]
pub mod websocket;

#[cfg(feature = "transport-websocket")]
pub use websocket::WebSocketTransport;
