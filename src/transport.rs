//! The [`Transport`] seam between the client and the game server.
//!
//! Letter Rush exchanges one JSON document per message in both directions:
//! [`ClientMessage`](crate::protocol::ClientMessage) out,
//! [`ServerMessage`](crate::protocol::ServerMessage) in. A transport moves
//! those strings and nothing more; it does not parse them, and it owns
//! whatever framing its medium needs. Connecting is left to each
//! implementation because the parameters differ per medium (a URL for
//! WebSocket, an address pair for TCP). Build a connected transport, then
//! give it to [`LetterRushClient::start`](crate::client::LetterRushClient::start).
//!
//! The crate ships [`WebSocketTransport`](crate::WebSocketTransport) behind
//! the `transport-websocket` feature. Anything else is a custom
//! implementation, for example a loopback useful in tests:
//!
//! ```rust
//! use async_trait::async_trait;
//! use letter_rush_client::error::LetterRushError;
//! use letter_rush_client::transport::Transport;
//!
//! /// Replays canned server frames and discards everything sent.
//! struct Replay {
//!     frames: Vec<String>,
//! }
//!
//! #[async_trait]
//! impl Transport for Replay {
//!     async fn send(&mut self, _message: String) -> Result<(), LetterRushError> {
//!         Ok(())
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, LetterRushError>> {
//!         if self.frames.is_empty() {
//!             // A real implementation would wait here; an empty replay
//!             // means the server went away.
//!             return None;
//!         }
//!         Some(Ok(self.frames.remove(0)))
//!     }
//!
//!     async fn close(&mut self) -> Result<(), LetterRushError> {
//!         self.frames.clear();
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::LetterRushError;

/// A bidirectional carrier of serialized game protocol messages.
///
/// One call to [`send`](Transport::send) delivers one complete JSON message;
/// one resolved [`recv`](Transport::recv) yields one. The trait is
/// object-safe, though [`LetterRushClient::start`](crate::client::LetterRushClient::start)
/// takes `impl Transport` and monomorphizes.
///
/// # Cancel Safety
///
/// The client's transport loop polls [`recv`](Transport::recv) inside
/// `tokio::select!`, so `recv` must tolerate being dropped before completion
/// without losing a message. Implementations that read from an async channel
/// or a tungstenite stream get this for free.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Deliver one serialized [`ClientMessage`](crate::protocol::ClientMessage)
    /// to the server.
    ///
    /// # Errors
    ///
    /// [`LetterRushError::TransportSend`] when delivery fails, for example
    /// on a broken connection.
    async fn send(&mut self, message: String) -> Result<(), LetterRushError>;

    /// Wait for the next serialized [`ServerMessage`](crate::protocol::ServerMessage).
    ///
    /// `Some(Ok(text))` is a complete message, `Some(Err(_))` a transport
    /// failure, and `None` a clean close by the server. Must be cancel-safe
    /// (see the trait docs).
    async fn recv(&mut self) -> Option<Result<String, LetterRushError>>;

    /// Shut the connection down gracefully.
    ///
    /// Later `send` calls may error and later `recv` calls may yield `None`.
    ///
    /// # Errors
    ///
    /// Reports a failed close handshake; resources should be released
    /// regardless.
    async fn close(&mut self) -> Result<(), LetterRushError>;
}
