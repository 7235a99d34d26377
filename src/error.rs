//! Error types for the Letter Rush client.

use thiserror::Error;

/// Errors that can occur when using the Letter Rush client.
#[derive(Debug, Error)]
pub enum LetterRushError {
    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed unexpectedly.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Attempted an operation that requires an active connection, but the client is not connected.
    #[error("not connected to server")]
    NotConnected,

    /// The settings cache could not read or write a key.
    ///
    /// [`SettingsStore`](crate::store::SettingsStore) absorbs this error and
    /// falls back to in-memory values; it only surfaces from direct
    /// [`Cache`](crate::store::Cache) calls.
    #[error("settings cache error: {0}")]
    Cache(String),

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for Letter Rush client operations.
pub type Result<T> = std::result::Result<T, LetterRushError>;
