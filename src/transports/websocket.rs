//! WebSocket transport built on `tokio-tungstenite`.
//!
//! Letter Rush servers speak the game protocol as one JSON document per
//! WebSocket text frame, so [`WebSocketTransport`] maps [`Transport::send`]
//! to a text frame and [`Transport::recv`] to the next text frame. Anything
//! else on the wire is either connection housekeeping (ping, pong, close) or
//! noise (binary frames, which the game server never produces) and is
//! handled below [`recv`](Transport::recv) without surfacing to the client.
//!
//! Available behind the `transport-websocket` feature (on by default). Both
//! `ws://` and `wss://` URLs work; TLS is negotiated by
//! [`MaybeTlsStream`](tokio_tungstenite::MaybeTlsStream).
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), letter_rush_client::LetterRushError> {
//! use letter_rush_client::WebSocketTransport;
//!
//! let transport = WebSocketTransport::connect("ws://localhost:4000/ws").await?;
//! // Hand the transport to LetterRushClient::start.
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, trace, warn};

use crate::error::LetterRushError;
use crate::transport::Transport;

/// The stream type produced by [`tokio_tungstenite::connect_async`].
///
/// Public so callers with custom connection setup (TLS config, proxies,
/// extra headers) can build the stream themselves and hand it to
/// [`WebSocketTransport::from_stream`].
pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// [`Transport`] over a WebSocket connection to a Letter Rush server.
///
/// `recv` is cancel-safe: dropping its future mid-poll loses no frames, so
/// it can sit in a `tokio::select!` arm.
#[derive(Debug)]
pub struct WebSocketTransport {
    stream: WsStream,
    closed: bool,
}

impl WebSocketTransport {
    /// Dial the game server at `url` and complete the WebSocket handshake.
    ///
    /// # Errors
    ///
    /// Returns [`LetterRushError::Io`] when the URL is malformed or the
    /// connection fails. An underlying I/O error keeps its
    /// [`ErrorKind`](std::io::ErrorKind); handshake-level failures map to
    /// [`ErrorKind::Other`](std::io::ErrorKind::Other).
    pub async fn connect(url: &str) -> Result<Self, LetterRushError> {
        debug!(url = %url, "dialing game server");

        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(handshake_error)?;

        info!(url = %url, "connected to game server");

        Ok(Self::from_stream(stream))
    }

    /// Like [`connect`](Self::connect), but gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`LetterRushError::Timeout`] when the deadline passes, or
    /// whatever [`connect`](Self::connect) would have returned.
    pub async fn connect_with_timeout(
        url: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, LetterRushError> {
        tokio::time::timeout(timeout, Self::connect(url))
            .await
            .map_err(|_| LetterRushError::Timeout)?
    }

    /// Wrap an already-connected WebSocket stream.
    pub fn from_stream(stream: WsStream) -> Self {
        Self {
            stream,
            closed: false,
        }
    }
}

fn handshake_error(e: tokio_tungstenite::tungstenite::Error) -> LetterRushError {
    let kind = match &e {
        tokio_tungstenite::tungstenite::Error::Io(io) => io.kind(),
        _ => std::io::ErrorKind::Other,
    };
    LetterRushError::Io(std::io::Error::new(kind, e))
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, message: String) -> Result<(), LetterRushError> {
        if self.closed {
            return Err(LetterRushError::TransportClosed);
        }
        trace!(bytes = message.len(), "frame out");
        self.stream
            .send(Message::Text(message.into()))
            .await
            .map_err(|e| LetterRushError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, LetterRushError>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    trace!(bytes = text.len(), "frame in");
                    return Some(Ok(text.to_string()));
                }
                Ok(Message::Close(reason)) => {
                    debug!(?reason, "server closed the connection");
                    return None;
                }
                Ok(Message::Binary(payload)) => {
                    // The game protocol is text-only; a binary frame means a
                    // misbehaving peer, not a protocol message.
                    warn!(bytes = payload.len(), "ignoring binary frame");
                }
                // Ping and pong are answered inside tungstenite; the raw
                // Frame variant never appears on the read half.
                Ok(_) => {}
                Err(e) => {
                    return Some(Err(LetterRushError::TransportReceive(e.to_string())));
                }
            }
        }
        None
    }

    async fn close(&mut self) -> Result<(), LetterRushError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream
            .close(None)
            .await
            .map_err(|e| LetterRushError::TransportSend(e.to_string()))
    }
}

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
    use crate::protocol::{ClientMessage, GamePhase, ServerMessage};
    use tokio::net::TcpListener;

    /// Run `handler` as a one-shot game server on a random local port and
    /// return the URL to dial.
    async fn spawn_game_server<F, Fut>(handler: F) -> String
    where
        F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut
            + Send
            + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            handler(ws).await;
        });

        format!("ws://{addr}")
    }

    fn frame(msg: &ServerMessage) -> Message {
        Message::Text(serde_json::to_string(msg).unwrap().into())
    }

    #[tokio::test]
    async fn delivers_game_frames_in_order() {
        let url = spawn_game_server(|mut ws| async move {
            ws.send(frame(&ServerMessage::TimerTick { seconds: 42 }))
                .await
                .unwrap();
            ws.send(frame(&ServerMessage::StateChanged(
                crate::protocol::GameSnapshot {
                    state: GamePhase::InVoting,
                    current_round: 1,
                    categories: vec![],
                },
            )))
            .await
            .unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();

        let first = transport.recv().await.unwrap().unwrap();
        let first: ServerMessage = serde_json::from_str(&first).unwrap();
        assert!(matches!(first, ServerMessage::TimerTick { seconds: 42 }));

        let second = transport.recv().await.unwrap().unwrap();
        let second: ServerMessage = serde_json::from_str(&second).unwrap();
        match second {
            ServerMessage::StateChanged(snapshot) => {
                assert_eq!(snapshot.state, GamePhase::InVoting);
                assert_eq!(snapshot.current_round, 1);
            }
            other => panic!("expected StateChanged, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn join_frame_reaches_the_server_intact() {
        let url = spawn_game_server(|mut ws| async move {
            let Some(Ok(Message::Text(text))) = ws.next().await else {
                panic!("expected a text frame from the client");
            };
            let msg: ClientMessage = serde_json::from_str(&text).unwrap();
            let ClientMessage::JoinRoom {
                user_name,
                room_name,
            } = msg
            else {
                panic!("expected JoinRoom, got {msg:?}");
            };
            // Echo the parsed identity back as a roster broadcast.
            ws.send(frame(&ServerMessage::RosterChanged {
                users: vec![user_name],
                room: room_name,
                game_state: None,
            }))
            .await
            .unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        let join = ClientMessage::JoinRoom {
            user_name: "Alice".into(),
            room_name: "fruit-salad".into(),
        };
        transport
            .send(serde_json::to_string(&join).unwrap())
            .await
            .unwrap();

        let reply = transport.recv().await.unwrap().unwrap();
        let reply: ServerMessage = serde_json::from_str(&reply).unwrap();
        match reply {
            ServerMessage::RosterChanged { users, room, .. } => {
                assert_eq!(users, vec!["Alice".to_string()]);
                assert_eq!(room, "fruit-salad");
            }
            other => panic!("expected RosterChanged, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn binary_noise_does_not_interrupt_the_frame_stream() {
        let url = spawn_game_server(|mut ws| async move {
            ws.send(Message::Binary(vec![0xDE, 0xAD].into()))
                .await
                .unwrap();
            ws.send(frame(&ServerMessage::TimerTick { seconds: 7 }))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();

        let text = transport.recv().await.unwrap().unwrap();
        let msg: ServerMessage = serde_json::from_str(&text).unwrap();
        assert!(matches!(msg, ServerMessage::TimerTick { seconds: 7 }));
    }

    #[tokio::test]
    async fn server_close_ends_the_frame_stream() {
        let url = spawn_game_server(|mut ws| async move {
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        assert!(transport.recv().await.is_none());
    }

    #[tokio::test]
    async fn send_after_close_is_rejected() {
        let url = spawn_game_server(|mut ws| async move {
            while let Some(Ok(_)) = ws.next().await {}
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        transport.close().await.unwrap();

        let err = transport.send("{}".to_string()).await.unwrap_err();
        assert!(matches!(err, LetterRushError::TransportClosed));
    }

    #[tokio::test]
    async fn close_twice_is_a_no_op() {
        let url = spawn_game_server(|mut ws| async move {
            while let Some(Ok(_)) = ws.next().await {}
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        transport.close().await.unwrap();
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn recv_after_close_does_not_hang() {
        let url = spawn_game_server(|mut ws| async move {
            while let Some(Ok(_)) = ws.next().await {}
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        transport.close().await.unwrap();

        match transport.recv().await {
            None | Some(Err(_)) => {}
            Some(Ok(text)) => panic!("expected the stream to end, got {text:?}"),
        }
    }

    #[tokio::test]
    async fn connect_rejects_a_malformed_url() {
        let err = WebSocketTransport::connect("not-a-url").await.unwrap_err();
        assert!(matches!(err, LetterRushError::Io(_)));
    }

    #[tokio::test]
    async fn connect_rejects_an_unreachable_host() {
        let err = WebSocketTransport::connect("ws://127.0.0.1:1")
            .await
            .unwrap_err();
        assert!(matches!(err, LetterRushError::Io(_)));
    }

    #[tokio::test]
    async fn connect_with_timeout_gives_up() {
        // 192.0.2.0/24 is reserved for documentation and never routes.
        let err = WebSocketTransport::connect_with_timeout(
            "ws://192.0.2.1:1",
            std::time::Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LetterRushError::Timeout));
    }

    #[tokio::test]
    async fn from_stream_wraps_a_hand_built_connection() {
        let url = spawn_game_server(|mut ws| async move {
            ws.send(frame(&ServerMessage::TimerTick { seconds: 3 }))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let (stream, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        let mut transport = WebSocketTransport::from_stream(stream);

        let text = transport.recv().await.unwrap().unwrap();
        let msg: ServerMessage = serde_json::from_str(&text).unwrap();
        assert!(matches!(msg, ServerMessage::TimerTick { seconds: 3 }));
    }
}
