//! # Basic Room Example
//!
//! Demonstrates a complete Letter Rush client lifecycle:
//!
//! 1. Connect to a game server via WebSocket
//! 2. Join a room (the client sends the join handshake automatically)
//! 3. React to room events (roster changes, timer ticks, phase changes)
//! 4. Start a game once a second participant arrives
//! 5. Shut down gracefully on Ctrl+C or disconnect
//!
//! ## Running
//!
//! ```sh
//! # Start a Letter Rush server on localhost:4000, then:
//! cargo run --example basic_room
//!
//! # Override the server URL:
//! LETTER_RUSH_URL=ws://my-server:4000/ws cargo run --example basic_room
//! ```

use letter_rush_client::{
    GamePhase, LetterRushClient, LetterRushConfig, LetterRushEvent, MemoryCache, SettingsStore,
    WebSocketTransport,
};

/// Default server URL when `LETTER_RUSH_URL` is not set.
const DEFAULT_URL: &str = "ws://localhost:4000/ws";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Initialize tracing. Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let url = std::env::var("LETTER_RUSH_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    tracing::info!("Connecting to {url}");

    // ── Connect ─────────────────────────────────────────────────────
    // Establish a WebSocket connection to the game server.
    let transport = WebSocketTransport::connect(&url).await?;

    // Identity for this session: who we are and which room we want.
    let config = LetterRushConfig::new("RustPlayer", "example-room");

    // Settings live in an in-memory cache here. A real embedding would
    // supply a cache backed by its platform's local storage.
    let store = SettingsStore::new(MemoryCache::new());

    // Start the client. This spawns a background task that drives the
    // transport, joins the room, and emits events on `event_rx`.
    let (mut client, mut event_rx) = LetterRushClient::start(transport, config, store);

    let mut game_started = false;

    // ── Event loop ──────────────────────────────────────────────────
    // Use `tokio::select!` to listen for both server events and Ctrl+C.
    loop {
        tokio::select! {
            // Branch 1: Incoming event from the server (or transport layer).
            event = event_rx.recv() => {
                let Some(event) = event else {
                    // Channel closed — transport loop exited.
                    tracing::info!("Event channel closed, exiting");
                    break;
                };

                match event {
                    // ── Synthetic: transport connected ───────────────
                    LetterRushEvent::Connected => {
                        tracing::info!("Transport connected, join request sent");
                    }

                    // ── Room lifecycle ────────────────────────────────
                    LetterRushEvent::RosterChanged { users, room } => {
                        tracing::info!(
                            "Room {room}: {} participant(s): {}",
                            users.len(),
                            users.join(", ")
                        );

                        // Once somebody else shows up, kick off a game with
                        // whatever settings the store holds.
                        if !game_started
                            && users.len() >= 2
                            && client.phase().await == GamePhase::InLobby
                        {
                            let settings = client.store().load_settings();
                            let categories = client.store().load_categories();
                            client.start_game(settings, categories).await?;
                            game_started = true;
                            tracing::info!("Start-game request sent");
                        }
                    }

                    LetterRushEvent::TimerTick { display: remaining } => {
                        tracing::info!("Time remaining: {remaining}");
                    }

                    LetterRushEvent::PhaseChanged { phase, current_round } => {
                        tracing::info!("Phase → {phase:?} (round {current_round})");

                        if phase == GamePhase::InRound {
                            // Answer the first prompt of the round.
                            client.submit_answer(0, "Apple").await?;
                            tracing::info!("Submitted an answer for prompt 0");
                        }
                    }

                    // ── Disconnect ───────────────────────────────────
                    LetterRushEvent::Disconnected { reason } => {
                        tracing::warn!("Disconnected: {}", reason.as_deref().unwrap_or("clean close"));
                        break;
                    }
                }
            }

            // Branch 2: Ctrl+C — shut down gracefully.
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down…");
                break;
            }
        }
    }

    // ── Cleanup ─────────────────────────────────────────────────────
    client.shutdown().await;
    tracing::info!("Client shut down. Goodbye!");
    Ok(())
}
