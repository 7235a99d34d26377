//! Wire-compatible protocol types for the Letter Rush game protocol.
//!
//! Every type in this module produces the JSON the server speaks: externally
//! tagged messages (`{"type": ..., "data": ...}`) with camelCase field names.
//! Inbound payloads treat missing fields as empty defaults — the server is
//! the single source of truth and the client never rejects what it sends.

use serde::{Deserialize, Serialize};

// ── Game lifecycle ──────────────────────────────────────────────────

/// The four phases of a room's game lifecycle.
///
/// Transitions are driven exclusively by the server via
/// [`ServerMessage::StateChanged`]; the client adopts whatever phase the
/// server announces. Serialized in the server's camelCase form
/// (`"inLobby"`, `"inRound"`, `"inVoting"`, `"inPostRound"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    /// Pre-game: settings and categories are being configured.
    #[default]
    InLobby,
    /// A timed round is running and answers may be submitted.
    InRound,
    /// Submitted answers are being rated by the participants.
    InVoting,
    /// Aggregated results are on display before the next round or game end.
    InPostRound,
}

/// One category prompt within a round, with the answer submitted so far.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundCategory {
    /// The prompt text (e.g. `"A fruit"`).
    pub category: String,
    /// The answer recorded against this prompt; empty until one is submitted.
    #[serde(default)]
    pub answer: String,
}

impl RoundCategory {
    /// Create a category prompt with no answer yet.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            answer: String::new(),
        }
    }
}

/// Authoritative snapshot of a room's game lifecycle.
///
/// Carried whole inside state-change and roster events. `categories` is
/// indexed by round: `categories[current_round]` is the prompt list for the
/// round in progress (empty while in the lobby).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    /// Current lifecycle phase.
    #[serde(default)]
    pub state: GamePhase,
    /// 0-based index of the current round.
    #[serde(default)]
    pub current_round: usize,
    /// Per-round category lists, indexed by round number.
    #[serde(default)]
    pub categories: Vec<Vec<RoundCategory>>,
}

impl GameSnapshot {
    /// The category list for the current round, or an empty slice when the
    /// snapshot carries none (e.g. in the lobby).
    pub fn current_categories(&self) -> &[RoundCategory] {
        self.categories
            .get(self.current_round)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// User-configurable game settings, persisted across sessions.
///
/// Has a fixed, versionless default. Letter generation is an external
/// collaborator — the compiled-in default carries an empty letter set and
/// callers inject generated letters via [`with_letters`](Self::with_letters).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    /// Number of rounds in a game.
    pub num_of_rounds: u32,
    /// Length of each round in seconds.
    pub length_of_round: u32,
    /// Whether duplicate answers still score.
    pub multi_scoring: bool,
    /// Number of category prompts per round.
    pub num_of_categories: u32,
    /// Letter sequence the rounds draw from (generated externally).
    #[serde(default)]
    pub letters: Vec<String>,
    /// Whether the letter rotates between categories within a round.
    pub letter_rotation: bool,
    /// Whether the "toggle all categories" control starts enabled.
    pub toggle_all_categories: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            num_of_rounds: 3,
            length_of_round: 120,
            multi_scoring: true,
            num_of_categories: 12,
            letters: Vec::new(),
            letter_rotation: false,
            toggle_all_categories: true,
        }
    }
}

impl GameSettings {
    /// Replace the letter sequence with an externally generated one.
    #[must_use]
    pub fn with_letters(mut self, letters: Vec<String>) -> Self {
        self.letters = letters;
        self
    }
}

/// A toggleable category descriptor shown in the lobby.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryToggle {
    /// Display name of the category.
    pub name: String,
    /// Whether the category is included in the next game.
    pub enabled: bool,
}

impl CategoryToggle {
    /// Create an enabled category toggle.
    pub fn enabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }
}

/// The lobby's category selection: generated defaults plus user-defined
/// custom entries. Persisted with the same contract as [`GameSettings`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategorySelection {
    /// Generated, toggleable category descriptors.
    #[serde(default)]
    pub default_categories: Vec<CategoryToggle>,
    /// User-defined category descriptors.
    #[serde(default)]
    pub custom_categories: Vec<CategoryToggle>,
}

// ── Messages ────────────────────────────────────────────────────────

/// Message types sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    /// Join a room (MUST be the first message; establishes room membership).
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        user_name: String,
        room_name: String,
    },
    /// Ask the server to start the game with the lobby's configuration.
    #[serde(rename_all = "camelCase")]
    StartGame {
        user_name: String,
        room_name: String,
        game_settings: GameSettings,
        categories: CategorySelection,
    },
    /// Submit a single changed answer for the current round.
    ///
    /// Carries only the delta — never the whole answer buffer.
    #[serde(rename_all = "camelCase")]
    SubmitAnswer {
        room_name: String,
        index: usize,
        value: String,
    },
    /// Cast a vote on another participant's answer.
    #[serde(rename_all = "camelCase")]
    SubmitVote { answer_id: String, value: i32 },
    /// Ask the server to advance to the next category during voting.
    ///
    /// The advance only takes effect once the server echoes a
    /// [`ServerMessage::StateChanged`].
    #[serde(rename_all = "camelCase")]
    NextCategory { room_name: String },
}

/// Message types sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// Room membership changed. The roster is replaced wholesale — there is
    /// no incremental add/remove merge. `users` and `room` default when
    /// absent; a frame without `game_state` carries no lifecycle information
    /// and leaves the current snapshot untouched.
    #[serde(rename_all = "camelCase")]
    RosterChanged {
        #[serde(default)]
        users: Vec<String>,
        #[serde(default)]
        room: String,
        #[serde(default)]
        game_state: Option<GameSnapshot>,
    },
    /// Countdown tick for the round in progress.
    TimerTick { seconds: u64 },
    /// The room's lifecycle changed; the payload is the full replacement
    /// snapshot and is adopted unconditionally.
    StateChanged(GameSnapshot),
}
