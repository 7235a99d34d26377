//! The room-level state machine.
//!
//! [`RoomState`] is the canonical view of "what is happening in this room
//! right now": identity, roster, the lifecycle snapshot pushed by the
//! server, the remaining-time projection, and the per-round answer buffer.
//!
//! All mutation funnels through the named `apply_*` / `record_*` operations
//! so the buffer-clear-on-transition invariant is enforced at a single call
//! site. The transport loop applies inbound events one at a time in arrival
//! order; no operation here blocks, polls, or awaits another.
//!
//! # Transition model
//!
//! ```text
//! InLobby (initial) → InRound → InVoting → InPostRound → InRound (next round)
//!                                                      ↘ InLobby (reset)
//! ```
//!
//! Transitions are driven exclusively by [`apply_state_change`] carrying a
//! full replacement snapshot. The server is trusted as sole authority: the
//! client never rejects a transition, it only runs the one side effect —
//! clearing the answer buffer whenever the adopted phase is not
//! [`GamePhase::InRound`].
//!
//! [`apply_state_change`]: RoomState::apply_state_change

use tracing::debug;

use crate::answers::AnswerBuffer;
use crate::protocol::{GamePhase, GameSnapshot, RoundCategory};
use crate::timer::format_clock;

/// Canonical client-side state for one room session.
#[derive(Debug, Clone)]
pub struct RoomState {
    /// Display name of the local player.
    user_name: String,
    /// Name of the room this session belongs to.
    room_name: String,
    /// Participant identifiers, replaced wholesale on every roster event.
    users: Vec<String>,
    /// Authoritative lifecycle snapshot, adopted from the server.
    snapshot: GameSnapshot,
    /// `"mm:ss"` projection of the latest timer tick.
    timer: String,
    /// In-progress answers for the current round.
    answers: AnswerBuffer,
}

impl RoomState {
    /// Create the initial state for a `(user, room)` pair: empty roster,
    /// lobby phase, blank timer, empty answer buffer.
    pub fn new(user_name: impl Into<String>, room_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            room_name: room_name.into(),
            users: Vec::new(),
            snapshot: GameSnapshot::default(),
            timer: String::new(),
            answers: AnswerBuffer::new(),
        }
    }

    // ── Inbound event application ───────────────────────────────────

    /// Replace the roster and room name wholesale and, when the frame
    /// carries a lifecycle snapshot, adopt it.
    ///
    /// Absent `users`/`room` fields arrive already defaulted (empty roster,
    /// empty room name). A frame without a snapshot is a pure membership
    /// update: the current phase, round, and answer buffer are untouched.
    /// When a snapshot is present it is adopted through
    /// [`apply_state_change`](Self::apply_state_change) so the answer-buffer
    /// invariant holds here too. Always succeeds.
    pub fn apply_roster_update(
        &mut self,
        users: Vec<String>,
        room: String,
        game_state: Option<GameSnapshot>,
    ) {
        debug!(room = %room, users = users.len(), "roster replaced");
        self.users = users;
        self.room_name = room;
        if let Some(snapshot) = game_state {
            self.apply_state_change(snapshot);
        }
    }

    /// Recompute the remaining-time display from a timer tick.
    ///
    /// Side effect only; never a state transition.
    pub fn apply_timer_tick(&mut self, seconds: u64) {
        self.timer = format_clock(seconds);
    }

    /// Adopt a full replacement lifecycle snapshot from the server.
    ///
    /// Unconditional: there is no local legality check. The one side effect
    /// is clearing the answer buffer, in the same logical step, whenever the
    /// new phase is not [`GamePhase::InRound`] — no intermediate state ever
    /// shows stale answers beside a new category set.
    ///
    /// Idempotent under duplicate delivery: re-applying an identical
    /// snapshot re-clears an already-empty buffer and re-adopts the same
    /// snapshot.
    pub fn apply_state_change(&mut self, snapshot: GameSnapshot) {
        if snapshot.state != GamePhase::InRound {
            self.answers.clear();
        }
        if snapshot.state != self.snapshot.state {
            debug!(from = ?self.snapshot.state, to = ?snapshot.state, round = snapshot.current_round, "phase changed");
        }
        self.snapshot = snapshot;
    }

    // ── Local actions ───────────────────────────────────────────────

    /// Record an in-progress answer at `index`.
    ///
    /// An empty buffer is first seeded from the current round's category
    /// list, then the single slot is overwritten. Callers forward only this
    /// delta to the server. Safe to call in any phase: an out-of-round write
    /// lands in a buffer the next legitimate transition discards.
    pub fn record_answer(&mut self, index: usize, value: &str) {
        if self.answers.is_empty() {
            let categories = self.snapshot.current_categories().to_vec();
            self.answers.seed_from(&categories);
        }
        self.answers.set(index, value);
    }

    /// Adopt a new `(user, room)` identity ahead of a fresh join handshake.
    ///
    /// Resets everything scoped to the previous room session.
    pub fn adopt_identity(&mut self, user_name: impl Into<String>, room_name: impl Into<String>) {
        self.user_name = user_name.into();
        self.room_name = room_name.into();
        self.users.clear();
        self.snapshot = GameSnapshot::default();
        self.timer.clear();
        self.answers.clear();
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// Display name of the local player.
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Name of the room this session belongs to.
    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    /// Current participant identifiers.
    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> GamePhase {
        self.snapshot.state
    }

    /// 0-based index of the current round.
    pub fn current_round(&self) -> usize {
        self.snapshot.current_round
    }

    /// Category prompts for the current round (empty outside a round).
    pub fn current_categories(&self) -> &[RoundCategory] {
        self.snapshot.current_categories()
    }

    /// The latest `"mm:ss"` timer display (empty before the first tick).
    pub fn timer(&self) -> &str {
        &self.timer
    }

    /// The in-progress answer buffer for the current round.
    pub fn answers(&self) -> &AnswerBuffer {
        &self.answers
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::protocol::RoundCategory;

    fn in_round_snapshot() -> GameSnapshot {
        GameSnapshot {
            state: GamePhase::InRound,
            current_round: 0,
            categories: vec![vec![
                RoundCategory::new("A fruit"),
                RoundCategory::new("A city"),
            ]],
        }
    }

    fn voting_snapshot() -> GameSnapshot {
        GameSnapshot {
            state: GamePhase::InVoting,
            current_round: 0,
            categories: vec![],
        }
    }

    #[test]
    fn initial_state_is_lobby() {
        let state = RoomState::new("alice", "room-1");
        assert_eq!(state.phase(), GamePhase::InLobby);
        assert_eq!(state.current_round(), 0);
        assert!(state.users().is_empty());
        assert!(state.answers().is_empty());
        assert_eq!(state.timer(), "");
    }

    #[test]
    fn roster_update_replaces_wholesale() {
        let mut state = RoomState::new("alice", "room-1");
        state.apply_roster_update(
            vec!["alice".into(), "bob".into()],
            "room-1".into(),
            Some(GameSnapshot::default()),
        );
        state.apply_roster_update(vec!["bob".into()], "room-1".into(), None);
        assert_eq!(state.users(), ["bob".to_string()]);
    }

    #[test]
    fn roster_update_with_absent_fields_defaults() {
        let mut state = RoomState::new("alice", "room-1");
        // serde has already substituted the defaults for absent fields.
        state.apply_roster_update(Vec::new(), "abc".into(), None);
        assert!(state.users().is_empty());
        assert_eq!(state.room_name(), "abc");
        assert_eq!(state.phase(), GamePhase::InLobby);
    }

    #[test]
    fn roster_update_without_snapshot_keeps_round_state() {
        let mut state = RoomState::new("alice", "room-1");
        state.apply_state_change(in_round_snapshot());
        state.record_answer(0, "apple");

        // A membership broadcast mid-round carries no lifecycle payload; it
        // must not reset the phase or wipe in-progress answers.
        state.apply_roster_update(
            vec!["alice".into(), "bob".into()],
            "room-1".into(),
            None,
        );
        assert_eq!(state.users().len(), 2);
        assert_eq!(state.phase(), GamePhase::InRound);
        assert_eq!(state.answers().get(0), Some("apple"));
    }

    #[test]
    fn roster_update_with_snapshot_adopts_it() {
        let mut state = RoomState::new("alice", "room-1");
        state.apply_state_change(in_round_snapshot());
        state.record_answer(0, "apple");

        state.apply_roster_update(
            vec!["alice".into()],
            "room-1".into(),
            Some(voting_snapshot()),
        );
        assert_eq!(state.phase(), GamePhase::InVoting);
        assert!(state.answers().is_empty());
    }

    #[test]
    fn timer_tick_is_a_pure_projection() {
        let mut state = RoomState::new("alice", "room-1");
        state.apply_timer_tick(125);
        assert_eq!(state.timer(), "02:05");
        assert_eq!(state.phase(), GamePhase::InLobby);
        state.apply_timer_tick(0);
        assert_eq!(state.timer(), "00:00");
    }

    #[test]
    fn leaving_in_round_clears_answers() {
        let mut state = RoomState::new("alice", "room-1");
        state.apply_state_change(in_round_snapshot());
        state.record_answer(0, "apple");
        state.record_answer(1, "amsterdam");
        assert_eq!(state.answers().len(), 2);

        // The voting payload carries no buffer field; the clear is a local
        // side effect of the transition itself.
        state.apply_state_change(voting_snapshot());
        assert!(state.answers().is_empty());
        assert_eq!(state.phase(), GamePhase::InVoting);
    }

    #[test]
    fn every_non_round_phase_clears_answers() {
        for phase in [
            GamePhase::InLobby,
            GamePhase::InVoting,
            GamePhase::InPostRound,
        ] {
            let mut state = RoomState::new("alice", "room-1");
            state.apply_state_change(in_round_snapshot());
            state.record_answer(0, "apple");

            state.apply_state_change(GameSnapshot {
                state: phase,
                ..GameSnapshot::default()
            });
            assert!(state.answers().is_empty(), "phase {phase:?} must clear");
        }
    }

    #[test]
    fn entering_in_round_preserves_answers() {
        let mut state = RoomState::new("alice", "room-1");
        state.apply_state_change(in_round_snapshot());
        state.record_answer(0, "apple");

        // A duplicate in-round snapshot (e.g. a re-delivered event) must not
        // wipe in-progress answers.
        state.apply_state_change(in_round_snapshot());
        assert_eq!(state.answers().get(0), Some("apple"));
    }

    #[test]
    fn duplicate_state_change_is_idempotent() {
        let mut state = RoomState::new("alice", "room-1");
        state.apply_state_change(in_round_snapshot());
        state.record_answer(0, "apple");

        state.apply_state_change(voting_snapshot());
        let once = state.clone();
        state.apply_state_change(voting_snapshot());

        assert_eq!(state.phase(), once.phase());
        assert_eq!(state.current_round(), once.current_round());
        assert_eq!(state.answers(), once.answers());
        assert!(state.answers().is_empty());
    }

    #[test]
    fn record_answer_seeds_from_current_round() {
        let mut state = RoomState::new("alice", "room-1");
        state.apply_state_change(in_round_snapshot());

        state.record_answer(1, "amsterdam");
        // Seeding sized the buffer to the round's two categories.
        assert_eq!(state.answers().len(), 2);
        assert_eq!(state.answers().get(0), Some(""));
        assert_eq!(state.answers().get(1), Some("amsterdam"));
    }

    #[test]
    fn record_answer_read_back_regardless_of_prior_content() {
        let mut state = RoomState::new("alice", "room-1");
        state.apply_state_change(in_round_snapshot());
        state.record_answer(0, "apple");
        state.record_answer(0, "apricot");
        assert_eq!(state.answers().get(0), Some("apricot"));
    }

    #[test]
    fn record_answer_out_of_phase_is_tolerated() {
        let mut state = RoomState::new("alice", "room-1");
        // Still in the lobby: no categories, yet the write must not error.
        state.record_answer(3, "early bird");
        assert_eq!(state.answers().get(3), Some("early bird"));

        // The next legitimate transition discards it.
        state.apply_state_change(voting_snapshot());
        assert!(state.answers().is_empty());
    }

    #[test]
    fn current_categories_out_of_range_is_empty() {
        let mut state = RoomState::new("alice", "room-1");
        state.apply_state_change(GameSnapshot {
            state: GamePhase::InRound,
            current_round: 7,
            categories: vec![vec![RoundCategory::new("A fruit")]],
        });
        assert!(state.current_categories().is_empty());
    }

    #[test]
    fn adopt_identity_resets_session_state() {
        let mut state = RoomState::new("alice", "room-1");
        state.apply_roster_update(
            vec!["alice".into()],
            "room-1".into(),
            Some(in_round_snapshot()),
        );
        state.record_answer(0, "apple");
        state.apply_timer_tick(30);

        state.adopt_identity("alice", "room-2");
        assert_eq!(state.room_name(), "room-2");
        assert!(state.users().is_empty());
        assert_eq!(state.phase(), GamePhase::InLobby);
        assert!(state.answers().is_empty());
        assert_eq!(state.timer(), "");
    }
}
