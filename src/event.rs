//! Consumer-facing events emitted by the client.
//!
//! [`LetterRushEvent`] is what the embedding application (typically the
//! rendering layer) receives on the channel returned from
//! [`LetterRushClient::start`](crate::client::LetterRushClient::start).
//! Events are derived from inbound [`ServerMessage`]s after they have been
//! applied to the client's room state, plus two synthetic lifecycle events
//! (`Connected`, `Disconnected`) produced by the transport loop itself.

use crate::protocol::{GamePhase, ServerMessage};
use crate::timer::format_clock;

/// Events delivered to the consumer of a Letter Rush client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LetterRushEvent {
    /// Synthetic: the transport loop started with a live connection.
    Connected,
    /// The room's roster was replaced. `users` and `room` mirror the
    /// server's wholesale-replacement payload.
    RosterChanged { users: Vec<String>, room: String },
    /// A countdown tick arrived; `display` is the ready-to-render `"mm:ss"`
    /// projection of the remaining seconds.
    TimerTick { display: String },
    /// The room's lifecycle phase changed (or was re-announced).
    PhaseChanged {
        phase: GamePhase,
        current_round: usize,
    },
    /// Synthetic: the transport closed. Always the last event delivered.
    Disconnected { reason: Option<String> },
}

impl From<ServerMessage> for LetterRushEvent {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::RosterChanged { users, room, .. } => {
                Self::RosterChanged { users, room }
            }
            ServerMessage::TimerTick { seconds } => Self::TimerTick {
                display: format_clock(seconds),
            },
            ServerMessage::StateChanged(snapshot) => Self::PhaseChanged {
                phase: snapshot.state,
                current_round: snapshot.current_round,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::GameSnapshot;

    #[test]
    fn timer_tick_carries_formatted_display() {
        let event = LetterRushEvent::from(ServerMessage::TimerTick { seconds: 125 });
        assert_eq!(
            event,
            LetterRushEvent::TimerTick {
                display: "02:05".into()
            }
        );
    }

    #[test]
    fn state_changed_maps_to_phase_changed() {
        let snapshot = GameSnapshot {
            state: GamePhase::InVoting,
            current_round: 1,
            categories: vec![],
        };
        let event = LetterRushEvent::from(ServerMessage::StateChanged(snapshot));
        assert_eq!(
            event,
            LetterRushEvent::PhaseChanged {
                phase: GamePhase::InVoting,
                current_round: 1
            }
        );
    }

    #[test]
    fn roster_changed_drops_the_snapshot() {
        let event = LetterRushEvent::from(ServerMessage::RosterChanged {
            users: vec!["alice".into()],
            room: "abc".into(),
            game_state: Some(GameSnapshot::default()),
        });
        assert_eq!(
            event,
            LetterRushEvent::RosterChanged {
                users: vec!["alice".into()],
                room: "abc".into()
            }
        );
    }
}
