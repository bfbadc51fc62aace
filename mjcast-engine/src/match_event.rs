//! Typed event feed describing each round transition.
//!
//! The state machine returns one event per applied command so that a
//! broadcast overlay can animate what changed without diffing snapshots.

use serde::{Deserialize, Serialize};

use crate::types::{NextRoundType, PlayerSlot, TileKey, NUM_PLAYERS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    /// A new round became current.
    RoundOpened {
        code: String,
        round_count: u32,
        extended_round_count: u32,
        cumulated_thousands: u32,
        scores: [i32; NUM_PLAYERS],
    },
    RiichiDeclared {
        actor: PlayerSlot,
    },
    HandRevealed {
        actor: PlayerSlot,
        revealed: bool,
    },
    DorasChanged {
        doras: Vec<TileKey>,
    },
    WinRecorded {
        winners: Vec<PlayerSlot>,
        deltas: [i32; NUM_PLAYERS],
        next_round_type: NextRoundType,
    },
    ExhaustedDraw {
        tenpai: [bool; NUM_PLAYERS],
        deltas: [i32; NUM_PLAYERS],
        next_round_type: NextRoundType,
    },
    ScoresCorrected {
        scores: [i32; NUM_PLAYERS],
    },
}

impl MatchEvent {
    /// Whether the event closes the match.
    pub fn ends_match(&self) -> bool {
        matches!(
            self,
            MatchEvent::WinRecorded {
                next_round_type: NextRoundType::End,
                ..
            } | MatchEvent::ExhaustedDraw {
                next_round_type: NextRoundType::End,
                ..
            }
        )
    }
}
