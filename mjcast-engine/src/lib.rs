//! Round state machine and scoring engine for a broadcast four-player
//! riichi mahjong match.
//!
//! Everything here is a pure function of a round snapshot plus an operator
//! event. Persistence and rendering live outside this crate.

pub mod counter;
pub mod errors;
pub mod match_event;
pub mod progression;
pub mod rule;
pub mod seat;
pub mod state;
pub mod transfer;
pub mod types;

pub use errors::{ScoreError, ScoreResult};
pub use rule::MatchRule;
pub use state::{MatchRoundStateMachine, RoundCommand, RoundPhase};
pub use transfer::{WinEvent, WinKind, WinnerAward};
pub use types::{Match, MatchRound, Player, PlayerResult, PlayerSlot, TileKey, Wind};
