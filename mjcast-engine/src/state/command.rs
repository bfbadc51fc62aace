use serde::{Deserialize, Serialize};

use super::MatchRoundStateMachine;
use crate::errors::ScoreResult;
use crate::match_event::MatchEvent;
use crate::transfer::WinEvent;
use crate::types::{MatchRound, PlayerSlot, TileKey, NUM_PLAYERS};

/// Operator command against the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RoundCommand {
    DeclareRiichi { slot: PlayerSlot },
    ToggleRevealed { slot: PlayerSlot },
    PushDora { tile: TileKey },
    ReplaceDora { index: usize, tile: TileKey },
    RemoveDora { index: usize },
    RecordWin { event: WinEvent },
    RecordExhaustedDraw { tenpai: [bool; NUM_PLAYERS] },
    ApplyHotfix { scores: [i32; NUM_PLAYERS] },
}

impl RoundCommand {
    /// Whether the command records the round's outcome.
    pub fn resolves_round(&self) -> bool {
        matches!(
            self,
            RoundCommand::RecordWin { .. }
                | RoundCommand::RecordExhaustedDraw { .. }
                | RoundCommand::ApplyHotfix { .. }
        )
    }
}

impl MatchRoundStateMachine {
    pub fn apply(&self, round: &MatchRound, command: &RoundCommand) -> ScoreResult<MatchRound> {
        match command {
            RoundCommand::DeclareRiichi { slot } => self.declare_riichi(round, *slot),
            RoundCommand::ToggleRevealed { slot } => self.toggle_revealed(round, *slot),
            RoundCommand::PushDora { tile } => self.push_dora(round, tile.clone()),
            RoundCommand::ReplaceDora { index, tile } => {
                self.replace_dora(round, *index, tile.clone())
            }
            RoundCommand::RemoveDora { index } => self.remove_dora(round, *index),
            RoundCommand::RecordWin { event } => self.record_win(round, event),
            RoundCommand::RecordExhaustedDraw { tenpai } => {
                self.record_exhausted_draw(round, *tenpai)
            }
            RoundCommand::ApplyHotfix { scores } => self.apply_hotfix(round, *scores),
        }
    }

    /// Applies `command` and describes the transition for subscribers.
    pub fn apply_with_event(
        &self,
        round: &MatchRound,
        command: &RoundCommand,
    ) -> ScoreResult<(MatchRound, MatchEvent)> {
        let next = self.apply(round, command)?;
        let event = match command {
            RoundCommand::DeclareRiichi { slot } => MatchEvent::RiichiDeclared { actor: *slot },
            RoundCommand::ToggleRevealed { slot } => MatchEvent::HandRevealed {
                actor: *slot,
                revealed: next.result(*slot).is_revealed,
            },
            RoundCommand::PushDora { .. }
            | RoundCommand::ReplaceDora { .. }
            | RoundCommand::RemoveDora { .. } => MatchEvent::DorasChanged {
                doras: next.doras.clone(),
            },
            RoundCommand::RecordWin { event } => MatchEvent::WinRecorded {
                winners: event.winners.iter().map(|w| w.slot).collect(),
                deltas: next.deltas(),
                next_round_type: next.next_round_type,
            },
            RoundCommand::RecordExhaustedDraw { tenpai } => MatchEvent::ExhaustedDraw {
                tenpai: *tenpai,
                deltas: next.deltas(),
                next_round_type: next.next_round_type,
            },
            RoundCommand::ApplyHotfix { .. } => MatchEvent::ScoresCorrected {
                scores: next.scores(),
            },
        };
        Ok((next, event))
    }
}
