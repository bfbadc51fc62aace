//! Decides what follows a resolved round: next round number, repeat count,
//! carried riichi sticks, and whether the match is over.

use serde::{Deserialize, Serialize};

use crate::errors::{ScoreError, ScoreResult};
use crate::rule::{MatchRule, RenchanPolicy};
use crate::seat::east_slot_for_round;
use crate::types::{MatchRound, NextRoundType, PlayerResultType, ResultType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub next_round_type: NextRoundType,
    pub next_round_count: u32,
    pub next_extended_round_count: u32,
    /// Riichi sticks on the table when the next round starts.
    pub next_cumulated_thousands: u32,
}

impl Progression {
    pub fn is_game_ended(&self) -> bool {
        self.next_round_type == NextRoundType::End
    }
}

/// Whether the dealer keeps the seat after `round` under `policy`.
pub fn is_renchan(round: &MatchRound, policy: RenchanPolicy) -> ScoreResult<bool> {
    let east = round.result(east_slot_for_round(round.round_count)?);
    let won_flag = east.kind == PlayerResultType::Win;
    Ok(match policy {
        RenchanPolicy::WinFlag => won_flag,
        RenchanPolicy::DealerTenpai => {
            won_flag || (round.result_type == ResultType::Exhausted && east.is_tenpai)
        }
        RenchanPolicy::AgariOnly => won_flag && round.result_type == ResultType::Win,
    })
}

/// Riichi sticks the round following `round` starts with. A win pays out
/// the table; any other outcome adds this round's deposits to it.
pub fn next_table_sticks(round: &MatchRound) -> u32 {
    match round.result_type {
        ResultType::Win => 0,
        ResultType::Hotfix => round.cumulated_thousands,
        ResultType::Exhausted | ResultType::Unknown => {
            round.cumulated_thousands + round.riichi_count()
        }
    }
}

pub fn resolve(round: &MatchRound, rule: &MatchRule) -> ScoreResult<Progression> {
    match round.result_type {
        ResultType::Unknown => {
            return Err(ScoreError::contract(format!(
                "round {} has no recorded outcome",
                round.code
            )))
        }
        ResultType::Hotfix => {
            return Err(ScoreError::contract(format!(
                "round {} is a manual correction and does not progress",
                round.code
            )))
        }
        ResultType::Win | ResultType::Exhausted => {}
    }

    let renchan = is_renchan(round, rule.renchan_policy)?;
    let bankrupt = rule.ends_on_bankruptcy && round.player_results.iter().any(|r| r.after_score < 0);
    let is_game_ended = bankrupt || (!renchan && round.round_count >= rule.end_round_count());

    let next_round_type = if is_game_ended {
        NextRoundType::End
    } else if renchan {
        NextRoundType::Extended
    } else {
        NextRoundType::Normal
    };

    let (next_round_count, next_extended_round_count) = match next_round_type {
        NextRoundType::Normal => (round.round_count + 1, 0),
        NextRoundType::Extended => (round.round_count, round.extended_round_count + 1),
        _ => (round.round_count, round.extended_round_count),
    };

    Ok(Progression {
        next_round_type,
        next_round_count,
        next_extended_round_count,
        next_cumulated_thousands: next_table_sticks(round),
    })
}
