//! History table and final standings.

use mjcast_engine::rule::MatchRule;
use mjcast_engine::types::{MatchRound, PlayerSlot, ResultType, NUM_PLAYERS};
use serde::Serialize;

use crate::settings::MatchSettings;

/// One line of the broadcast history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "row", rename_all = "snake_case")]
pub enum HistoryRow {
    /// Scores at the start of the match.
    Opening { scores: [i32; NUM_PLAYERS] },
    /// A win or exhaustive draw, as per-slot score deltas.
    Round {
        code: String,
        label: String,
        result_type: ResultType,
        deltas: [i32; NUM_PLAYERS],
    },
    /// A manual correction, shown as the absolute scores it set.
    Correction {
        code: String,
        label: String,
        scores: [i32; NUM_PLAYERS],
    },
    /// Scores as they stand now.
    Closing { scores: [i32; NUM_PLAYERS] },
}

/// Rows for every resolved round between the opening and closing scores.
/// The open current round contributes nothing but the closing line.
pub fn history_table(rounds: &[MatchRound], settings: &MatchSettings) -> Vec<HistoryRow> {
    let (Some(first), Some(last)) = (rounds.first(), rounds.last()) else {
        return Vec::new();
    };

    let mut rows = Vec::with_capacity(rounds.len() + 2);
    rows.push(HistoryRow::Opening {
        scores: std::array::from_fn(|i| first.player_results[i].before_score),
    });
    for round in rounds {
        let label = settings.counter_label(round.round_count, round.extended_round_count);
        match round.result_type {
            ResultType::Unknown => {}
            ResultType::Hotfix => rows.push(HistoryRow::Correction {
                code: round.code.clone(),
                label,
                scores: round.scores(),
            }),
            ResultType::Win | ResultType::Exhausted => rows.push(HistoryRow::Round {
                code: round.code.clone(),
                label,
                result_type: round.result_type,
                deltas: round.deltas(),
            }),
        }
    }
    rows.push(HistoryRow::Closing {
        scores: last.scores(),
    });
    rows
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Standing {
    pub slot: PlayerSlot,
    pub score: i32,
    /// 1 = top. Tied players share the better rank.
    pub rank: u8,
    /// `(score - return_score) / 1000` plus the rank bonus. Tied players
    /// split the bonuses of the places they cover.
    pub points: f64,
}

/// Standings after `round`, in slot order.
pub fn standings(round: &MatchRound, rule: &MatchRule) -> [Standing; NUM_PLAYERS] {
    let scores = round.scores();
    std::array::from_fn(|i| {
        let score = scores[i];
        let above = scores.iter().filter(|&&s| s > score).count();
        let tied = scores.iter().filter(|&&s| s == score).count();
        let uma: i32 = rule.uma[above..above + tied].iter().sum();
        Standing {
            slot: PlayerSlot::ALL[i],
            score,
            rank: above as u8 + 1,
            points: f64::from(score - rule.return_score) / 1000.0
                + f64::from(uma) / tied as f64,
        }
    })
}
