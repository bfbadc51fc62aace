//! Round lifecycle: Open -> Resolved -> superseded by the next round.
//!
//! `MatchRoundStateMachine` holds only the ruleset. Every operation takes a
//! round snapshot by reference and returns a new snapshot, so the machine can
//! be shared across threads and called on independent snapshots at once.

use serde::{Deserialize, Serialize};

use crate::errors::{ScoreError, ScoreResult};
use crate::match_event::MatchEvent;
use crate::progression;
use crate::rule::MatchRule;
use crate::transfer::{self, WinEvent};
use crate::types::{
    round_code, MatchRound, NextRoundType, PlayerResult, PlayerResultType, PlayerSlot, ResultType,
    TileKey, NUM_PLAYERS,
};

pub mod command;
pub use command::RoundCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Outcome not recorded yet; flags and doras may change.
    Open,
    /// Outcome recorded; waiting for `advance`.
    Resolved,
}

pub fn phase(round: &MatchRound) -> RoundPhase {
    if round.is_resolved() {
        RoundPhase::Resolved
    } else {
        RoundPhase::Open
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchRoundStateMachine {
    rule: MatchRule,
}

impl MatchRoundStateMachine {
    pub fn new(rule: MatchRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> &MatchRule {
        &self.rule
    }

    fn ensure_open(round: &MatchRound) -> ScoreResult<()> {
        if round.round_count < 1 {
            return Err(ScoreError::contract(format!(
                "round {} has round count 0",
                round.code
            )));
        }
        if round.is_resolved() {
            return Err(ScoreError::contract(format!(
                "round {} is already resolved as {:?}",
                round.code, round.result_type
            )));
        }
        Ok(())
    }

    /// East 1 of a fresh match, every slot at the starting score.
    pub fn open_first_round(&self, match_code: &str) -> MatchRound {
        MatchRound {
            match_code: match_code.to_string(),
            code: round_code(match_code, 1, 0),
            round_count: 1,
            extended_round_count: 0,
            cumulated_thousands: 0,
            result_type: ResultType::Unknown,
            next_round_type: NextRoundType::Unknown,
            player_results: std::array::from_fn(|_| {
                PlayerResult::opening(self.rule.starting_score)
            }),
            doras: Vec::new(),
        }
    }

    pub fn record_win(&self, round: &MatchRound, event: &WinEvent) -> ScoreResult<MatchRound> {
        Self::ensure_open(round)?;
        let mut next = round.clone();
        next.player_results = transfer::resolve_win(
            &round.player_results,
            round.cumulated_thousands,
            event,
            &self.rule,
        )?;
        next.result_type = ResultType::Win;
        next.next_round_type = progression::resolve(&next, &self.rule)?.next_round_type;
        log::debug!(
            "round {}: win by {:?}, deltas {:?}, next {:?}",
            next.code,
            event.winners.iter().map(|w| w.slot).collect::<Vec<_>>(),
            next.deltas(),
            next.next_round_type
        );
        Ok(next)
    }

    pub fn record_exhausted_draw(
        &self,
        round: &MatchRound,
        tenpai: [bool; NUM_PLAYERS],
    ) -> ScoreResult<MatchRound> {
        Self::ensure_open(round)?;
        let mut next = round.clone();
        next.player_results =
            transfer::resolve_exhausted_draw(&round.player_results, tenpai, &self.rule)?;
        next.result_type = ResultType::Exhausted;
        next.next_round_type = progression::resolve(&next, &self.rule)?.next_round_type;
        log::debug!(
            "round {}: exhaustive draw, tenpai {:?}, next {:?}",
            next.code,
            tenpai,
            next.next_round_type
        );
        Ok(next)
    }

    /// Manual correction to absolute scores. Skips score transfer and
    /// progression; `advance` afterwards replays the same hand.
    pub fn apply_hotfix(
        &self,
        round: &MatchRound,
        scores: [i32; NUM_PLAYERS],
    ) -> ScoreResult<MatchRound> {
        Self::ensure_open(round)?;
        let mut next = round.clone();
        for (result, &score) in next.player_results.iter_mut().zip(scores.iter()) {
            let change = score.checked_sub(result.before_score).ok_or_else(|| {
                ScoreError::invalid_event(format!(
                    "correction from {} to {} overflows",
                    result.before_score, score
                ))
            })?;
            result.score_changes = if change == 0 { Vec::new() } else { vec![change] };
            result.after_score = score;
            result.kind = PlayerResultType::Neutral;
        }
        next.result_type = ResultType::Hotfix;
        next.next_round_type = NextRoundType::Unknown;
        log::debug!("round {}: scores corrected to {:?}", next.code, scores);
        Ok(next)
    }

    /// Creates the next Open round from a resolved one.
    pub fn advance(&self, resolved: &MatchRound) -> ScoreResult<MatchRound> {
        let (round_count, extended_round_count) = match resolved.result_type {
            ResultType::Unknown => {
                return Err(ScoreError::contract(format!(
                    "cannot advance unresolved round {}",
                    resolved.code
                )))
            }
            ResultType::Hotfix => (resolved.round_count, resolved.extended_round_count),
            ResultType::Win | ResultType::Exhausted => {
                let progression = progression::resolve(resolved, &self.rule)?;
                if progression.is_game_ended() {
                    return Err(ScoreError::MatchEnded {
                        round_count: resolved.round_count,
                    });
                }
                (
                    progression.next_round_count,
                    progression.next_extended_round_count,
                )
            }
        };

        let next = MatchRound {
            match_code: resolved.match_code.clone(),
            code: round_code(&resolved.match_code, round_count, extended_round_count),
            round_count,
            extended_round_count,
            cumulated_thousands: progression::next_table_sticks(resolved),
            result_type: ResultType::Unknown,
            next_round_type: NextRoundType::Unknown,
            player_results: std::array::from_fn(|i| {
                PlayerResult::carried_from(&resolved.player_results[i])
            }),
            doras: Vec::new(),
        };
        log::debug!(
            "advance {} -> {} (table {})",
            resolved.code,
            next.code,
            next.cumulated_thousands
        );
        Ok(next)
    }

    /// Marks a player as riichi. A declaration cannot be withdrawn.
    pub fn declare_riichi(&self, round: &MatchRound, slot: PlayerSlot) -> ScoreResult<MatchRound> {
        Self::ensure_open(round)?;
        let mut next = round.clone();
        next.player_results[slot.index()].is_riichi = true;
        Ok(next)
    }

    pub fn toggle_revealed(&self, round: &MatchRound, slot: PlayerSlot) -> ScoreResult<MatchRound> {
        Self::ensure_open(round)?;
        let mut next = round.clone();
        let result = &mut next.player_results[slot.index()];
        result.is_revealed = !result.is_revealed;
        Ok(next)
    }

    pub fn push_dora(&self, round: &MatchRound, tile: TileKey) -> ScoreResult<MatchRound> {
        Self::ensure_open(round)?;
        let mut next = round.clone();
        next.doras.push(tile);
        Ok(next)
    }

    pub fn replace_dora(
        &self,
        round: &MatchRound,
        index: usize,
        tile: TileKey,
    ) -> ScoreResult<MatchRound> {
        Self::ensure_open(round)?;
        let mut next = round.clone();
        let slot = next.doras.get_mut(index).ok_or_else(|| {
            ScoreError::invalid_event(format!("no dora at index {}", index))
        })?;
        *slot = tile;
        Ok(next)
    }

    pub fn remove_dora(&self, round: &MatchRound, index: usize) -> ScoreResult<MatchRound> {
        Self::ensure_open(round)?;
        if index >= round.doras.len() {
            return Err(ScoreError::invalid_event(format!(
                "no dora at index {}",
                index
            )));
        }
        let mut next = round.clone();
        next.doras.remove(index);
        Ok(next)
    }

    /// `advance` together with the event announcing the new round.
    pub fn advance_with_event(&self, resolved: &MatchRound) -> ScoreResult<(MatchRound, MatchEvent)> {
        let next = self.advance(resolved)?;
        let event = MatchEvent::RoundOpened {
            code: next.code.clone(),
            round_count: next.round_count,
            extended_round_count: next.extended_round_count,
            cumulated_thousands: next.cumulated_thousands,
            scores: next.scores(),
        };
        Ok((next, event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(i: u8) -> PlayerSlot {
        PlayerSlot::new(i).unwrap()
    }

    fn machine() -> MatchRoundStateMachine {
        MatchRoundStateMachine::new(MatchRule::default())
    }

    #[test]
    fn first_round_is_open_east_one() {
        let round = machine().open_first_round("ABCDEF");
        assert_eq!(phase(&round), RoundPhase::Open);
        assert_eq!(round.code, "ABCDEF-01-00");
        assert_eq!(round.scores(), [25000; 4]);
    }

    #[test]
    fn dealer_ron_repeats_round() {
        let m = machine();
        let round = m.open_first_round("ABCDEF");
        let resolved = m
            .record_win(&round, &WinEvent::ron(slot(2), slot(0), 12000))
            .unwrap();
        assert_eq!(phase(&resolved), RoundPhase::Resolved);
        assert_eq!(resolved.next_round_type, NextRoundType::Extended);

        let next = m.advance(&resolved).unwrap();
        assert_eq!(next.round_count, 1);
        assert_eq!(next.extended_round_count, 1);
        assert_eq!(next.code, "ABCDEF-01-01");
        assert_eq!(next.result(slot(0)).before_score, 37000);
        assert_eq!(next.result(slot(2)).prev_score_changes, vec![-12000]);
        assert_eq!(phase(&next), RoundPhase::Open);
    }

    #[test]
    fn draw_keeps_deposits_on_table() {
        let m = machine();
        let round = m.open_first_round("ABCDEF");
        let round = m.declare_riichi(&round, slot(1)).unwrap();
        let resolved = m
            .record_exhausted_draw(&round, [false, true, false, false])
            .unwrap();
        assert_eq!(resolved.next_round_type, NextRoundType::Normal);
        let next = m.advance(&resolved).unwrap();
        assert_eq!(next.round_count, 2);
        assert_eq!(next.cumulated_thousands, 1);
        assert!(!next.result(slot(1)).is_riichi);
    }

    #[test]
    fn resolved_round_rejects_further_outcomes() {
        let m = machine();
        let resolved = m
            .record_exhausted_draw(&m.open_first_round("ABCDEF"), [false; 4])
            .unwrap();
        assert!(matches!(
            m.record_exhausted_draw(&resolved, [false; 4]),
            Err(ScoreError::ContractViolation { .. })
        ));
        assert!(m.declare_riichi(&resolved, slot(0)).is_err());
        assert!(m.push_dora(&resolved, TileKey::new("1m").unwrap()).is_err());
    }

    #[test]
    fn unresolved_round_cannot_advance() {
        let m = machine();
        let round = m.open_first_round("ABCDEF");
        assert!(matches!(
            m.advance(&round),
            Err(ScoreError::ContractViolation { .. })
        ));
    }

    #[test]
    fn hotfix_replays_same_hand() {
        let m = machine();
        let mut round = m.open_first_round("ABCDEF");
        round.cumulated_thousands = 2;
        let fixed = m
            .apply_hotfix(&round, [26000, 24000, 25000, 25000])
            .unwrap();
        assert_eq!(fixed.result_type, ResultType::Hotfix);
        assert_eq!(fixed.next_round_type, NextRoundType::Unknown);
        assert_eq!(fixed.result(slot(0)).score_changes, vec![1000]);
        assert!(fixed.result(slot(2)).score_changes.is_empty());
        assert!(fixed.player_results.iter().all(|r| r.is_balanced()));

        let next = m.advance(&fixed).unwrap();
        assert_eq!(next.code, round.code);
        assert_eq!(next.cumulated_thousands, 2);
        assert_eq!(next.result(slot(1)).before_score, 24000);
    }

    #[test]
    fn hotfix_rejects_overflowing_correction() {
        let m = machine();
        let round = m.open_first_round("ABCDEF");
        let err = m.apply_hotfix(&round, [i32::MIN, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, ScoreError::InvalidEvent { .. }));
        assert!(m.apply_hotfix(&round, [i32::MAX, 0, 0, 0]).is_ok());
    }

    #[test]
    fn ended_match_cannot_advance() {
        let m = machine();
        let mut round = m.open_first_round("ABCDEF");
        round.round_count = 8;
        let resolved = m
            .record_win(&round, &WinEvent::ron(slot(0), slot(1), 1000))
            .unwrap();
        assert_eq!(resolved.next_round_type, NextRoundType::End);
        assert_eq!(
            m.advance(&resolved),
            Err(ScoreError::MatchEnded { round_count: 8 })
        );
    }

    #[test]
    fn dora_editing() {
        let m = machine();
        let round = m.open_first_round("ABCDEF");
        let round = m.push_dora(&round, TileKey::new("3s").unwrap()).unwrap();
        let round = m.push_dora(&round, TileKey::new("7p").unwrap()).unwrap();
        let round = m.replace_dora(&round, 0, TileKey::new("4s").unwrap()).unwrap();
        assert_eq!(
            round.doras.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
            vec!["4s", "7p"]
        );
        let round = m.remove_dora(&round, 1).unwrap();
        assert_eq!(round.doras.len(), 1);
        assert!(matches!(
            m.remove_dora(&round, 5),
            Err(ScoreError::InvalidEvent { .. })
        ));
        assert!(m.replace_dora(&round, 3, TileKey::new("1z").unwrap()).is_err());
    }

    #[test]
    fn reveal_toggles_and_riichi_sticks() {
        let m = machine();
        let round = m.open_first_round("ABCDEF");
        let round = m.toggle_revealed(&round, slot(3)).unwrap();
        assert!(round.result(slot(3)).is_revealed);
        let round = m.toggle_revealed(&round, slot(3)).unwrap();
        assert!(!round.result(slot(3)).is_revealed);
        let round = m.declare_riichi(&round, slot(3)).unwrap();
        let round = m.declare_riichi(&round, slot(3)).unwrap();
        assert!(round.result(slot(3)).is_riichi);
        assert_eq!(round.riichi_count(), 1);
    }

    #[test]
    fn input_snapshot_is_untouched() {
        let m = machine();
        let round = m.declare_riichi(&m.open_first_round("ABCDEF"), slot(0)).unwrap();
        let before = round.clone();
        let _ = m
            .record_win(&round, &WinEvent::ron(slot(1), slot(0), 7700))
            .unwrap();
        assert_eq!(round, before);
    }
}
