//! Score transfer for win and exhaustive-draw outcomes.
//!
//! Both computations take the current round's results and return a new set;
//! the input is never touched. Win amounts come from the operator, the
//! engine only applies them. Each slot's `score_changes` lists the riichi
//! deposit first, then the base transfer, then the table pot for the slot
//! that collects it.

use serde::{Deserialize, Serialize};

use crate::errors::{ScoreError, ScoreResult};
use crate::rule::MatchRule;
use crate::types::{PlayerResult, PlayerResultType, PlayerSlot, NUM_PLAYERS};

/// Points split between tenpai and noten hands at an exhaustive draw.
pub const TENPAI_POOL: i32 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerAward {
    pub slot: PlayerSlot,
    pub points: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinKind {
    /// Win on a discard; the discarder pays every winner.
    Ron { discarder: PlayerSlot },
    /// Self-drawn win; `payments[i]` is what slot `i` pays the winner.
    Tsumo { payments: [i32; NUM_PLAYERS] },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinEvent {
    pub winners: Vec<WinnerAward>,
    pub kind: WinKind,
}

impl WinEvent {
    pub fn ron(discarder: PlayerSlot, winner: PlayerSlot, points: i32) -> Self {
        Self {
            winners: vec![WinnerAward {
                slot: winner,
                points,
            }],
            kind: WinKind::Ron { discarder },
        }
    }

    /// Several players winning on the same discard.
    pub fn multi_ron(discarder: PlayerSlot, winners: Vec<WinnerAward>) -> Self {
        Self {
            winners,
            kind: WinKind::Ron { discarder },
        }
    }

    /// The winner's amount is the saturated sum of `payments`; an
    /// overflowing sum is rejected when the event is resolved.
    pub fn tsumo(winner: PlayerSlot, payments: [i32; NUM_PLAYERS]) -> Self {
        let points = payments.iter().fold(0i32, |acc, &p| acc.saturating_add(p));
        Self {
            winners: vec![WinnerAward {
                slot: winner,
                points,
            }],
            kind: WinKind::Tsumo { payments },
        }
    }

    pub fn is_winner(&self, slot: PlayerSlot) -> bool {
        self.winners.iter().any(|w| w.slot == slot)
    }

    fn validate(&self, rule: &MatchRule) -> ScoreResult<()> {
        if self.winners.is_empty() {
            return Err(ScoreError::invalid_event("win needs at least one winner"));
        }
        for (i, w) in self.winners.iter().enumerate() {
            if w.points <= 0 {
                return Err(ScoreError::invalid_event(format!(
                    "winner {} must receive a positive amount, got {}",
                    w.slot, w.points
                )));
            }
            if self.winners[..i].iter().any(|o| o.slot == w.slot) {
                return Err(ScoreError::invalid_event(format!(
                    "slot {} listed twice as winner",
                    w.slot
                )));
            }
        }

        match self.kind {
            WinKind::Ron { discarder } => {
                if self.is_winner(discarder) {
                    return Err(ScoreError::invalid_event(format!(
                        "discarder {} cannot win on their own discard",
                        discarder
                    )));
                }
                if self.winners.len() > 1 && !rule.allow_double_ron {
                    return Err(ScoreError::invalid_event(
                        "multiple ron winners are not allowed by this rule",
                    ));
                }
            }
            WinKind::Tsumo { payments } => {
                let [winner] = self.winners.as_slice() else {
                    return Err(ScoreError::invalid_event(
                        "self-draw must have exactly one winner",
                    ));
                };
                if payments[winner.slot.index()] != 0 {
                    return Err(ScoreError::invalid_event("winner cannot pay themselves"));
                }
                if payments.iter().any(|&p| p < 0) {
                    return Err(ScoreError::invalid_event("self-draw payments must be >= 0"));
                }
                let paid = checked_total(payments)
                    .ok_or_else(|| ScoreError::invalid_event("self-draw payments overflow"))?;
                if paid != winner.points {
                    return Err(ScoreError::invalid_event(format!(
                        "payments sum to {} but winner receives {}",
                        paid, winner.points
                    )));
                }
            }
        }
        Ok(())
    }

    /// Signed base transfer per slot, before deposits and pot.
    fn base_amounts(&self) -> ScoreResult<[i32; NUM_PLAYERS]> {
        let overflow = || ScoreError::invalid_event("win amounts overflow");
        let mut base = [0i32; NUM_PLAYERS];
        for w in &self.winners {
            base[w.slot.index()] = w.points;
        }
        match self.kind {
            WinKind::Ron { discarder } => {
                let total = checked_total(self.winners.iter().map(|w| w.points))
                    .ok_or_else(overflow)?;
                base[discarder.index()] = total.checked_neg().ok_or_else(overflow)?;
            }
            WinKind::Tsumo { payments } => {
                for (amount, paid) in base.iter_mut().zip(payments) {
                    *amount = amount.checked_sub(paid).ok_or_else(overflow)?;
                }
            }
        }
        Ok(base)
    }

    /// Slot that collects the table pot: the only winner, or for a multiple
    /// ron the first winner in turn order after the discarder.
    pub fn pot_receiver(&self) -> Option<PlayerSlot> {
        match (self.kind, self.winners.as_slice()) {
            (_, [only]) => Some(only.slot),
            (WinKind::Ron { discarder }, _) => (1..NUM_PLAYERS as u8)
                .map(|step| discarder.offset(step))
                .find(|&s| self.is_winner(s)),
            (WinKind::Tsumo { .. }, _) => None,
        }
    }
}

/// Sum that reports `None` instead of wrapping.
fn checked_total(amounts: impl IntoIterator<Item = i32>) -> Option<i32> {
    amounts
        .into_iter()
        .try_fold(0i32, |acc, amount| acc.checked_add(amount))
}

fn build_results(
    results: &[PlayerResult; NUM_PLAYERS],
    base: [i32; NUM_PLAYERS],
    bonus: [i32; NUM_PLAYERS],
    tenpai: [bool; NUM_PLAYERS],
    rule: &MatchRule,
) -> ScoreResult<[PlayerResult; NUM_PLAYERS]> {
    let mut next = results.clone();
    for (i, result) in next.iter_mut().enumerate() {
        let mut changes = Vec::with_capacity(3);
        if result.is_riichi {
            changes.push(-rule.riichi_deposit);
        }
        if base[i] != 0 {
            changes.push(base[i]);
        }
        if bonus[i] != 0 {
            changes.push(bonus[i]);
        }
        result.after_score = checked_total(changes.iter().copied())
            .and_then(|delta| result.before_score.checked_add(delta))
            .ok_or_else(|| {
                ScoreError::invalid_event(format!(
                    "score of slot {} overflows after {:?}",
                    PlayerSlot::ALL[i],
                    changes
                ))
            })?;
        result.kind = PlayerResultType::from_amount(base[i]);
        result.score_changes = changes;
        result.is_tenpai = tenpai[i];
    }
    Ok(next)
}

/// Applies an operator-entered win. `table_sticks` is the number of riichi
/// sticks carried onto the table from earlier rounds; together with this
/// round's deposits they go to the pot receiver.
pub fn resolve_win(
    results: &[PlayerResult; NUM_PLAYERS],
    table_sticks: u32,
    event: &WinEvent,
    rule: &MatchRule,
) -> ScoreResult<[PlayerResult; NUM_PLAYERS]> {
    event.validate(rule)?;

    let base = event.base_amounts()?;
    let riichi_count = results.iter().filter(|r| r.is_riichi).count() as u32;
    let pot = table_sticks
        .checked_add(riichi_count)
        .and_then(|sticks| i32::try_from(sticks).ok())
        .and_then(|sticks| sticks.checked_mul(rule.riichi_deposit))
        .ok_or_else(|| {
            ScoreError::invalid_event(format!("table pot of {} sticks overflows", table_sticks))
        })?;

    let mut bonus = [0i32; NUM_PLAYERS];
    if let Some(receiver) = event.pot_receiver() {
        bonus[receiver.index()] = pot;
    }

    build_results(results, base, bonus, [false; NUM_PLAYERS], rule)
}

/// Base transfer at an exhaustive draw for each slot given tenpai toggles.
pub fn tenpai_payments(tenpai: &[bool; NUM_PLAYERS]) -> [i32; NUM_PLAYERS] {
    let num_tp = tenpai.iter().filter(|&&t| t).count();
    if num_tp == 0 || num_tp == NUM_PLAYERS {
        return [0; NUM_PLAYERS];
    }
    let pk = TENPAI_POOL / num_tp as i32;
    let pn = TENPAI_POOL / (NUM_PLAYERS - num_tp) as i32;
    std::array::from_fn(|i| if tenpai[i] { pk } else { -pn })
}

/// Applies an exhaustive draw. Riichi deposits are charged and stay on the
/// table.
pub fn resolve_exhausted_draw(
    results: &[PlayerResult; NUM_PLAYERS],
    tenpai: [bool; NUM_PLAYERS],
    rule: &MatchRule,
) -> ScoreResult<[PlayerResult; NUM_PLAYERS]> {
    build_results(
        results,
        tenpai_payments(&tenpai),
        [0; NUM_PLAYERS],
        tenpai,
        rule,
    )
}
