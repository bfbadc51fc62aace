//! Seeded random matches for overlay rehearsal and load testing.
//!
//! A rehearsal plays a whole match with operator commands drawn from a
//! `ChaCha8Rng`, so the same seed always yields the same history. Win
//! amounts are plausible table values, not scored hands.

use anyhow::Result;
use mjcast_engine::rule::MatchRule;
use mjcast_engine::seat::east_slot_for_round;
use mjcast_engine::types::{MatchRound, PlayerSlot, TileKey, NUM_PLAYERS};
use mjcast_engine::{MatchRoundStateMachine, RoundCommand, WinEvent, WinnerAward};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::session::MatchSession;
use crate::store::RecordStore;

/// Guard against a dealer streak that never ends.
pub const MAX_ROUNDS: usize = 200;

const RON_POINTS: [i32; 8] = [1000, 2000, 2600, 3900, 5200, 7700, 8000, 12000];
/// Per-payer self-draw amounts for a non-dealer winner (dealer pays double).
const TSUMO_PAYMENTS: [i32; 5] = [300, 500, 700, 1300, 2000];
const DORA_TILES: [&str; 6] = ["1m", "5p", "9s", "3z", "7m", "2p"];

fn random_slot(rng: &mut ChaCha8Rng) -> PlayerSlot {
    PlayerSlot::ALL[rng.random_range(0..NUM_PLAYERS)]
}

/// Commands an operator might issue while a round is still open.
pub fn random_round_setup(rng: &mut ChaCha8Rng) -> Vec<RoundCommand> {
    let mut commands = Vec::new();
    if let Ok(tile) = TileKey::new(DORA_TILES[rng.random_range(0..DORA_TILES.len())]) {
        commands.push(RoundCommand::PushDora { tile });
    }
    for slot in PlayerSlot::ALL {
        if rng.random_bool(0.15) {
            commands.push(RoundCommand::DeclareRiichi { slot });
        }
    }
    commands
}

/// A command that resolves `round`.
pub fn random_outcome(rng: &mut ChaCha8Rng, round: &MatchRound, rule: &MatchRule) -> RoundCommand {
    let roll = rng.random_range(0..100);
    if roll < 2 {
        let scores = round.scores();
        let from = random_slot(rng);
        let to = from.offset(rng.random_range(1..NUM_PLAYERS as u8));
        let mut fixed = scores;
        fixed[from.index()] -= 1000;
        fixed[to.index()] += 1000;
        return RoundCommand::ApplyHotfix { scores: fixed };
    }
    if roll < 20 {
        let tenpai = std::array::from_fn(|_| rng.random_bool(0.4));
        return RoundCommand::RecordExhaustedDraw { tenpai };
    }

    let winner = random_slot(rng);
    if roll < 60 {
        let east = east_slot_for_round(round.round_count).unwrap_or(PlayerSlot::ALL[0]);
        let base = TSUMO_PAYMENTS[rng.random_range(0..TSUMO_PAYMENTS.len())];
        let payments = std::array::from_fn(|i| {
            let payer = PlayerSlot::ALL[i];
            if payer == winner {
                0
            } else if winner == east || payer == east {
                base * 2
            } else {
                base
            }
        });
        return RoundCommand::RecordWin {
            event: WinEvent::tsumo(winner, payments),
        };
    }

    let discarder = winner.offset(rng.random_range(1..NUM_PLAYERS as u8));
    let points = RON_POINTS[rng.random_range(0..RON_POINTS.len())];
    let second = winner.offset(1);
    let event = if rule.allow_double_ron && second != discarder && rng.random_bool(0.05) {
        WinEvent::multi_ron(
            discarder,
            vec![
                WinnerAward {
                    slot: winner,
                    points,
                },
                WinnerAward {
                    slot: second,
                    points: RON_POINTS[0],
                },
            ],
        )
    } else {
        WinEvent::ron(discarder, winner, points)
    };
    RoundCommand::RecordWin { event }
}

/// Plays a match with the bare state machine and returns every round.
pub fn rehearse_match(seed: u64, match_code: &str, rule: MatchRule) -> Result<Vec<MatchRound>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let machine = MatchRoundStateMachine::new(rule);
    let mut rounds = Vec::new();
    let mut round = machine.open_first_round(match_code);

    loop {
        for command in random_round_setup(&mut rng) {
            round = machine.apply(&round, &command)?;
        }
        let outcome = random_outcome(&mut rng, &round, &rule);
        round = machine.apply(&round, &outcome)?;
        let next = match machine.advance(&round) {
            Ok(next) => Some(next),
            Err(mjcast_engine::ScoreError::MatchEnded { .. }) => None,
            Err(e) => return Err(e.into()),
        };
        rounds.push(round);
        match next {
            Some(next) if rounds.len() < MAX_ROUNDS => round = next,
            _ => break,
        }
    }
    Ok(rounds)
}

/// Plays the rest of `session`'s match through its store. Returns the
/// number of rounds resolved.
pub fn rehearse_session<S: RecordStore>(session: &mut MatchSession<S>, seed: u64) -> Result<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let rule = session.match_record().rule;
    let mut resolved = 0;

    while resolved < MAX_ROUNDS {
        if session.current_round().is_resolved() {
            if session.is_ended() {
                break;
            }
            session.advance()?;
        }
        for command in random_round_setup(&mut rng) {
            session.apply(&command)?;
        }
        let outcome = random_outcome(&mut rng, session.current_round(), &rule);
        session.apply(&outcome)?;
        resolved += 1;
    }
    Ok(resolved)
}
