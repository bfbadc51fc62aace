//! Seat-wind assignment for a round number.
//!
//! Round numbers start at 1 and encode both the round wind and the hand
//! number: 1-4 are East 1-4, 5-8 South 1-4 and so on. Slot 0 deals East 1
//! and the deal passes to the next slot with every new round number.
//! Extended rounds repeat the assignment of their round number.

use crate::errors::{ScoreError, ScoreResult};
use crate::types::{PlayerSlot, Wind, NUM_PLAYERS};

fn check_round(round_count: u32) -> ScoreResult<u32> {
    if round_count < 1 {
        return Err(ScoreError::contract(format!(
            "round count must be at least 1, got {}",
            round_count
        )));
    }
    Ok(round_count - 1)
}

/// Slot that sits East (deals) in the given round.
pub fn east_slot_for_round(round_count: u32) -> ScoreResult<PlayerSlot> {
    let idx = check_round(round_count)?;
    Ok(PlayerSlot::ALL[(idx as usize) % NUM_PLAYERS])
}

/// Seat wind of `slot` in the given round.
pub fn seat_wind_for_slot(slot: PlayerSlot, round_count: u32) -> ScoreResult<Wind> {
    let east = east_slot_for_round(round_count)?;
    let np = NUM_PLAYERS as u8;
    let offset = (u8::from(slot) + np - u8::from(east)) % np;
    Ok(Wind::from(offset))
}

pub fn is_east(slot: PlayerSlot, round_count: u32) -> ScoreResult<bool> {
    Ok(seat_wind_for_slot(slot, round_count)? == Wind::East)
}

/// Prevailing wind of the round (East for 1-4, South for 5-8, ...).
pub fn round_wind(round_count: u32) -> ScoreResult<Wind> {
    let idx = check_round(round_count)?;
    Ok(Wind::from(((idx / NUM_PLAYERS as u32) % 4) as u8))
}

/// Hand number within the round wind, 1 to 4.
pub fn hand_number(round_count: u32) -> ScoreResult<u32> {
    let idx = check_round(round_count)?;
    Ok(idx % NUM_PLAYERS as u32 + 1)
}
