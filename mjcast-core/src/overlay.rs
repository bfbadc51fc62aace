//! Read-only view of the current round for the broadcast overlay.

use anyhow::Result;
use mjcast_engine::progression::next_table_sticks;
use mjcast_engine::seat;
use mjcast_engine::state::{phase, RoundPhase};
use mjcast_engine::types::{NextRoundType, NUM_PLAYERS};
use mjcast_engine::{Match, MatchRound, PlayerSlot, TileKey, Wind};
use serde::Serialize;

use crate::settings::MatchSettings;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerCard {
    pub slot: PlayerSlot,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portrait: Option<String>,
    pub color: String,
    pub score: i32,
    pub score_changes: Vec<i32>,
    pub seat_wind: Wind,
    pub is_east: bool,
    pub is_riichi: bool,
    pub is_revealed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySnapshot {
    pub match_code: String,
    pub round_code: String,
    pub counter_label: String,
    pub round_wind: Wind,
    pub extended_round_count: u32,
    /// Sticks visible on the table: carried ones plus this round's
    /// declarations, or what is left after the outcome once resolved.
    pub table_sticks: u32,
    pub doras: Vec<TileKey>,
    pub phase: RoundPhase,
    pub ended: bool,
    pub players: [PlayerCard; NUM_PLAYERS],
}

impl OverlaySnapshot {
    pub fn build(record: &Match, round: &MatchRound, settings: &MatchSettings) -> Result<Self> {
        let mut cards = Vec::with_capacity(NUM_PLAYERS);
        for slot in PlayerSlot::ALL {
            let player = record.player(slot);
            let result = round.result(slot);
            cards.push(PlayerCard {
                slot,
                name: player.name.clone(),
                title: player.title.clone(),
                portrait: player.portrait.clone(),
                color: player.display_color(slot).to_string(),
                score: result.after_score,
                score_changes: result.score_changes.clone(),
                seat_wind: seat::seat_wind_for_slot(slot, round.round_count)?,
                is_east: seat::is_east(slot, round.round_count)?,
                is_riichi: result.is_riichi,
                is_revealed: result.is_revealed,
            });
        }
        let players: [PlayerCard; NUM_PLAYERS] = cards
            .try_into()
            .map_err(|_| anyhow::anyhow!("expected {} player cards", NUM_PLAYERS))?;

        let phase = phase(round);
        let table_sticks = match phase {
            RoundPhase::Open => round.cumulated_thousands + round.riichi_count(),
            RoundPhase::Resolved => next_table_sticks(round),
        };
        Ok(Self {
            match_code: record.code.clone(),
            round_code: round.code.clone(),
            counter_label: settings.counter_label(round.round_count, round.extended_round_count),
            round_wind: seat::round_wind(round.round_count)?,
            extended_round_count: round.extended_round_count,
            table_sticks,
            doras: round.doras.clone(),
            phase,
            ended: round.next_round_type == NextRoundType::End,
            players,
        })
    }
}
