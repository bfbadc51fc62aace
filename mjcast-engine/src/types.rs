use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ScoreError, ScoreResult};
use crate::rule::MatchRule;

pub const NUM_PLAYERS: usize = 4;

/// Broadcast colors used for a slot when the player has none configured.
pub const DEFAULT_SLOT_COLORS: [&str; NUM_PLAYERS] = ["#6700cf", "#00b5de", "#e3277b", "#03ada5"];

/// A physical seat at the table. Stable for the whole match; winds rotate
/// over the slots from round to round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PlayerSlot(u8);

impl PlayerSlot {
    pub const ALL: [PlayerSlot; NUM_PLAYERS] =
        [PlayerSlot(0), PlayerSlot(1), PlayerSlot(2), PlayerSlot(3)];

    pub fn new(index: u8) -> Option<Self> {
        if (index as usize) < NUM_PLAYERS {
            Some(PlayerSlot(index))
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Slot `steps` seats further in turn order (counter-clockwise).
    pub fn offset(self, steps: u8) -> Self {
        PlayerSlot((self.0 + steps % NUM_PLAYERS as u8) % NUM_PLAYERS as u8)
    }
}

impl TryFrom<u8> for PlayerSlot {
    type Error = ScoreError;

    fn try_from(value: u8) -> ScoreResult<Self> {
        PlayerSlot::new(value)
            .ok_or_else(|| ScoreError::contract(format!("player slot {} out of range", value)))
    }
}

impl From<PlayerSlot> for u8 {
    fn from(slot: PlayerSlot) -> u8 {
        slot.0
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents wind directions in mahjong, used for player seats and round wind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wind {
    #[default]
    East = 0,
    South = 1,
    West = 2,
    North = 3,
}

impl From<u8> for Wind {
    fn from(val: u8) -> Self {
        match val % 4 {
            0 => Wind::East,
            1 => Wind::South,
            2 => Wind::West,
            3 => Wind::North,
            _ => unreachable!(),
        }
    }
}

impl Wind {
    pub fn name(&self) -> &'static str {
        match self {
            Wind::East => "East",
            Wind::South => "South",
            Wind::West => "West",
            Wind::North => "North",
        }
    }

    pub fn kanji(&self) -> &'static str {
        match self {
            Wind::East => "東",
            Wind::South => "南",
            Wind::West => "西",
            Wind::North => "北",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Configured color, or the slot's broadcast default.
    pub fn display_color(&self, slot: PlayerSlot) -> &str {
        self.color
            .as_deref()
            .unwrap_or(DEFAULT_SLOT_COLORS[slot.index()])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub code: String,
    pub players: [Player; NUM_PLAYERS],
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default)]
    pub remark: String,
    pub rule: MatchRule,
}

impl Match {
    pub fn player(&self, slot: PlayerSlot) -> &Player {
        &self.players[slot.index()]
    }

    /// Replaces one player's profile. The match keeps its identity.
    pub fn with_player(&self, slot: PlayerSlot, player: Player) -> Self {
        let mut next = self.clone();
        next.players[slot.index()] = player;
        next
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    #[default]
    Unknown,
    /// Win by discard (ron) or self-draw (tsumo).
    Win,
    Exhausted,
    /// Manual score correction.
    Hotfix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NextRoundType {
    #[default]
    Unknown,
    Normal,
    Extended,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerResultType {
    #[default]
    Neutral,
    Win,
    Lose,
}

impl PlayerResultType {
    pub fn from_amount(amount: i32) -> Self {
        match amount.signum() {
            1 => PlayerResultType::Win,
            -1 => PlayerResultType::Lose,
            _ => PlayerResultType::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerResult {
    pub before_score: i32,
    pub after_score: i32,
    #[serde(rename = "type")]
    pub kind: PlayerResultType,
    #[serde(default)]
    pub score_changes: Vec<i32>,
    #[serde(default)]
    pub prev_score_changes: Vec<i32>,
    #[serde(default)]
    pub is_riichi: bool,
    #[serde(default)]
    pub is_revealed: bool,
    #[serde(default)]
    pub is_tenpai: bool,
}

impl PlayerResult {
    pub fn opening(score: i32) -> Self {
        Self {
            before_score: score,
            after_score: score,
            ..Default::default()
        }
    }

    /// Fresh result for the round following `prev`.
    pub fn carried_from(prev: &PlayerResult) -> Self {
        Self {
            before_score: prev.after_score,
            after_score: prev.after_score,
            prev_score_changes: prev.score_changes.clone(),
            ..Default::default()
        }
    }

    pub fn delta(&self) -> i32 {
        self.after_score - self.before_score
    }

    /// Whether `after_score` agrees with `before_score` plus the listed changes.
    pub fn is_balanced(&self) -> bool {
        let listed: i64 = self.score_changes.iter().map(|&c| i64::from(c)).sum();
        i64::from(self.before_score) + listed == i64::from(self.after_score)
    }
}

/// Opaque dora indicator token, e.g. `"5m"` or `"0p"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TileKey(String);

impl TileKey {
    pub fn new(key: impl Into<String>) -> ScoreResult<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ScoreError::invalid_event("tile key must not be empty"));
        }
        Ok(TileKey(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TileKey {
    type Error = ScoreError;

    fn try_from(value: String) -> ScoreResult<Self> {
        TileKey::new(value)
    }
}

impl From<TileKey> for String {
    fn from(key: TileKey) -> String {
        key.0
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The mutable unit of play. Current while unresolved, history afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRound {
    pub match_code: String,
    pub code: String,
    pub round_count: u32,
    #[serde(default)]
    pub extended_round_count: u32,
    /// Riichi sticks on the table when this round started.
    #[serde(default)]
    pub cumulated_thousands: u32,
    #[serde(default)]
    pub result_type: ResultType,
    #[serde(default)]
    pub next_round_type: NextRoundType,
    pub player_results: [PlayerResult; NUM_PLAYERS],
    #[serde(default)]
    pub doras: Vec<TileKey>,
}

impl MatchRound {
    pub fn result(&self, slot: PlayerSlot) -> &PlayerResult {
        &self.player_results[slot.index()]
    }

    pub fn is_resolved(&self) -> bool {
        self.result_type != ResultType::Unknown
    }

    pub fn riichi_count(&self) -> u32 {
        self.player_results.iter().filter(|r| r.is_riichi).count() as u32
    }

    pub fn scores(&self) -> [i32; NUM_PLAYERS] {
        std::array::from_fn(|i| self.player_results[i].after_score)
    }

    pub fn deltas(&self) -> [i32; NUM_PLAYERS] {
        std::array::from_fn(|i| self.player_results[i].delta())
    }

    pub fn to_json(&self) -> ScoreResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decodes a stored round record. Missing slots or unknown enum tags are
    /// reported as `ScoreError::Serialization`.
    pub fn from_json(value: serde_json::Value) -> ScoreResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Round record code, e.g. `"K7QX2M-05-01"` for South 1 with one repeat.
pub fn round_code(match_code: &str, round_count: u32, extended_round_count: u32) -> String {
    format!("{}-{:02}-{:02}", match_code, round_count, extended_round_count)
}
