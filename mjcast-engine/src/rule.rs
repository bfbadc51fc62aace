use serde::{Deserialize, Serialize};

/// Ruleset tag stored on the match record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleTemplate {
    Mleague,
    Tenhou,
    Custom,
}

/// How many wind rounds a match lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameLength {
    /// East round only (tonpuusen).
    East,
    /// East and South (hanchan).
    Half,
    /// All four winds.
    Full,
}

impl GameLength {
    /// Last regular round number. A dealer who does not keep the seat at or
    /// beyond this round closes the match.
    pub fn end_round_count(&self) -> u32 {
        match self {
            GameLength::East => 4,
            GameLength::Half => 8,
            GameLength::Full => 16,
        }
    }
}

/// Decides when the dealer keeps the seat for the next hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenchanPolicy {
    /// Dealer keeps the seat when its result is marked `Win`. A tenpai dealer
    /// in a draw with one to three tenpai hands is marked `Win`; an
    /// all-tenpai draw transfers nothing and therefore does not repeat.
    WinFlag,
    /// Like `WinFlag`, and additionally any draw where the dealer was tenpai.
    DealerTenpai,
    /// Only a hand the dealer actually won repeats.
    AgariOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchRule {
    pub template: RuleTemplate,
    pub length: GameLength,
    pub starting_score: i32,
    /// Score subtracted before rank bonuses when computing final points.
    pub return_score: i32,
    /// Rank bonus in thousands, indexed by final rank (0 = top).
    pub uma: [i32; 4],
    pub riichi_deposit: i32,
    pub renchan_policy: RenchanPolicy,
    pub allow_double_ron: bool,
    /// End the match as soon as a player drops below zero.
    pub ends_on_bankruptcy: bool,
}

impl Default for MatchRule {
    fn default() -> Self {
        Self::default_mleague()
    }
}

impl MatchRule {
    pub fn default_mleague() -> Self {
        Self {
            template: RuleTemplate::Mleague,
            length: GameLength::Half,
            starting_score: 25000,
            return_score: 30000,
            uma: [50, 10, -10, -30],
            riichi_deposit: 1000,
            renchan_policy: RenchanPolicy::WinFlag,
            allow_double_ron: true,
            ends_on_bankruptcy: false,
        }
    }

    pub fn default_tenhou() -> Self {
        Self {
            template: RuleTemplate::Tenhou,
            length: GameLength::Half,
            starting_score: 25000,
            return_score: 30000,
            uma: [40, 10, -10, -20],
            riichi_deposit: 1000,
            renchan_policy: RenchanPolicy::DealerTenpai,
            allow_double_ron: true,
            ends_on_bankruptcy: true,
        }
    }

    /// East-only variant of the M-League rule.
    pub fn default_tonpuu() -> Self {
        Self {
            length: GameLength::East,
            ..Self::default_mleague()
        }
    }

    pub fn end_round_count(&self) -> u32 {
        self.length.end_round_count()
    }
}
