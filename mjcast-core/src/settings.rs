//! Match settings: ruleset plus display options for the counter.

use std::path::Path;

use anyhow::{Context, Result};
use mjcast_engine::counter::CounterLocale;
use mjcast_engine::rule::MatchRule;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    pub rule: MatchRule,
    pub locale: CounterLocale,
    /// Highest round number the counter labels; larger values reuse it.
    pub counter_max: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            rule: MatchRule::default_mleague(),
            locale: CounterLocale::Japanese,
            counter_max: 8,
        }
    }
}

impl MatchSettings {
    /// Settings for a given rule with the counter sized to the match length.
    pub fn for_rule(rule: MatchRule) -> Self {
        Self {
            rule,
            counter_max: rule.end_round_count(),
            ..Default::default()
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid match settings JSON")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn counter_label(&self, round_count: u32, extended_round_count: u32) -> String {
        mjcast_engine::counter::format_with_locale(
            round_count,
            extended_round_count,
            self.counter_max,
            self.locale,
        )
    }
}
