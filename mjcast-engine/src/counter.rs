//! Round counter label shown on the broadcast overlay.
//!
//! The round number is clamped to `max` before lookup so that an overlay
//! never renders a blank counter. A label that still cannot be resolved
//! degrades to the raw `round.extended` pair.

use serde::{Deserialize, Serialize};

use crate::types::Wind;

/// Number of labelled rounds (four winds, four hands each).
pub const ROUND_TABLE_LEN: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterLocale {
    #[default]
    English,
    Japanese,
}

fn round_label(round_count: u32, locale: CounterLocale) -> Option<String> {
    if !(1..=ROUND_TABLE_LEN).contains(&round_count) {
        return None;
    }
    let wind = Wind::from(((round_count - 1) / 4) as u8);
    let hand = (round_count - 1) % 4 + 1;
    Some(match locale {
        CounterLocale::English => format!("{} {}", wind.name(), hand),
        CounterLocale::Japanese => format!("{}{}局", wind.kanji(), hand),
    })
}

/// English label, e.g. `"East 3"` or `"South 1 +2 repeats"`.
pub fn format(round_count: u32, extended_round_count: u32, max: u32) -> String {
    format_with_locale(round_count, extended_round_count, max, CounterLocale::English)
}

pub fn format_with_locale(
    round_count: u32,
    extended_round_count: u32,
    max: u32,
    locale: CounterLocale,
) -> String {
    let clamped = round_count.min(max);
    let Some(label) = round_label(clamped, locale) else {
        log::warn!(
            "unable to label round_count={} (max={}), showing raw counter",
            round_count,
            max
        );
        return format!("{}.{}", round_count, extended_round_count);
    };

    if extended_round_count == 0 {
        return label;
    }
    match locale {
        CounterLocale::English => format!("{} +{} repeats", label, extended_round_count),
        CounterLocale::Japanese => format!("{}{}本場", label, extended_round_count),
    }
}
