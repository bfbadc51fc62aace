//! Property-based invariant tests for the scoring engine.
//!
//! Uses proptest to generate seeds and rule variants, plays full rehearsal
//! matches and verifies bookkeeping invariants at every round.

use mjcast_core::audit::audit_history;
use mjcast_core::history::standings;
use mjcast_core::rehearsal::{rehearse_match, MAX_ROUNDS};
use mjcast_engine::counter::{self, CounterLocale};
use mjcast_engine::progression::next_table_sticks;
use mjcast_engine::rule::{GameLength, MatchRule, RenchanPolicy};
use mjcast_engine::transfer::tenpai_payments;
use mjcast_engine::types::{NextRoundType, PlayerSlot};
use mjcast_engine::{
    MatchRound, MatchRoundStateMachine, ScoreError, ScoreResult, WinEvent, WinKind, WinnerAward,
};
use proptest::prelude::*;

fn rule_strategy() -> impl Strategy<Value = MatchRule> {
    (
        prop_oneof![
            Just(MatchRule::default_mleague()),
            Just(MatchRule::default_tenhou()),
            Just(MatchRule::default_tonpuu()),
        ],
        prop_oneof![
            Just(RenchanPolicy::WinFlag),
            Just(RenchanPolicy::DealerTenpai),
            Just(RenchanPolicy::AgariOnly),
        ],
        prop_oneof![Just(GameLength::East), Just(GameLength::Half), Just(GameLength::Full)],
        any::<bool>(),
    )
        .prop_map(|(base, renchan_policy, length, allow_double_ron)| MatchRule {
            renchan_policy,
            length,
            allow_double_ron,
            ..base
        })
}

// ---------------------------------------------------------------------------
// Full matches
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Points are conserved, rounds chain, and every match terminates.
    #[test]
    fn match_invariants_hold(seed in 0u64..1_000_000, rule in rule_strategy()) {
        let rounds = rehearse_match(seed, "PROPTS", rule).unwrap();
        let total = rule.starting_score * 4;

        for round in &rounds {
            // Everything on the table or in hands adds back up to the start.
            let in_hands: i32 = round.scores().iter().sum();
            let on_table = rule.riichi_deposit * next_table_sticks(round) as i32;
            prop_assert_eq!(in_hands + on_table, total,
                "seed {}: round {} leaks points", seed, round.code);
            prop_assert!(round.player_results.iter().all(|r| r.is_balanced()));
        }
        for pair in rounds.windows(2) {
            for s in PlayerSlot::ALL {
                prop_assert_eq!(pair[0].result(s).after_score, pair[1].result(s).before_score);
            }
        }

        let last = rounds.last().unwrap();
        prop_assert!(last.next_round_type == NextRoundType::End || rounds.len() == MAX_ROUNDS,
            "seed {}: match neither ended nor hit the round limit", seed);
        prop_assert!(audit_history(&rounds, &rule).is_empty());
    }

    /// A match never ends before its last regular round unless someone busts.
    #[test]
    fn no_early_end(seed in 0u64..100_000, rule in rule_strategy()) {
        let rounds = rehearse_match(seed, "PROPTS", rule).unwrap();
        let last = rounds.last().unwrap();
        if last.next_round_type == NextRoundType::End {
            let bust = last.player_results.iter().any(|r| r.after_score < 0);
            prop_assert!(last.round_count >= rule.end_round_count()
                || (rule.ends_on_bankruptcy && bust));
        }
    }
}

// ---------------------------------------------------------------------------
// Single-round properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn tenpai_payments_balance(tenpai in any::<[bool; 4]>()) {
        let sum: i32 = tenpai_payments(&tenpai).iter().sum();
        prop_assert_eq!(sum, 0);
    }

    #[test]
    fn draw_conserves_points(
        tenpai in any::<[bool; 4]>(),
        riichi in any::<[bool; 4]>(),
        carried in 0u32..5,
    ) {
        let m = MatchRoundStateMachine::default();
        let mut round = m.open_first_round("PROPTS");
        round.cumulated_thousands = carried;
        for s in PlayerSlot::ALL {
            if riichi[s.index()] {
                round = m.declare_riichi(&round, s).unwrap();
            }
        }
        let resolved = m.record_exhausted_draw(&round, tenpai).unwrap();
        let moved: i32 = resolved.deltas().iter().sum();
        let table = next_table_sticks(&resolved) as i32 - carried as i32;
        prop_assert_eq!(moved + 1000 * table, 0);
    }

    #[test]
    fn counter_always_renders(
        round in 0u32..40,
        ext in 0u32..10,
        max in 0u32..20,
        japanese in any::<bool>(),
    ) {
        let locale = if japanese { CounterLocale::Japanese } else { CounterLocale::English };
        let label = counter::format_with_locale(round, ext, max, locale);
        prop_assert!(!label.is_empty());
    }

    #[test]
    fn standings_points_sum_to_zero(a in 0i32..60, b in 0i32..60, c in 0i32..60) {
        // Scores in hundreds, last seat takes the remainder of 100000.
        let scores = [a * 500, b * 500, c * 500, 100_000 - (a + b + c) * 500];
        let m = MatchRoundStateMachine::default();
        let round = m.apply_hotfix(&m.open_first_round("PROPTS"), scores).unwrap();
        let table = standings(&round, &MatchRule::default_mleague());
        let total: f64 = table.iter().map(|s| s.points).sum();
        prop_assert!(total.abs() < 1e-9, "points sum to {}", total);
    }
}

// ---------------------------------------------------------------------------
// Operator amounts at the edges of i32
// ---------------------------------------------------------------------------

fn accepted_or_invalid(result: &ScoreResult<MatchRound>) -> bool {
    matches!(result, Ok(_) | Err(ScoreError::InvalidEvent { .. }))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn extreme_amounts_never_panic(
        points in any::<i32>(),
        second in any::<i32>(),
        payments in any::<[i32; 4]>(),
        scores in any::<[i32; 4]>(),
        riichi in any::<[bool; 4]>(),
    ) {
        let m = MatchRoundStateMachine::default();
        let mut open = m.open_first_round("PROPTS");
        for s in PlayerSlot::ALL {
            if riichi[s.index()] {
                open = m.declare_riichi(&open, s).unwrap();
            }
        }

        let hotfixed = m.apply_hotfix(&open, scores);
        prop_assert!(accepted_or_invalid(&hotfixed));

        // A corrected round replays with the corrected scores as its start.
        let mut rounds = vec![open];
        if let Ok(fixed) = hotfixed {
            rounds.push(m.advance(&fixed).unwrap());
        }

        let s = PlayerSlot::ALL;
        let events = [
            WinEvent::ron(s[3], s[0], points),
            WinEvent::multi_ron(
                s[2],
                vec![
                    WinnerAward { slot: s[0], points },
                    WinnerAward { slot: s[1], points: second },
                ],
            ),
            WinEvent::tsumo(s[1], [payments[0], 0, payments[2], payments[3]]),
            WinEvent {
                winners: vec![WinnerAward { slot: s[1], points }],
                kind: WinKind::Tsumo { payments },
            },
        ];
        for round in &rounds {
            for event in &events {
                let result = m.record_win(round, event);
                prop_assert!(accepted_or_invalid(&result), "{:?} -> {:?}", event, result);
            }
            let drawn = m.record_exhausted_draw(round, riichi);
            prop_assert!(accepted_or_invalid(&drawn));
        }
    }
}
