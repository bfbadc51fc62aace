//! Consistency audit over stored match histories.
//!
//! Replays the bookkeeping rules against a sequence of round records and
//! reports every place where the records disagree with what the engine
//! would have produced. Many matches can be audited in parallel on a
//! dedicated rayon ThreadPool.

use mjcast_engine::progression::{self, next_table_sticks};
use mjcast_engine::rule::MatchRule;
use mjcast_engine::types::{MatchRound, NextRoundType, PlayerSlot, ResultType};
use rayon::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum AuditIssue {
    /// First round is not a fresh East 1 at the starting score.
    BadOpening { round: String },
    /// `after_score` does not equal `before_score` plus the listed changes.
    Unbalanced { round: String, slot: PlayerSlot },
    /// `before_score` differs from the previous round's `after_score`.
    ScoreGap {
        round: String,
        slot: PlayerSlot,
        expected: i32,
        found: i32,
    },
    /// `prev_score_changes` is not the previous round's `score_changes`.
    ChangesNotCarried { round: String, slot: PlayerSlot },
    /// Round or repeat number does not follow from the previous outcome.
    CounterMismatch {
        round: String,
        expected: (u32, u32),
        found: (u32, u32),
    },
    TableMismatch {
        round: String,
        expected: u32,
        found: u32,
    },
    /// Score changes plus sticks moved to or from the table do not cancel.
    PointsLeak { round: String, leaked: i32 },
    /// A round other than the last has no outcome.
    Unresolved { round: String },
    PlayedAfterEnd { round: String },
    /// The engine rejected the record outright.
    Rejected { round: String, message: String },
}

fn check_round(round: &MatchRound, rule: &MatchRule, issues: &mut Vec<AuditIssue>) {
    for slot in PlayerSlot::ALL {
        if !round.result(slot).is_balanced() {
            issues.push(AuditIssue::Unbalanced {
                round: round.code.clone(),
                slot,
            });
        }
    }

    if matches!(round.result_type, ResultType::Win | ResultType::Exhausted) {
        let moved: i32 = round.deltas().iter().sum();
        let table_delta = next_table_sticks(round) as i32 - round.cumulated_thousands as i32;
        let leaked = moved + rule.riichi_deposit * table_delta;
        if leaked != 0 {
            issues.push(AuditIssue::PointsLeak {
                round: round.code.clone(),
                leaked,
            });
        }
    }
}

fn check_transition(
    prev: &MatchRound,
    next: &MatchRound,
    rule: &MatchRule,
    issues: &mut Vec<AuditIssue>,
) {
    let code = || next.code.clone();

    for slot in PlayerSlot::ALL {
        let (before, after) = (prev.result(slot), next.result(slot));
        if after.before_score != before.after_score {
            issues.push(AuditIssue::ScoreGap {
                round: code(),
                slot,
                expected: before.after_score,
                found: after.before_score,
            });
        }
        if after.prev_score_changes != before.score_changes {
            issues.push(AuditIssue::ChangesNotCarried { round: code(), slot });
        }
    }

    let expected = match prev.result_type {
        ResultType::Unknown => {
            issues.push(AuditIssue::Unresolved { round: prev.code.clone() });
            return;
        }
        ResultType::Hotfix => (prev.round_count, prev.extended_round_count),
        ResultType::Win | ResultType::Exhausted => match progression::resolve(prev, rule) {
            Ok(p) if p.next_round_type == NextRoundType::End => {
                issues.push(AuditIssue::PlayedAfterEnd { round: code() });
                return;
            }
            Ok(p) => (p.next_round_count, p.next_extended_round_count),
            Err(e) => {
                issues.push(AuditIssue::Rejected {
                    round: prev.code.clone(),
                    message: e.to_string(),
                });
                return;
            }
        },
    };
    let found = (next.round_count, next.extended_round_count);
    if found != expected {
        issues.push(AuditIssue::CounterMismatch {
            round: code(),
            expected,
            found,
        });
    }

    let sticks = next_table_sticks(prev);
    if next.cumulated_thousands != sticks {
        issues.push(AuditIssue::TableMismatch {
            round: code(),
            expected: sticks,
            found: next.cumulated_thousands,
        });
    }
}

/// Every inconsistency in one match's round records, in play order.
pub fn audit_history(rounds: &[MatchRound], rule: &MatchRule) -> Vec<AuditIssue> {
    let mut issues = Vec::new();
    let Some(first) = rounds.first() else {
        return issues;
    };

    let fresh = first.round_count == 1
        && first.extended_round_count == 0
        && first.cumulated_thousands == 0
        && first
            .player_results
            .iter()
            .all(|r| r.before_score == rule.starting_score);
    if !fresh {
        issues.push(AuditIssue::BadOpening {
            round: first.code.clone(),
        });
    }

    for round in rounds {
        check_round(round, rule, &mut issues);
    }
    for pair in rounds.windows(2) {
        check_transition(&pair[0], &pair[1], rule, &mut issues);
    }

    if !issues.is_empty() {
        log::warn!(
            "match {}: {} audit issue(s)",
            first.match_code,
            issues.len()
        );
    }
    issues
}

/// Audits many matches on rayon's global pool.
pub fn audit_matches(histories: &[Vec<MatchRound>], rule: &MatchRule) -> Vec<Vec<AuditIssue>> {
    histories
        .par_iter()
        .map(|rounds| audit_history(rounds, rule))
        .collect()
}

/// Parallel auditor using a dedicated rayon ThreadPool.
pub struct Auditor {
    pool: rayon::ThreadPool,
}

impl Auditor {
    /// `None` uses rayon's default thread count.
    pub fn new(num_threads: Option<usize>) -> anyhow::Result<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = num_threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build audit thread pool: {}", e))?;
        Ok(Self { pool })
    }

    pub fn run(&self, histories: &[Vec<MatchRound>], rule: &MatchRule) -> Vec<Vec<AuditIssue>> {
        self.pool.install(|| audit_matches(histories, rule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mjcast_engine::{MatchRoundStateMachine, WinEvent};

    fn slot(i: u8) -> PlayerSlot {
        PlayerSlot::new(i).unwrap()
    }

    fn clean_history() -> Vec<MatchRound> {
        let m = MatchRoundStateMachine::default();
        let r1 = m.declare_riichi(&m.open_first_round("AUDITS"), slot(2)).unwrap();
        let r1 = m.record_exhausted_draw(&r1, [false, false, true, false]).unwrap();
        let r2 = m.advance(&r1).unwrap();
        let r2 = m.record_win(&r2, &WinEvent::ron(slot(0), slot(1), 8000)).unwrap();
        let r3 = m.advance(&r2).unwrap();
        let r3 = m.apply_hotfix(&r3, [20000, 36000, 23000, 21000]).unwrap();
        let r4 = m.advance(&r3).unwrap();
        vec![r1, r2, r3, r4]
    }

    #[test]
    fn engine_history_is_clean() {
        let rule = MatchRule::default();
        assert_eq!(audit_history(&clean_history(), &rule), vec![]);
    }

    #[test]
    fn detects_score_gap_and_leak() {
        let rule = MatchRule::default();
        let mut rounds = clean_history();
        rounds[1].player_results[1].after_score += 1000;
        rounds[1].player_results[1].score_changes.push(1000);
        let issues = audit_history(&rounds, &rule);
        assert!(issues.contains(&AuditIssue::PointsLeak {
            round: rounds[1].code.clone(),
            leaked: 1000,
        }));
        assert!(issues
            .iter()
            .any(|i| matches!(i, AuditIssue::ScoreGap { slot: s, .. } if *s == slot(1))));
    }

    #[test]
    fn detects_counter_and_table_mismatch() {
        let rule = MatchRule::default();
        let mut rounds = clean_history();
        rounds[1].cumulated_thousands = 0;
        rounds[2].extended_round_count = 0;
        let issues = audit_history(&rounds, &rule);
        assert!(issues.iter().any(|i| matches!(
            i,
            AuditIssue::TableMismatch {
                expected: 1,
                found: 0,
                ..
            }
        )));
        assert!(issues.iter().any(|i| matches!(
            i,
            AuditIssue::CounterMismatch {
                expected: (2, 1),
                found: (2, 0),
                ..
            }
        )));
    }

    #[test]
    fn detects_unresolved_middle_round() {
        let rule = MatchRule::default();
        let m = MatchRoundStateMachine::default();
        let r1 = m.open_first_round("AUDITS");
        let mut r2 = r1.clone();
        r2.round_count = 2;
        let issues = audit_history(&[r1.clone(), r2], &rule);
        assert_eq!(issues, vec![AuditIssue::Unresolved { round: r1.code }]);
    }

    #[test]
    fn auditor_runs_batches() {
        let rule = MatchRule::default();
        let histories = vec![clean_history(); 8];
        let auditor = Auditor::new(Some(2)).unwrap();
        let results = auditor.run(&histories, &rule);
        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.is_empty()));
    }
}
