//! Match session driver.
//!
//! `MatchSession` ties the engine to a `RecordStore`: the match record lives
//! in `matches/<id>`, its rounds in `matchRounds/<id>/<round id>`. Commands
//! update the current round record in place; `advance` appends a new one.
//! Resolved rounds are never touched again and form the match history.

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use mjcast_engine::match_event::MatchEvent;
use mjcast_engine::types::{NextRoundType, NUM_PLAYERS};
use mjcast_engine::{Match, MatchRound, MatchRoundStateMachine, Player, PlayerSlot, RoundCommand};
use serde_json::json;

use crate::codes::CodeGenerator;
use crate::history::{self, HistoryRow, Standing};
use crate::overlay::OverlaySnapshot;
use crate::settings::MatchSettings;
use crate::store::{ChangeCallback, RecordId, RecordStore, Subscription};

pub const MATCHES: &str = "matches";

pub fn rounds_collection(match_id: &str) -> String {
    format!("matchRounds/{}", match_id)
}

pub struct MatchSession<S: RecordStore> {
    store: S,
    settings: MatchSettings,
    machine: MatchRoundStateMachine,
    match_id: RecordId,
    record: Match,
    current_id: RecordId,
    current: MatchRound,
}

impl<S: RecordStore> MatchSession<S> {
    /// Writes a new match and its first round.
    pub fn create(
        store: S,
        players: [Player; NUM_PLAYERS],
        settings: MatchSettings,
        codes: &mut CodeGenerator,
        created_by: &str,
    ) -> Result<Self> {
        let record = Match {
            code: codes.next_match_code(),
            players,
            created_at: Utc::now(),
            created_by: created_by.to_string(),
            remark: String::new(),
            rule: settings.rule,
        };
        let match_id = store
            .create(MATCHES, serde_json::to_value(&record)?)
            .context("creating match record")?;

        let machine = MatchRoundStateMachine::new(settings.rule);
        let current = machine.open_first_round(&record.code);
        let current_id = store
            .create(&rounds_collection(&match_id), current.to_json()?)
            .with_context(|| format!("creating first round of match {}", record.code))?;

        log::info!(
            "match {} created by {} ({:?}, {:?})",
            record.code,
            record.created_by,
            record.rule.template,
            record.rule.length
        );
        Ok(Self {
            store,
            settings,
            machine,
            match_id,
            record,
            current_id,
            current,
        })
    }

    /// Rebuilds a session from stored records. The last round record is the
    /// current round. The ruleset comes from the match record; `settings`
    /// only contributes display options.
    pub fn load(store: S, match_id: &str, settings: MatchSettings) -> Result<Self> {
        let value = store
            .get(MATCHES, match_id)?
            .ok_or_else(|| anyhow!("match {} not found", match_id))?;
        let record: Match = serde_json::from_value(value)
            .with_context(|| format!("decoding match record {}", match_id))?;

        let (current_id, value) = store
            .list(&rounds_collection(match_id))?
            .pop()
            .ok_or_else(|| anyhow!("match {} has no rounds", match_id))?;
        let current = MatchRound::from_json(value)
            .with_context(|| format!("decoding round {}/{}", match_id, current_id))?;
        if current.match_code != record.code {
            bail!(
                "round {} belongs to match {}, not {}",
                current.code,
                current.match_code,
                record.code
            );
        }

        let settings = MatchSettings {
            rule: record.rule,
            ..settings
        };
        log::debug!("loaded match {} at round {}", record.code, current.code);
        Ok(Self {
            store,
            machine: MatchRoundStateMachine::new(record.rule),
            settings,
            match_id: match_id.to_string(),
            record,
            current_id,
            current,
        })
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    pub fn match_record(&self) -> &Match {
        &self.record
    }

    pub fn current_round(&self) -> &MatchRound {
        &self.current
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_ended(&self) -> bool {
        self.current.next_round_type == NextRoundType::End
    }

    /// Applies an operator command to the current round and persists it.
    pub fn apply(&mut self, command: &RoundCommand) -> Result<MatchEvent> {
        let (next, event) = self
            .machine
            .apply_with_event(&self.current, command)
            .with_context(|| format!("applying {:?} to round {}", command, self.current.code))?;
        self.store
            .update(&rounds_collection(&self.match_id), &self.current_id, next.to_json()?)
            .with_context(|| format!("saving round {}", next.code))?;
        self.current = next;

        if event.ends_match() {
            log::info!(
                "match {} ended at {} with scores {:?}",
                self.record.code,
                self.counter_label(),
                self.current.scores()
            );
        }
        Ok(event)
    }

    /// Opens the next round after a resolved one.
    pub fn advance(&mut self) -> Result<MatchEvent> {
        let (next, event) = self
            .machine
            .advance_with_event(&self.current)
            .with_context(|| format!("advancing from round {}", self.current.code))?;
        let id = self
            .store
            .create(&rounds_collection(&self.match_id), next.to_json()?)
            .with_context(|| format!("creating round {}", next.code))?;
        self.current_id = id;
        self.current = next;
        Ok(event)
    }

    /// Replaces a player's profile on the match record.
    pub fn update_player(&mut self, slot: PlayerSlot, player: Player) -> Result<()> {
        let record = self.record.with_player(slot, player);
        self.store
            .update(
                MATCHES,
                &self.match_id,
                json!({ "players": serde_json::to_value(&record.players)? }),
            )
            .with_context(|| format!("updating player {} of match {}", slot, record.code))?;
        self.record = record;
        Ok(())
    }

    pub fn set_remark(&mut self, remark: &str) -> Result<()> {
        self.store
            .update(MATCHES, &self.match_id, json!({ "remark": remark }))
            .with_context(|| format!("updating remark of match {}", self.record.code))?;
        self.record.remark = remark.to_string();
        Ok(())
    }

    /// All round records in play order, current round last.
    pub fn history(&self) -> Result<Vec<MatchRound>> {
        self.store
            .list(&rounds_collection(&self.match_id))?
            .into_iter()
            .map(|(id, value)| {
                MatchRound::from_json(value)
                    .with_context(|| format!("decoding round {}/{}", self.match_id, id))
            })
            .collect()
    }

    pub fn history_table(&self) -> Result<Vec<HistoryRow>> {
        Ok(history::history_table(&self.history()?, &self.settings))
    }

    pub fn standings(&self) -> [Standing; NUM_PLAYERS] {
        history::standings(&self.current, &self.record.rule)
    }

    pub fn counter_label(&self) -> String {
        self.settings
            .counter_label(self.current.round_count, self.current.extended_round_count)
    }

    pub fn overlay(&self) -> Result<OverlaySnapshot> {
        OverlaySnapshot::build(&self.record, &self.current, &self.settings)
    }

    /// Watches the current round record. The subscription keeps following
    /// this record only; resubscribe after `advance`.
    pub fn subscribe_current(&self, on_change: ChangeCallback) -> Result<Subscription> {
        self.store
            .subscribe(&rounds_collection(&self.match_id), &self.current_id, on_change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use mjcast_engine::WinEvent;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn players() -> [Player; NUM_PLAYERS] {
        ["Sonoda", "Kayamori", "Takamiya", "Hinata"].map(Player::new)
    }

    fn slot(i: u8) -> PlayerSlot {
        PlayerSlot::new(i).unwrap()
    }

    fn session(store: MemoryStore) -> MatchSession<MemoryStore> {
        let mut codes = CodeGenerator::new([7u8; 32]);
        MatchSession::create(store, players(), MatchSettings::default(), &mut codes, "op").unwrap()
    }

    #[test]
    fn create_writes_match_and_first_round() {
        let store = MemoryStore::new();
        let s = session(store.clone());
        assert_eq!(s.match_record().code.len(), 6);
        assert!(store.get(MATCHES, s.match_id()).unwrap().is_some());
        let rounds = store.list(&rounds_collection(s.match_id())).unwrap();
        assert_eq!(rounds.len(), 1);
        assert_eq!(s.counter_label(), "東1局");
    }

    #[test]
    fn apply_updates_current_record() {
        let store = MemoryStore::new();
        let mut s = session(store.clone());
        s.apply(&RoundCommand::DeclareRiichi { slot: slot(1) }).unwrap();
        let history = s.history().unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].result(slot(1)).is_riichi);
    }

    #[test]
    fn advance_appends_round() {
        let mut s = session(MemoryStore::new());
        s.apply(&RoundCommand::RecordWin {
            event: WinEvent::ron(slot(0), slot(2), 3900),
        })
        .unwrap();
        let event = s.advance().unwrap();
        assert!(matches!(event, MatchEvent::RoundOpened { round_count: 2, .. }));
        assert_eq!(s.history().unwrap().len(), 2);
        assert_eq!(s.current_round().result(slot(2)).before_score, 28900);
    }

    #[test]
    fn engine_errors_carry_context() {
        let mut s = session(MemoryStore::new());
        let err = s.advance().unwrap_err();
        assert!(format!("{err:#}").contains("advancing from round"));
        // Nothing was written.
        assert_eq!(s.history().unwrap().len(), 1);
    }

    #[test]
    fn load_resumes_at_last_round() {
        let store = MemoryStore::new();
        let mut s = session(store.clone());
        s.apply(&RoundCommand::RecordExhaustedDraw {
            tenpai: [true, false, false, false],
        })
        .unwrap();
        s.advance().unwrap();

        let loaded = MatchSession::load(store, s.match_id(), MatchSettings::default()).unwrap();
        assert_eq!(loaded.current_round(), s.current_round());
        assert_eq!(loaded.match_record(), s.match_record());
    }

    #[test]
    fn load_unknown_match_fails() {
        let err = MatchSession::load(MemoryStore::new(), "-nope", MatchSettings::default());
        assert!(err.is_err());
    }

    #[test]
    fn update_player_persists() {
        let store = MemoryStore::new();
        let mut s = session(store.clone());
        s.update_player(slot(3), Player::new("Okada").with_title("Saikouisen"))
            .unwrap();
        s.set_remark("semifinal").unwrap();
        let stored: Match =
            serde_json::from_value(store.get(MATCHES, s.match_id()).unwrap().unwrap()).unwrap();
        assert_eq!(stored.players[3].name, "Okada");
        assert_eq!(stored.remark, "semifinal");
        assert_eq!(stored.players[0].name, "Sonoda");
    }

    /// Delegates to a `MemoryStore` but refuses match updates once locked.
    #[derive(Clone, Default)]
    struct LockableStore {
        inner: MemoryStore,
        locked: Arc<AtomicBool>,
    }

    impl RecordStore for LockableStore {
        fn create(&self, collection: &str, record: serde_json::Value) -> Result<RecordId> {
            self.inner.create(collection, record)
        }

        fn update(&self, collection: &str, id: &str, partial: serde_json::Value) -> Result<()> {
            if collection == MATCHES && self.locked.load(Ordering::SeqCst) {
                bail!("store is read-only");
            }
            self.inner.update(collection, id, partial)
        }

        fn get(&self, collection: &str, id: &str) -> Result<Option<serde_json::Value>> {
            self.inner.get(collection, id)
        }

        fn list(&self, collection: &str) -> Result<Vec<(RecordId, serde_json::Value)>> {
            self.inner.list(collection)
        }

        fn subscribe(
            &self,
            collection: &str,
            id: &str,
            on_change: ChangeCallback,
        ) -> Result<Subscription> {
            self.inner.subscribe(collection, id, on_change)
        }
    }

    #[test]
    fn failed_remark_names_the_match() {
        let store = LockableStore::default();
        let mut codes = CodeGenerator::new([7u8; 32]);
        let settings = MatchSettings::default();
        let mut s =
            MatchSession::create(store.clone(), players(), settings, &mut codes, "op").unwrap();
        store.locked.store(true, Ordering::SeqCst);

        let err = s.set_remark("final").unwrap_err();
        let message = format!("{err:#}");
        let code = s.match_record().code.clone();
        assert!(message.contains(&format!("updating remark of match {}", code)), "{message}");
        assert!(message.contains("store is read-only"));
        assert_eq!(s.match_record().remark, "");
    }
}
