// State management module
//
// This module provides the ProgressionManager which owns ProgressionState behind
// Arc<RwLock<T>>, applies engine transitions and emits change events for the dashboard.

use crate::engine::{self, LevelInfo, ProgressionError};
use crate::metrics::EngineMetrics;
use crate::models::{ChallengeCatalog, Event, LevelTable, ProgressRecord, ProgressionState};
use crate::persistence::ProgressStore;
use anyhow::{Context, Result};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when progression state is modified
///
/// These events notify the presentation layer about state changes without
/// requiring it to poll. Level values are table indices; the dashboard shows
/// `level + 1`.
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressChange {
    /// An IDE event was counted
    EventRecorded { event: Event, count: u64 },

    /// A challenge was completed for the first time
    ChallengeCompleted {
        id: String,
        name: String,
        xp_reward: u64,
    },

    /// Total XP increased
    XpGained { amount: u64, total_xp: u64 },

    /// The current level increased
    LevelUp {
        level: usize,
        nickname: String,
        xp_for_next_level: Option<u64>,
    },

    /// Nickname was changed
    NicknameChanged { nickname: String },

    /// Progress was replaced from a persisted record
    StateLoaded,

    /// Progress was reset
    ProgressReset,
}

/// Read-only view of everything the dashboard displays
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardSnapshot {
    pub nickname: String,
    pub total_xp: u64,

    /// Level index into the table
    pub level: usize,

    /// 1-based level for display
    pub display_level: usize,

    pub xp_into_level: u64,
    pub xp_for_next_level: Option<u64>,
    pub progress_fraction: f64,
    pub completed_challenges: usize,
}

impl DashboardSnapshot {
    pub fn from_state(state: &ProgressionState, table: &LevelTable) -> Self {
        let LevelInfo {
            level,
            xp_into_level,
            xp_for_next_level,
            progress_fraction,
        } = engine::level_info(state, table);

        Self {
            nickname: state.nickname.clone(),
            total_xp: state.total_xp,
            level,
            display_level: level + 1,
            xp_into_level,
            xp_for_next_level,
            progress_fraction,
            completed_challenges: state.completed_count(),
        }
    }

    pub fn is_max_level(&self) -> bool {
        self.xp_for_next_level.is_none()
    }
}

/// Single-owner progression state with event emission
///
/// This is the stateful front of the engine:
/// - Owns [`ProgressionState`] behind `Arc<RwLock<T>>`
/// - Applies validated [`engine`] transitions for UI and ingestion intents
/// - Detects changes and emits [`ProgressChange`] events over a tokio broadcast channel
///
/// # Usage
///
/// - [`snapshot()`](Self::snapshot) for the dashboard's read values
/// - `on_*` methods for intents from the UI and event ingestion
/// - [`subscribe()`](Self::subscribe) for listening to changes
///
/// Subscribers only read; every mutation goes through this type.
pub struct ProgressionManager {
    /// Progression state; written only by this manager
    state: Arc<RwLock<ProgressionState>>,

    table: Arc<LevelTable>,
    catalog: Arc<ChallengeCatalog>,

    /// Broadcast channel for change events
    state_tx: broadcast::Sender<ProgressChange>,

    metrics: Arc<EngineMetrics>,
}

impl ProgressionManager {
    /// Create a manager with default state
    ///
    /// # Returns
    /// A new manager with a broadcast channel buffer of 100 events
    pub fn new(table: LevelTable, catalog: ChallengeCatalog) -> Self {
        Self::with_state(table, catalog, ProgressionState::default())
    }

    pub fn with_state(table: LevelTable, catalog: ChallengeCatalog, state: ProgressionState) -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(state)),
            table: Arc::new(table),
            catalog: Arc::new(catalog),
            state_tx,
            metrics: Arc::new(EngineMetrics::new()),
        }
    }

    /// Clone of the current state
    pub fn state(&self) -> ProgressionState {
        self.read(|state| state.clone())
    }

    /// Dashboard values for the current state
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.read(|state| DashboardSnapshot::from_state(state, &self.table))
    }

    /// Execute a function with read access to the state
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&ProgressionState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// Captures the old state, applies `update_fn`, diffs the two and broadcasts
    /// one event per detected change.
    ///
    /// # Returns
    /// The events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<ProgressChange>
    where
        F: FnOnce(&mut ProgressionState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);
        self.metrics.record_state_update();

        let changes = self.detect_changes(&old_state, &state);
        drop(state);

        for change in &changes {
            self.emit(change.clone());
        }

        changes
    }

    /// Like [`update`](Self::update), for transitions that can be rejected
    ///
    /// The write lock is held from reading the state to storing the result.
    /// The state is left untouched when `transition` fails.
    pub fn try_update<F>(&self, transition: F) -> Result<Vec<ProgressChange>, ProgressionError>
    where
        F: FnOnce(&ProgressionState) -> Result<ProgressionState, ProgressionError>,
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let next = transition(&state)?;

        let old_state = std::mem::replace(&mut *state, next);
        self.metrics.record_state_update();

        let changes = self.detect_changes(&old_state, &state);
        drop(state);

        for change in &changes {
            self.emit(change.clone());
        }

        Ok(changes)
    }

    /// Subscribe to change events
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressChange> {
        self.state_tx.subscribe()
    }

    fn emit(&self, change: ProgressChange) {
        // Sending only fails when nobody is listening
        let delivered = self.state_tx.send(change).is_ok();
        self.metrics.record_broadcast(delivered);
    }

    /// Detect what changed between two states and generate events
    fn detect_changes(&self, old: &ProgressionState, new: &ProgressionState) -> Vec<ProgressChange> {
        let mut changes = Vec::new();

        for (&event, &count) in &new.event_counts {
            if count > old.event_count(event) {
                changes.push(ProgressChange::EventRecorded { event, count });
            }
        }

        for id in new.completed_challenge_ids.difference(&old.completed_challenge_ids) {
            self.metrics.record_challenge_completed();
            let (name, xp_reward) = match self.catalog.get(id) {
                Some(challenge) => (challenge.display_name().to_string(), challenge.xp_reward),
                None => {
                    tracing::debug!("Completed challenge '{}' is not in the catalog", id);
                    (id.clone(), 0)
                }
            };
            changes.push(ProgressChange::ChallengeCompleted {
                id: id.clone(),
                name,
                xp_reward,
            });
        }

        if new.total_xp > old.total_xp {
            changes.push(ProgressChange::XpGained {
                amount: new.total_xp - old.total_xp,
                total_xp: new.total_xp,
            });
        }

        let old_level = engine::current_level(old, &self.table);
        let new_level = engine::current_level(new, &self.table);
        if new_level > old_level {
            changes.push(ProgressChange::LevelUp {
                level: new_level,
                nickname: new.nickname.clone(),
                xp_for_next_level: engine::xp_for_next_level(new, &self.table),
            });
        }

        if old.nickname != new.nickname {
            changes.push(ProgressChange::NicknameChanged {
                nickname: new.nickname.clone(),
            });
        }

        changes
    }

    // Intents from the UI and event ingestion

    /// Count an IDE event and complete any challenge tiers it unlocks
    pub fn on_event(&self, event: Event) -> Vec<ProgressChange> {
        self.metrics.record_event();
        self.update(|state| {
            let (next, completed) = engine::record_event(state, event, &self.catalog);
            for challenge in &completed {
                tracing::info!(
                    "Challenge '{}' completed by {} event, +{} XP",
                    challenge.id,
                    event,
                    challenge.xp_reward
                );
            }
            *state = next;
        })
    }

    /// Complete a catalog challenge by id
    ///
    /// An unknown id is logged and returned as [`ProgressionError::UnknownChallengeId`];
    /// the state is not touched. Completing an id twice emits nothing.
    pub fn on_challenge_completed(&self, challenge_id: &str) -> Result<Vec<ProgressChange>, ProgressionError> {
        let challenge = self.catalog.lookup(challenge_id).inspect_err(|e| {
            self.metrics.record_unknown_challenge();
            tracing::warn!("Ignoring completion event: {}", e);
        })?;

        Ok(self.update(|state| {
            *state = engine::complete_challenge(state, &challenge);
        }))
    }

    /// Validate and apply a nickname edited in the UI
    pub fn on_nickname_edited(&self, text: &str) -> Result<Vec<ProgressChange>, ProgressionError> {
        self.try_update(|state| engine::set_nickname(state, text))
            .inspect_err(|e| tracing::debug!("Rejected nickname edit: {}", e))
    }

    /// Reset all progress; the nickname is kept
    ///
    /// Irreversible: the previous state is not retained anywhere.
    pub fn on_reset_requested(&self) -> Vec<ProgressChange> {
        let mut changes = self.update(|state| {
            *state = engine::reset(state);
        });

        self.metrics.record_reset();
        tracing::info!("Progress reset");

        let reset_event = ProgressChange::ProgressReset;
        self.emit(reset_event.clone());
        changes.push(reset_event);

        changes
    }

    // Persistence boundary

    /// Persisted form of the current state
    pub fn to_record(&self) -> ProgressRecord {
        self.read(|state| ProgressRecord::from(state))
    }

    /// Replace the current state with a persisted record
    pub fn load_record(&self, record: ProgressRecord) -> Vec<ProgressChange> {
        let state = record.into_state();
        {
            let mut current = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *current = state;
        }
        self.metrics.record_state_update();

        self.emit(ProgressChange::StateLoaded);
        vec![ProgressChange::StateLoaded]
    }

    /// Write the current state to `store`
    pub fn save_to(&self, store: &dyn ProgressStore) -> Result<()> {
        store
            .save(&self.to_record())
            .context("Failed to save progression state")
    }

    /// Load state from `store` if it holds a record
    ///
    /// # Returns
    /// `true` if a record was loaded, `false` if the store was empty
    pub fn restore_from(&self, store: &dyn ProgressStore) -> Result<bool> {
        match store.load().context("Failed to load progression state")? {
            Some(record) => {
                tracing::info!(
                    "Restored progress: {} XP, {} completed challenges",
                    record.total_xp,
                    record.completed_challenge_ids.len()
                );
                self.load_record(record);
                Ok(true)
            }
            None => {
                tracing::info!("No saved progress found, starting fresh");
                Ok(false)
            }
        }
    }

    pub fn level_table(&self) -> &LevelTable {
        &self.table
    }

    pub fn catalog(&self) -> &ChallengeCatalog {
        &self.catalog
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl Default for ProgressionManager {
    fn default() -> Self {
        Self::new(LevelTable::default(), ChallengeCatalog::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Challenge;
    use crate::persistence::MockProgressStore;
    use std::sync::atomic::Ordering;

    fn manager() -> ProgressionManager {
        let table = LevelTable::new(vec![0, 100, 300, 700]).unwrap();
        let mut catalog = ChallengeCatalog::new();
        catalog.insert_challenge(Challenge {
            id: "c1".to_string(),
            name: "First Challenge".to_string(),
            description: String::new(),
            xp_reward: 50,
        });
        catalog.insert_challenge(Challenge::new("big", 120));
        ProgressionManager::new(table, catalog)
    }

    #[test]
    fn test_new_manager() {
        let snapshot = manager().snapshot();

        assert_eq!(snapshot.total_xp, 0);
        assert_eq!(snapshot.level, 0);
        assert_eq!(snapshot.display_level, 1);
        assert_eq!(snapshot.xp_for_next_level, Some(100));
        assert_eq!(snapshot.completed_challenges, 0);
    }

    #[test]
    fn test_complete_challenge_emits_events() {
        let manager = manager();

        let changes = manager.on_challenge_completed("c1").unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0],
            ProgressChange::ChallengeCompleted {
                id: "c1".to_string(),
                name: "First Challenge".to_string(),
                xp_reward: 50,
            }
        );
        assert_eq!(changes[1], ProgressChange::XpGained { amount: 50, total_xp: 50 });
    }

    #[test]
    fn test_repeated_completion_is_silent() {
        let manager = manager();
        manager.on_challenge_completed("c1").unwrap();

        let changes = manager.on_challenge_completed("c1").unwrap();

        assert!(changes.is_empty());
        assert_eq!(manager.snapshot().total_xp, 50);
    }

    #[test]
    fn test_level_up_detection() {
        let manager = manager();
        manager.on_nickname_edited("ferris").unwrap();
        manager.on_challenge_completed("c1").unwrap();

        let changes = manager.on_challenge_completed("big").unwrap();

        assert!(changes.contains(&ProgressChange::LevelUp {
            level: 1,
            nickname: "ferris".to_string(),
            xp_for_next_level: Some(200),
        }));
        let snapshot = manager.snapshot();
        assert_eq!(snapshot.total_xp, 170);
        assert_eq!(snapshot.xp_into_level, 70);
        assert_eq!(snapshot.progress_fraction, 0.35);
    }

    #[test]
    fn test_unknown_challenge_is_ignored() {
        let manager = manager();

        let result = manager.on_challenge_completed("nope");

        assert_eq!(
            result,
            Err(ProgressionError::UnknownChallengeId("nope".to_string()))
        );
        assert_eq!(manager.snapshot().total_xp, 0);
        assert_eq!(manager.metrics().unknown_challenge_ids.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_nickname_edits_keep_concurrent_events() {
        let manager = Arc::new(manager());
        let rounds = 2_000;

        let events = {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || {
                for _ in 0..rounds {
                    manager.on_event(Event::Debug);
                }
            })
        };
        let nicknames = {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || {
                for i in 0..rounds {
                    let name = if i % 2 == 0 { "a" } else { "b" };
                    manager.on_nickname_edited(name).unwrap();
                }
            })
        };

        events.join().unwrap();
        nicknames.join().unwrap();

        let state = manager.state();
        assert_eq!(state.event_count(Event::Debug), rounds);
        assert_eq!(state.total_xp, rounds * Event::Debug.xp_value());
        assert_eq!(state.nickname, "b");
    }

    #[test]
    fn test_shadowed_tier_reports_granted_reward() {
        let mut catalog = ChallengeCatalog::new();
        catalog.insert_track(crate::models::ChallengeTrack {
            event: Event::Save,
            name: "Save Challenge".to_string(),
            description: String::new(),
            goal: 1,
            reward_xp: 300,
            reward_xp_increment: 0,
        });
        catalog.insert_challenge(Challenge::new("save-1", 5));
        let manager = ProgressionManager::new(LevelTable::new(vec![0, 1_000]).unwrap(), catalog);

        let changes = manager.on_event(Event::Save);

        assert!(changes.contains(&ProgressChange::ChallengeCompleted {
            id: "save-1".to_string(),
            name: "save-1".to_string(),
            xp_reward: 5,
        }));
        assert!(changes.contains(&ProgressChange::XpGained { amount: 15, total_xp: 15 }));
    }

    #[test]
    fn test_invalid_nickname_leaves_state() {
        let manager = manager();
        manager.on_nickname_edited("ferris").unwrap();

        let result = manager.on_nickname_edited("");

        assert!(matches!(result, Err(ProgressionError::InvalidNickname(_))));
        assert_eq!(manager.snapshot().nickname, "ferris");
    }

    #[test]
    fn test_nickname_change_event() {
        let manager = manager();

        let changes = manager.on_nickname_edited("ferris").unwrap();
        assert_eq!(
            changes,
            vec![ProgressChange::NicknameChanged {
                nickname: "ferris".to_string()
            }]
        );

        // Same name again is not a change
        assert!(manager.on_nickname_edited("ferris").unwrap().is_empty());
    }

    #[test]
    fn test_reset() {
        let manager = manager();
        manager.on_nickname_edited("ferris").unwrap();
        manager.on_challenge_completed("big").unwrap();
        manager.on_event(Event::Build);

        let changes = manager.on_reset_requested();

        assert_eq!(changes, vec![ProgressChange::ProgressReset]);
        let snapshot = manager.snapshot();
        assert_eq!(snapshot.total_xp, 0);
        assert_eq!(snapshot.level, 0);
        assert_eq!(snapshot.progress_fraction, 0.0);
        assert_eq!(snapshot.completed_challenges, 0);
        assert_eq!(snapshot.nickname, "ferris");
        assert_eq!(manager.state().event_count(Event::Build), 0);
    }

    #[test]
    fn test_on_event() {
        let manager = manager();

        let changes = manager.on_event(Event::Debug);

        assert_eq!(
            changes,
            vec![
                ProgressChange::EventRecorded {
                    event: Event::Debug,
                    count: 1
                },
                ProgressChange::XpGained { amount: 20, total_xp: 20 },
            ]
        );
    }

    #[test]
    fn test_subscribe_to_changes() {
        let manager = manager();
        let mut rx = manager.subscribe();

        manager.on_challenge_completed("c1").unwrap();

        assert!(matches!(
            rx.try_recv().unwrap(),
            ProgressChange::ChallengeCompleted { .. }
        ));
        assert!(matches!(rx.try_recv().unwrap(), ProgressChange::XpGained { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_record_round_trip() {
        let manager = manager();
        manager.on_nickname_edited("ferris").unwrap();
        manager.on_challenge_completed("c1").unwrap();
        let record = manager.to_record();

        let restored = ProgressionManager::default();
        let changes = restored.load_record(record);

        assert_eq!(changes, vec![ProgressChange::StateLoaded]);
        assert_eq!(restored.state(), manager.state());
    }

    #[test]
    fn test_save_to_store() {
        let manager = manager();
        manager.on_challenge_completed("c1").unwrap();

        let mut store = MockProgressStore::new();
        store
            .expect_save()
            .withf(|record| record.total_xp == 50 && record.completed_challenge_ids == vec!["c1"])
            .times(1)
            .returning(|_| Ok(()));

        manager.save_to(&store).unwrap();
    }

    #[test]
    fn test_save_to_store_propagates_errors() {
        let manager = manager();

        let mut store = MockProgressStore::new();
        store
            .expect_save()
            .returning(|_| Err(anyhow::anyhow!("disk full")));

        let err = manager.save_to(&store).unwrap_err();
        assert!(format!("{:#}", err).contains("disk full"));
    }

    #[test]
    fn test_restore_from_store() {
        let manager = manager();

        let mut store = MockProgressStore::new();
        store.expect_load().times(1).returning(|| {
            Ok(Some(ProgressRecord {
                nickname: "saved".to_string(),
                total_xp: 320,
                ..ProgressRecord::default()
            }))
        });

        assert!(manager.restore_from(&store).unwrap());
        let snapshot = manager.snapshot();
        assert_eq!(snapshot.nickname, "saved");
        assert_eq!(snapshot.level, 2);
    }

    #[test]
    fn test_restore_from_empty_store() {
        let manager = manager();

        let mut store = MockProgressStore::new();
        store.expect_load().returning(|| Ok(None));

        assert!(!manager.restore_from(&store).unwrap());
        assert_eq!(manager.snapshot().total_xp, 0);
    }
}
