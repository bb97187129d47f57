use crate::models::Event;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Version written by this build into [`ProgressRecord::version`].
pub const CURRENT_RECORD_VERSION: u32 = 1;

/// A user's progression.
///
/// `total_xp` only ever grows, except through an explicit
/// [`reset`](crate::engine::reset). Mutations go through the pure functions in
/// [`crate::engine`]; the owned, observable copy lives in
/// [`ProgressionManager`](crate::state::ProgressionManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionState {
    pub total_xp: u64,
    pub completed_challenge_ids: BTreeSet<String>,
    pub nickname: String,

    /// Occurrences of each IDE event since the last reset.
    pub event_counts: IndexMap<Event, u64>,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            total_xp: 0,
            completed_challenge_ids: BTreeSet::new(),
            nickname: String::new(),
            event_counts: Event::ALL.into_iter().map(|event| (event, 0)).collect(),
        }
    }
}

impl ProgressionState {
    pub fn event_count(&self, event: Event) -> u64 {
        self.event_counts.get(&event).copied().unwrap_or(0)
    }

    pub fn completed_count(&self) -> usize {
        self.completed_challenge_ids.len()
    }

    pub fn is_completed(&self, challenge_id: &str) -> bool {
        self.completed_challenge_ids.contains(challenge_id)
    }
}

/// On-disk layout of a [`ProgressionState`].
///
/// Every field has a default so older files load, and unknown fields are
/// ignored so files written by newer versions still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default = "default_record_version")]
    pub version: u32,

    #[serde(default)]
    pub nickname: String,

    #[serde(default)]
    pub total_xp: u64,

    #[serde(default)]
    pub completed_challenge_ids: Vec<String>,

    /// Keyed by [`Event::as_str`].
    #[serde(default)]
    pub event_counts: IndexMap<String, u64>,
}

fn default_record_version() -> u32 {
    CURRENT_RECORD_VERSION
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self::from(&ProgressionState::default())
    }
}

impl From<&ProgressionState> for ProgressRecord {
    fn from(state: &ProgressionState) -> Self {
        Self {
            version: CURRENT_RECORD_VERSION,
            nickname: state.nickname.clone(),
            total_xp: state.total_xp,
            completed_challenge_ids: state.completed_challenge_ids.iter().cloned().collect(),
            event_counts: state
                .event_counts
                .iter()
                .map(|(event, count)| (event.as_str().to_string(), *count))
                .collect(),
        }
    }
}

impl ProgressRecord {
    /// Convert to engine state. Event names this build does not know are dropped.
    pub fn into_state(self) -> ProgressionState {
        if self.version > CURRENT_RECORD_VERSION {
            tracing::warn!(
                "Progress record version {} is newer than supported version {}, loading known fields only",
                self.version,
                CURRENT_RECORD_VERSION
            );
        }

        let mut state = ProgressionState {
            total_xp: self.total_xp,
            completed_challenge_ids: self.completed_challenge_ids.into_iter().collect(),
            nickname: self.nickname,
            ..ProgressionState::default()
        };

        for (name, count) in self.event_counts {
            match Event::from_name(&name) {
                Some(event) => {
                    state.event_counts.insert(event, count);
                }
                None => tracing::debug!("Ignoring unknown event '{}' in progress record", name),
            }
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = ProgressionState::default();
        assert_eq!(state.total_xp, 0);
        assert_eq!(state.completed_count(), 0);
        assert!(state.nickname.is_empty());
        assert_eq!(state.event_counts.len(), Event::ALL.len());
        assert_eq!(state.event_count(Event::Typing), 0);
    }

    #[test]
    fn test_record_from_state() {
        let mut state = ProgressionState::default();
        state.total_xp = 420;
        state.nickname = "ferris".to_string();
        state.completed_challenge_ids.insert("save-1".to_string());
        state.completed_challenge_ids.insert("build-1".to_string());
        state.event_counts.insert(Event::Save, 12);

        let record = ProgressRecord::from(&state);

        assert_eq!(record.version, CURRENT_RECORD_VERSION);
        // BTreeSet iteration keeps the persisted list sorted
        assert_eq!(record.completed_challenge_ids, vec!["build-1", "save-1"]);
        assert_eq!(record.event_counts.get("save"), Some(&12));
        assert_eq!(record.into_state(), state);
    }

    #[test]
    fn test_record_tolerates_missing_and_unknown_fields() {
        let yaml = "total_xp: 75\nevent_counts:\n  typing: 3\n  telepathy: 9\nfavourite_colour: blue\n";
        let record: ProgressRecord = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(record.version, CURRENT_RECORD_VERSION);
        assert!(record.nickname.is_empty());

        let state = record.into_state();
        assert_eq!(state.total_xp, 75);
        assert_eq!(state.event_count(Event::Typing), 3);
        assert_eq!(state.event_counts.len(), Event::ALL.len());
    }

    #[test]
    fn test_newer_record_version_loads() {
        let yaml = "version: 7\nnickname: future\ntotal_xp: 10\n";
        let record: ProgressRecord = serde_yaml_ng::from_str(yaml).unwrap();
        let state = record.into_state();

        assert_eq!(state.nickname, "future");
        assert_eq!(state.total_xp, 10);
    }
}
