//! Progression engine - pure level and challenge arithmetic.
//!
//! Every function in this module is a pure transition over [`ProgressionState`]:
//! inputs are borrowed, a new state (or a derived value) is returned, and nothing
//! is logged, persisted or broadcast. The stateful wrapper that owns the state and
//! notifies subscribers is [`crate::state::ProgressionManager`].
//!
//! # Level arithmetic
//!
//! Levels are indices into a [`LevelTable`] of cumulative XP thresholds. For a
//! table `[0, 100, 300, 700]` and 150 XP:
//!
//! | query                | value  |
//! |----------------------|--------|
//! | [`current_level`]    | 1      |
//! | [`xp_into_level`]    | 50     |
//! | [`xp_for_next_level`]| 200    |
//! | [`progress_fraction`]| 0.25   |
//!
//! A table is validated once, when it is built, so the queries themselves cannot
//! fail.

use crate::models::{Challenge, ChallengeCatalog, Event, LevelTable, ProgressionState};
use thiserror::Error;

/// Maximum nickname length, in Unicode scalar values.
pub const MAX_NICKNAME_CHARS: usize = 32;

/// Errors produced by engine transitions and validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressionError {
    /// Level table is empty, does not start at 0, or is not strictly increasing.
    #[error("Invalid level table: {0}")]
    InvalidLevelTable(String),

    /// Nickname failed validation and should be corrected by the user.
    #[error("Invalid nickname: {0}")]
    InvalidNickname(String),

    /// An event referenced a challenge that is not in the catalog.
    #[error("Unknown challenge id: {0}")]
    UnknownChallengeId(String),
}

/// All derived level values for one state, as shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelInfo {
    pub level: usize,
    pub xp_into_level: u64,
    pub xp_for_next_level: Option<u64>,
    pub progress_fraction: f64,
}

impl LevelInfo {
    /// True when the table has no level above the current one.
    pub fn is_max_level(&self) -> bool {
        self.xp_for_next_level.is_none()
    }
}

/// Largest level index whose threshold is at or below the state's total XP.
pub fn current_level(state: &ProgressionState, table: &LevelTable) -> usize {
    table.level_for_xp(state.total_xp)
}

/// XP earned since reaching the current level.
pub fn xp_into_level(state: &ProgressionState, table: &LevelTable) -> u64 {
    let level = current_level(state, table);
    state.total_xp - table.threshold(level)
}

/// Width of the current level in XP, or `None` when the last level is reached.
pub fn xp_for_next_level(state: &ProgressionState, table: &LevelTable) -> Option<u64> {
    let level = current_level(state, table);
    table.step(level)
}

/// Position between the current and the next threshold, in `[0, 1]`.
///
/// Returns `1.0` at max level.
pub fn progress_fraction(state: &ProgressionState, table: &LevelTable) -> f64 {
    match xp_for_next_level(state, table) {
        Some(width) => (xp_into_level(state, table) as f64 / width as f64).clamp(0.0, 1.0),
        None => 1.0,
    }
}

/// Compute every dashboard level value in one pass.
pub fn level_info(state: &ProgressionState, table: &LevelTable) -> LevelInfo {
    LevelInfo {
        level: current_level(state, table),
        xp_into_level: xp_into_level(state, table),
        xp_for_next_level: xp_for_next_level(state, table),
        progress_fraction: progress_fraction(state, table),
    }
}

/// Mark a challenge completed and grant its reward.
///
/// Completing an id that is already in the completed set returns an identical
/// state, so replayed completion events never grant XP twice.
pub fn complete_challenge(state: &ProgressionState, challenge: &Challenge) -> ProgressionState {
    let mut next = state.clone();
    grant(&mut next, challenge);
    next
}

/// In-place completion. Returns `false` if the id was already completed.
fn grant(state: &mut ProgressionState, challenge: &Challenge) -> bool {
    if !state.completed_challenge_ids.insert(challenge.id.clone()) {
        return false;
    }
    state.total_xp = state.total_xp.saturating_add(challenge.xp_reward);
    true
}

/// Zero all progress. The nickname is kept.
pub fn reset(state: &ProgressionState) -> ProgressionState {
    ProgressionState {
        nickname: state.nickname.clone(),
        ..ProgressionState::default()
    }
}

/// Validate and apply a new nickname.
///
/// Surrounding whitespace is trimmed before validation. The result must be
/// non-empty and at most [`MAX_NICKNAME_CHARS`] characters long.
pub fn set_nickname(state: &ProgressionState, name: &str) -> Result<ProgressionState, ProgressionError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ProgressionError::InvalidNickname(
            "nickname must not be empty".to_string(),
        ));
    }

    let length = name.chars().count();
    if length > MAX_NICKNAME_CHARS {
        return Err(ProgressionError::InvalidNickname(format!(
            "nickname is {} characters long, maximum is {}",
            length, MAX_NICKNAME_CHARS
        )));
    }

    Ok(ProgressionState {
        nickname: name.to_string(),
        ..state.clone()
    })
}

/// Count one occurrence of an IDE event.
///
/// Adds the event's XP value, then completes every tier of the event's
/// challenge track whose cumulative goal has been reached. Returns the new
/// state together with the challenges completed by this occurrence.
pub fn record_event(
    state: &ProgressionState,
    event: Event,
    catalog: &ChallengeCatalog,
) -> (ProgressionState, Vec<Challenge>) {
    let mut next = state.clone();

    let count = next.event_counts.entry(event).or_insert(0);
    *count = count.saturating_add(1);
    let count = *count;

    next.total_xp = next.total_xp.saturating_add(event.xp_value());

    let mut completed = Vec::new();
    if let Some(track) = catalog.track(event).filter(|track| track.goal > 0) {
        let mut tier = track.next_tier(&next.completed_challenge_ids);
        while track.cumulative_goal(tier).is_some_and(|goal| count >= goal) {
            // Resolve through the catalog so a static entry with the same id wins,
            // matching what completion by id grants
            let tier_id = track.tier_id(tier);
            let challenge = catalog.get(&tier_id).unwrap_or_else(|| track.tier(tier));
            if grant(&mut next, &challenge) {
                completed.push(challenge);
            }

            tier += 1;
            while next.completed_challenge_ids.contains(&track.tier_id(tier)) {
                tier += 1;
            }
        }
    }

    (next, completed)
}
