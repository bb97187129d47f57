use crate::engine::ProgressionError;
use serde::{Deserialize, Serialize};

/// XP needed to go from the first level to the second on the default curve.
pub const DEFAULT_BASE_XP: u64 = 300;

/// Factor applied to each successive level's XP requirement on the default curve.
pub const DEFAULT_GROWTH: f64 = 1.05;

/// Number of levels on the default curve.
pub const DEFAULT_LEVEL_COUNT: usize = 100;

/// Cumulative XP thresholds, indexed by level.
///
/// A table always holds at least one entry, starts at 0 and is strictly
/// increasing. Those properties are checked in [`LevelTable::new`] (and on
/// deserialization), so level lookups never fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct LevelTable {
    thresholds: Vec<u64>,
}

impl LevelTable {
    /// Validate and wrap a list of cumulative thresholds.
    pub fn new(thresholds: Vec<u64>) -> Result<Self, ProgressionError> {
        match thresholds.first() {
            None => {
                return Err(ProgressionError::InvalidLevelTable(
                    "table is empty".to_string(),
                ));
            }
            Some(&first) if first != 0 => {
                return Err(ProgressionError::InvalidLevelTable(format!(
                    "first threshold must be 0, got {}",
                    first
                )));
            }
            Some(_) => {}
        }

        if let Some(pair) = thresholds.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(ProgressionError::InvalidLevelTable(format!(
                "thresholds must be strictly increasing, found {} followed by {}",
                pair[0], pair[1]
            )));
        }

        Ok(Self { thresholds })
    }

    /// Build a geometric curve: the first step costs `base_xp` and every
    /// following step costs `growth` times the previous one.
    ///
    /// Thresholds are truncated to whole XP.
    pub fn geometric(base_xp: u64, growth: f64, level_count: usize) -> Result<Self, ProgressionError> {
        if base_xp == 0 {
            return Err(ProgressionError::InvalidLevelTable(
                "base XP must be positive".to_string(),
            ));
        }
        if !(growth >= 1.0 && growth.is_finite()) {
            return Err(ProgressionError::InvalidLevelTable(format!(
                "growth must be a finite number >= 1.0, got {}",
                growth
            )));
        }
        if level_count == 0 {
            return Err(ProgressionError::InvalidLevelTable(
                "level count must be at least 1".to_string(),
            ));
        }

        Self::new(geometric_thresholds(base_xp, growth, level_count))
    }

    /// Level index reached with `xp` total experience.
    pub fn level_for_xp(&self, xp: u64) -> usize {
        // thresholds[0] == 0, so at least one entry is <= xp
        self.thresholds.partition_point(|&threshold| threshold <= xp) - 1
    }

    /// Cumulative XP required to reach `level`.
    ///
    /// Levels past the end of the table report the last threshold.
    pub fn threshold(&self, level: usize) -> u64 {
        let index = level.min(self.max_level());
        self.thresholds[index]
    }

    /// XP between `level` and the level after it, or `None` at the last level.
    pub fn step(&self, level: usize) -> Option<u64> {
        let next = self.thresholds.get(level.checked_add(1)?)?;
        Some(next - self.thresholds.get(level)?)
    }

    /// Index of the last level.
    pub fn max_level(&self) -> usize {
        self.thresholds.len() - 1
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn thresholds(&self) -> &[u64] {
        &self.thresholds
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            thresholds: geometric_thresholds(DEFAULT_BASE_XP, DEFAULT_GROWTH, DEFAULT_LEVEL_COUNT),
        }
    }
}

impl TryFrom<Vec<u64>> for LevelTable {
    type Error = ProgressionError;

    fn try_from(thresholds: Vec<u64>) -> Result<Self, Self::Error> {
        Self::new(thresholds)
    }
}

impl From<LevelTable> for Vec<u64> {
    fn from(table: LevelTable) -> Self {
        table.thresholds
    }
}

fn geometric_thresholds(base_xp: u64, growth: f64, level_count: usize) -> Vec<u64> {
    let mut thresholds = Vec::with_capacity(level_count);
    thresholds.push(0);

    let mut step = base_xp as f64;
    let mut accumulated = step;
    while thresholds.len() < level_count {
        thresholds.push(accumulated as u64);
        step *= growth;
        accumulated += step;
    }

    thresholds
}
