use crate::engine::ProgressionError;
use crate::models::challenge::default_tracks;
use crate::models::level::{DEFAULT_BASE_XP, DEFAULT_GROWTH, DEFAULT_LEVEL_COUNT};
use crate::models::{Challenge, ChallengeCatalog, ChallengeTrack, LevelTable};
use serde::{Deserialize, Serialize};

/// Engine settings from CodeXP Settings.yaml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub levels: LevelSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,
}

/// Level curve configuration.
///
/// When `thresholds` is set it is used verbatim; otherwise a geometric curve is
/// generated from `base_xp`, `growth` and `level_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSettings {
    #[serde(default = "default_base_xp")]
    pub base_xp: u64,

    #[serde(default = "default_growth")]
    pub growth: f64,

    #[serde(default = "default_level_count")]
    pub level_count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Vec<u64>>,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            base_xp: DEFAULT_BASE_XP,
            growth: DEFAULT_GROWTH,
            level_count: DEFAULT_LEVEL_COUNT,
            thresholds: None,
        }
    }
}

fn default_base_xp() -> u64 {
    DEFAULT_BASE_XP
}

fn default_growth() -> f64 {
    DEFAULT_GROWTH
}

fn default_level_count() -> usize {
    DEFAULT_LEVEL_COUNT
}

impl LevelSettings {
    /// Build the configured level table. A malformed table is an error, never a default.
    pub fn build_table(&self) -> Result<LevelTable, ProgressionError> {
        match &self.thresholds {
            Some(thresholds) => LevelTable::new(thresholds.clone()),
            None => LevelTable::geometric(self.base_xp, self.growth, self.level_count),
        }
    }
}

/// Where the floating "+N XP" label is drawn relative to the caret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GainedXpPosition {
    Top,
    TopLeft,
    Left,
    BottomLeft,
    Bottom,
    BottomRight,
    Right,
    #[default]
    TopRight,
}

impl GainedXpPosition {
    /// Unit offset `(x, y)` from the caret; y grows downwards.
    pub fn offset(self) -> (i32, i32) {
        match self {
            GainedXpPosition::Top => (0, -1),
            GainedXpPosition::TopLeft => (-1, -1),
            GainedXpPosition::Left => (-1, 0),
            GainedXpPosition::BottomLeft => (-1, 1),
            GainedXpPosition::Bottom => (0, 1),
            GainedXpPosition::BottomRight => (1, 1),
            GainedXpPosition::Right => (1, 0),
            GainedXpPosition::TopRight => (1, -1),
        }
    }
}

/// Which change notifications are shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub show_level_up_notification: bool,

    #[serde(default = "default_true")]
    pub show_complete_challenge_notification: bool,

    #[serde(default = "default_true")]
    pub show_gained_xp: bool,

    #[serde(default)]
    pub gained_xp_position: GainedXpPosition,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            show_level_up_notification: true,
            show_complete_challenge_notification: true,
            show_gained_xp: true,
            gained_xp_position: GainedXpPosition::TopRight,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Challenge catalog from CodeXP Challenges.yaml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeConfig {
    #[serde(default)]
    pub challenges: Vec<Challenge>,

    #[serde(default)]
    pub tracks: Vec<ChallengeTrack>,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            challenges: Vec::new(),
            tracks: default_tracks(),
        }
    }
}

impl ChallengeConfig {
    /// Build a lookup catalog. Later duplicates replace earlier ones.
    pub fn build_catalog(&self) -> ChallengeCatalog {
        let mut catalog = ChallengeCatalog::new();

        for challenge in &self.challenges {
            if catalog.insert_challenge(challenge.clone()).is_some() {
                tracing::warn!("Duplicate challenge id '{}', keeping the last entry", challenge.id);
            }
        }

        for track in &self.tracks {
            if track.goal == 0 {
                tracing::warn!("Challenge track for '{}' has a zero goal, skipping", track.event);
                continue;
            }
            if catalog.insert_track(track.clone()).is_some() {
                tracing::warn!("Duplicate challenge track for '{}', keeping the last entry", track.event);
            }
        }

        catalog
    }
}
