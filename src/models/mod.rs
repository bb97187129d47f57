//! Data models for the CodeXP progression engine.
//!
//! - [`ProgressionState`]: the user's XP, completed challenges, nickname and event counts
//! - [`LevelTable`]: validated cumulative XP thresholds
//! - [`Challenge`], [`ChallengeTrack`], [`ChallengeCatalog`]: one-time and progressive challenges
//! - [`Event`]: IDE activities that grant XP
//! - [`ProgressRecord`]: versioned persisted layout of the state
//! - [`EngineSettings`], [`ChallengeConfig`]: configuration loaded from YAML
//!
//! Config structs derive `Serialize`/`Deserialize` for YAML persistence. The state is
//! only mutated through [`crate::engine`] transitions.

pub mod challenge;
pub mod config;
pub mod level;
pub mod progress;

pub use challenge::{Challenge, ChallengeCatalog, ChallengeTrack, Event};
pub use config::{ChallengeConfig, EngineSettings, GainedXpPosition, LevelSettings, NotificationSettings};
pub use level::LevelTable;
pub use progress::{CURRENT_RECORD_VERSION, ProgressRecord, ProgressionState};
