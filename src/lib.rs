// CodeXP - Experience points and challenges for everyday coding
//
// This is the library crate containing the progression engine and data structures.
// The binary crate (main.rs) provides a headless dashboard on stdin/stdout.

pub mod command;
pub mod config;
pub mod engine;
pub mod format;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod persistence;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use engine::{LevelInfo, ProgressionError};
pub use models::{
    Challenge, ChallengeCatalog, ChallengeConfig, ChallengeTrack, EngineSettings, Event, LevelTable,
    ProgressRecord, ProgressionState,
};
pub use notifications::{Notification, NotificationKind, Notifier};
pub use persistence::{ProgressStore, YamlProgressStore};
pub use state::{DashboardSnapshot, ProgressChange, ProgressionManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
