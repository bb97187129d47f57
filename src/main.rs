//! CodeXP - Experience points and challenges for everyday coding
//!
//! Main entry point for the headless dashboard.
//!
//! # Overview
//!
//! The binary wires the library together and drives it from stdin:
//! - Logging infrastructure (daily file rotation, optional stderr output)
//! - Configuration loading ([`ConfigManager`]) with `CODEXP_*` overrides
//! - State management ([`ProgressionManager`])
//! - Notifications ([`Notifier`]) printed after every command
//!
//! # Execution Flow
//!
//! 1. Initialize logging → logs/codexp.<date>
//! 2. Load YAML configuration from `CodeXP Data/`
//!    - `CodeXP Settings.yaml` → level curve, notification toggles
//!    - `CodeXP Challenges.yaml` → challenges and progressive tracks
//! 3. Restore progress from `CodeXP Progress.yaml`
//! 4. Read one command per line until `quit` or end of input,
//!    saving after every command that changes progress

use anyhow::{Context, Result};
use codexp::command::{Command, HELP_TEXT};
use codexp::format::{render_dashboard, with_commas};
use codexp::logging::{LoggingOptions, setup_logging};
use codexp::{
    APP_NAME, ConfigManager, Notification, NotificationKind, Notifier, ProgressionError,
    ProgressionManager, VERSION, YamlProgressStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};

const DATA_DIR: &str = "CodeXP Data";

fn main() -> Result<()> {
    // Held until exit so buffered log lines are flushed
    let _log_guard = setup_logging(&LoggingOptions {
        debug_mode: std::env::var_os("CODEXP_DEBUG").is_some(),
        ..LoggingOptions::default()
    })?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .thread_name("codexp-main")
        .build()
        .context("Failed to create tokio runtime")?;

    let result = runtime.block_on(run());

    if let Err(e) = &result {
        tracing::error!("Fatal error: {:#}", e);
    }
    tracing::info!("Application shutdown complete");

    result
}

async fn run() -> Result<()> {
    let config_manager = ConfigManager::new(DATA_DIR)?;
    let settings = config_manager.load_settings()?;

    // A broken level table is fatal, never replaced by the default curve
    let table = settings
        .levels
        .build_table()
        .with_context(|| format!("Invalid level table in {}", config_manager.settings_path()))?;
    let catalog = config_manager.load_challenge_config()?.build_catalog();

    tracing::info!(
        "Level table has {} levels, catalog has {} challenges and {} tracks",
        table.len(),
        catalog.challenges().count(),
        catalog.tracks().count()
    );

    let manager = ProgressionManager::new(table, catalog);
    let store = YamlProgressStore::in_dir(config_manager.data_dir());
    manager.restore_from(&store)?;

    let mut notifier = Notifier::new(manager.subscribe(), settings.notifications);

    println!("{} v{}  (type 'help' for commands)\n", APP_NAME, VERSION);
    println!("{}\n", render_dashboard(&manager.snapshot()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }

        if let Err(e) = dispatch(&manager, &command) {
            println!("{}", e);
        }

        for notification in notifier.drain() {
            println!("{}", render_notification(&notification));
        }

        if command.is_mutating() {
            if let Err(e) = manager.save_to(&store) {
                tracing::error!("{:#}", e);
                println!("Could not save progress: {:#}", e);
            }
        }
    }

    manager.save_to(&store)?;
    manager.metrics().log_summary();

    Ok(())
}

fn dispatch(manager: &ProgressionManager, command: &Command) -> Result<(), ProgressionError> {
    match command {
        Command::Event(event) => {
            manager.on_event(*event);
        }
        Command::Complete(id) => {
            manager.on_challenge_completed(id)?;
        }
        Command::Nickname(text) => {
            manager.on_nickname_edited(text)?;
        }
        Command::Reset => {
            manager.on_reset_requested();
            println!("Progress reset.");
        }
        Command::Show => println!("{}", render_dashboard(&manager.snapshot())),
        Command::Challenges => println!("{}", render_challenges(manager)),
        Command::Help => println!("{}", HELP_TEXT),
        Command::Quit => {}
    }
    Ok(())
}

fn render_notification(notification: &Notification) -> String {
    match notification.kind {
        NotificationKind::GainedXp { .. } => format!("  {}", notification.title),
        _ => format!("* {}\n  {}", notification.title, notification.content),
    }
}

fn render_challenges(manager: &ProgressionManager) -> String {
    let catalog = manager.catalog();
    let mut lines = Vec::new();

    manager.read(|state| {
        for challenge in catalog.challenges() {
            let mark = if state.is_completed(&challenge.id) { "x" } else { " " };
            lines.push(format!(
                "[{}] {} ({}): {} XP",
                mark,
                challenge.display_name(),
                challenge.id,
                with_commas(challenge.xp_reward)
            ));
        }

        for track in catalog.tracks() {
            let tier = track.next_tier(&state.completed_challenge_ids);
            let goal = track
                .cumulative_goal(tier)
                .map_or_else(|| "-".to_string(), with_commas);
            lines.push(format!(
                "    {} tier {} ({}): {} / {}, reward {} XP",
                track.name,
                tier,
                track.tier_id(tier),
                with_commas(state.event_count(track.event)),
                goal,
                with_commas(track.tier_reward(tier))
            ));
        }
    });

    if lines.is_empty() {
        "No challenges configured.".to_string()
    } else {
        lines.join("\n")
    }
}
