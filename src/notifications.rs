// Notifications module
//
// Turns ProgressChange events into user-facing messages. This is the subscriber
// side of the manager's broadcast channel; it never touches progression state.

use crate::format::with_commas;
use crate::models::{GainedXpPosition, NotificationSettings};
use crate::state::ProgressChange;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// What a notification announces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    ChallengeComplete,
    LevelUp,

    /// Floating label drawn next to the caret
    GainedXp { position: GainedXpPosition },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub content: String,
}

/// Build the notification for a change, if the settings allow one.
pub fn notification_for(change: &ProgressChange, settings: &NotificationSettings) -> Option<Notification> {
    match change {
        ProgressChange::ChallengeCompleted { name, xp_reward, .. }
            if settings.show_complete_challenge_notification =>
        {
            Some(Notification {
                kind: NotificationKind::ChallengeComplete,
                title: format!("{} completed!", name),
                content: format!("Reward: {} XP", with_commas(*xp_reward)),
            })
        }
        ProgressChange::LevelUp {
            level,
            nickname,
            xp_for_next_level,
        } if settings.show_level_up_notification => {
            let display_level = with_commas(*level as u64 + 1);
            let content = match xp_for_next_level {
                Some(xp) => format!(
                    "Congratulations {}! You are now level {}. You need {} XP to reach the next level.",
                    nickname,
                    display_level,
                    with_commas(*xp)
                ),
                None => format!(
                    "Congratulations {}! You are now level {}, the highest level.",
                    nickname, display_level
                ),
            };
            Some(Notification {
                kind: NotificationKind::LevelUp,
                title: "Level up!".to_string(),
                content,
            })
        }
        ProgressChange::XpGained { amount, .. } if settings.show_gained_xp => Some(Notification {
            kind: NotificationKind::GainedXp {
                position: settings.gained_xp_position,
            },
            title: format!("+{} XP", with_commas(*amount)),
            content: String::new(),
        }),
        _ => None,
    }
}

/// Collects notifications from a manager subscription
pub struct Notifier {
    rx: broadcast::Receiver<ProgressChange>,
    settings: NotificationSettings,
}

impl Notifier {
    pub fn new(rx: broadcast::Receiver<ProgressChange>, settings: NotificationSettings) -> Self {
        Self { rx, settings }
    }

    /// Take every notification produced since the last call, without blocking.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut notifications = Vec::new();

        loop {
            match self.rx.try_recv() {
                Ok(change) => notifications.extend(notification_for(&change, &self.settings)),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Notification listener lagged, skipped {} changes", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        notifications
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }
}
