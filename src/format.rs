// Text formatting for the dashboard and notifications

use crate::state::DashboardSnapshot;

/// Width of the rendered progress bar, in cells.
pub const PROGRESS_BAR_WIDTH: usize = 20;

/// Format a number with comma thousands separators, e.g. `123,456,789`.
pub fn with_commas(number: u64) -> String {
    let digits = number.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }

    formatted
}

/// Whole percentage for a fraction in `[0, 1]`, truncated toward zero.
pub fn percent(fraction: f64) -> u32 {
    (fraction.clamp(0.0, 1.0) * 100.0) as u32
}

/// Render a fraction as a fixed-width bar such as `[#####---------------]`.
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64) as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Multi-line dashboard text for a snapshot.
pub fn render_dashboard(snapshot: &DashboardSnapshot) -> String {
    let nickname = if snapshot.nickname.is_empty() {
        "(no nickname)"
    } else {
        snapshot.nickname.as_str()
    };

    let level_line = if snapshot.is_max_level() {
        format!("Level {} (max)", with_commas(snapshot.display_level as u64))
    } else {
        format!(
            "Level {} -> {}",
            with_commas(snapshot.display_level as u64),
            with_commas(snapshot.display_level as u64 + 1)
        )
    };

    let progress_line = match snapshot.xp_for_next_level {
        Some(width) => format!(
            "{} {} % ({} / {} XP)",
            progress_bar(snapshot.progress_fraction, PROGRESS_BAR_WIDTH),
            percent(snapshot.progress_fraction),
            with_commas(snapshot.xp_into_level),
            with_commas(width)
        ),
        None => format!(
            "{} 100 % ({} XP past the last level)",
            progress_bar(1.0, PROGRESS_BAR_WIDTH),
            with_commas(snapshot.xp_into_level)
        ),
    };

    format!(
        "{}\n{}\n{}\nTotal XP: {}\nCompleted challenges: {}",
        nickname,
        level_line,
        progress_line,
        with_commas(snapshot.total_xp),
        with_commas(snapshot.completed_challenges as u64)
    )
}
