//! Pure display helpers: percentages, durations, reset countdowns.

mod math;
mod time;

pub use math::clamp;
pub use time::{
    format_reset, friendly_duration, human_time, TEXT_LT_MINUTE, TEXT_RESET_SOON,
    TEXT_UPDATED_NOW,
};

/// Format a utilization percentage with a fixed width, e.g. " 42.0%"
pub fn format_percent(percent: f64) -> String {
    format!("{:5.1}%", percent)
}

/// Shorten `s` to at most `max_chars` characters, ending with an ellipsis when cut.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    let count = s.chars().count();
    if count <= max_chars {
        return s.to_string();
    }
    if max_chars == 1 {
        return s.chars().take(1).collect();
    }
    let mut out: String = s.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}
