use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Direction, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::Duration;

use quotawatch_core::config::format_duration;
use quotawatch_core::format::human_time;
use quotawatch_core::refresh::ControllerView;

use crate::ui::Theme;

pub const TEXT_STATUS_WAITING: &str = "waiting for first sample…";
const TEXT_FETCHING: &str = "fetching latest…";
const SEPARATOR: &str = " · ";

/// Key legend shown on the left of the footer
const SHORTCUTS: &[(&str, &str)] = &[
    ("r", "refresh now"),
    ("q/ctrl+c", "quit"),
    ("?", "help"),
];

/// Footer: key legend on the left, fetch status and interval on the right
pub struct StatusBar;

impl StatusBar {
    /// Build the key legend; called once at startup
    pub fn help_line(theme: &Theme) -> Line<'static> {
        let key_style = theme.accent_hi().add_modifier(Modifier::BOLD);
        let mut spans = Vec::with_capacity(SHORTCUTS.len() * 4);
        for (i, (key, desc)) in SHORTCUTS.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(SEPARATOR, theme.muted()));
            }
            spans.push(Span::styled(*key, key_style));
            spans.push(Span::raw(" "));
            spans.push(Span::styled(*desc, theme.muted()));
        }
        Line::from(spans)
    }

    /// Status text: spinner while fetching, age of the last sample, or waiting
    pub fn status_text(view: &ControllerView, spinner: char, now: DateTime<Utc>) -> String {
        if view.loading {
            return format!("{} {}", spinner, TEXT_FETCHING);
        }
        match view.last_updated {
            Some(at) => human_time(at, now),
            None => TEXT_STATUS_WAITING.to_string(),
        }
    }

    /// Render the footer line
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        help: &Line<'static>,
        status: &str,
        interval: Duration,
        theme: &Theme,
    ) {
        let status_style = theme.muted().add_modifier(Modifier::ITALIC);
        let right = Line::from(vec![
            Span::styled(status.to_string(), status_style),
            Span::styled(SEPARATOR, theme.muted()),
            Span::styled(
                format!("interval {}", format_duration(interval)),
                status_style,
            ),
        ]);
        let right_width = right.width() as u16;

        let columns = ratatui::layout::Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(right_width)])
            .split(area);

        frame.render_widget(Paragraph::new(help.clone()), columns[0]);
        frame.render_widget(Paragraph::new(right), columns[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_status_waiting() {
        let view = ControllerView::default();
        assert_eq!(StatusBar::status_text(&view, '⠋', now()), TEXT_STATUS_WAITING);
    }

    #[test]
    fn test_status_fetching_wins() {
        let view = ControllerView {
            loading: true,
            last_updated: Some(now()),
            ..ControllerView::default()
        };
        assert_eq!(StatusBar::status_text(&view, '⠋', now()), "⠋ fetching latest…");
    }

    #[test]
    fn test_status_last_updated() {
        let view = ControllerView {
            last_updated: Some(now() - chrono::TimeDelta::minutes(3)),
            snapshot: Some(Arc::default()),
            ..ControllerView::default()
        };
        assert_eq!(StatusBar::status_text(&view, '⠋', now()), "updated 3m ago");
    }

    #[test]
    fn test_help_line() {
        let line = StatusBar::help_line(&Theme::default());
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "r refresh now · q/ctrl+c quit · ? help");
    }
}
