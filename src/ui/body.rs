//! Chooses what the main area shows for a given controller view.

use chrono::{DateTime, Utc};
use ratatui::{layout::Rect, style::Modifier, text::Span, widgets::Paragraph, Frame};

use quotawatch_core::refresh::ControllerView;
use quotawatch_core::usage::{summarize, UsageRow, TEXT_NO_DATA};

use super::components::{ErrorBox, UsageChart};
use super::Theme;

/// Content of the main area, in priority order
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Last fetch failed; one-line summary
    Error(String),
    /// Nothing to show yet, first fetch pending
    Skeleton,
    /// A sample arrived but carried no windows, or a soft error
    NoData,
    Chart(Vec<UsageRow>),
}

impl Body {
    pub fn from_view(view: &ControllerView, now: DateTime<Utc>) -> Self {
        if let Some(err) = &view.last_error {
            if err.is_soft() {
                return Self::NoData;
            }
            return Self::Error(summarize(err));
        }
        let rows = view.rows(now);
        if !rows.is_empty() {
            return Self::Chart(rows);
        }
        if view.loading || view.last_updated.is_none() {
            Self::Skeleton
        } else {
            Self::NoData
        }
    }

    /// Rows needed to render at `width`
    pub fn height(&self, width: u16) -> u16 {
        match self {
            Self::Error(message) => ErrorBox::height(message, width),
            Self::Skeleton => UsageChart::height(2),
            Self::NoData => 1,
            Self::Chart(rows) => UsageChart::height(rows.len()),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        match self {
            Self::Error(message) => ErrorBox::render(frame, area, message, theme),
            Self::Skeleton => UsageChart::render_skeleton(frame, area, theme),
            Self::NoData => frame.render_widget(
                Paragraph::new(Span::styled(
                    TEXT_NO_DATA,
                    theme.muted().add_modifier(Modifier::ITALIC),
                )),
                area,
            ),
            Self::Chart(rows) => UsageChart::render(frame, area, rows, theme),
        }
    }
}
