//! Utilization bars for the two quota windows.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use quotawatch_core::format::format_percent;
use quotawatch_core::usage::{UsageRow, LABEL_CURRENT, LABEL_WEEKLY};

use crate::ui::Theme;

/// Width reserved for the percentage column ("100.0%")
const VALUE_WIDTH: usize = 6;
const MIN_LABEL_WIDTH: usize = 6;
const MIN_BAR_WIDTH: usize = 8;
/// Separator (1) between label and bar, plus two spaces before the value
const LAYOUT_SPACING: usize = 3;

/// Horizontal padding inside the chart border
const PAD_X: u16 = 2;
/// Vertical padding inside the chart border
const PAD_Y: u16 = 1;

const SEPARATOR: &str = " · ";

const SKELETON_RESET: &str = "resets at …";
const SKELETON_LEFT: &str = "... left";
const SKELETON_VALUE: &str = "···";

/// Column widths for one chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarMetrics {
    pub label_width: usize,
    pub value_width: usize,
    pub bar_width: usize,
}

impl BarMetrics {
    /// Split `total_width` between label, bar and value columns.
    ///
    /// The bar keeps at least `MIN_BAR_WIDTH` cells while the label shrinks.
    pub fn compute(total_width: usize, rows: &[UsageRow]) -> Self {
        let available = total_width
            .saturating_sub(VALUE_WIDTH + LAYOUT_SPACING)
            .max(1);
        let desired_label = rows
            .iter()
            .map(|r| r.label.width())
            .fold(MIN_LABEL_WIDTH, usize::max);
        let mut label_width = desired_label.min(available.saturating_sub(MIN_BAR_WIDTH));
        if label_width == 0 && available > 1 {
            label_width = 1;
        }
        let bar_width = available.saturating_sub(label_width).max(1);

        Self {
            label_width,
            value_width: VALUE_WIDTH,
            bar_width,
        }
    }
}

/// Number of filled and empty cells for a bar at `percent`
pub fn bar_cells(width: usize, percent: f64) -> (usize, usize) {
    let ratio = if percent.is_nan() {
        0.0
    } else {
        (percent / 100.0).clamp(0.0, 1.0)
    };
    let filled = ((ratio * width as f64).round() as usize).min(width);
    (filled, width - filled)
}

/// Styles for one rendering pass (real data or loading skeleton)
struct ChartStyles {
    label: Style,
    value: Style,
    fill: Style,
    track: Style,
    reset: Style,
    remaining: Style,
}

impl ChartStyles {
    fn data(theme: &Theme) -> Self {
        Self {
            label: theme.strong(),
            value: theme.strong(),
            fill: theme.bar_fill(),
            track: theme.bar_track(),
            reset: theme.muted().add_modifier(Modifier::ITALIC),
            remaining: theme.accent_hi(),
        }
    }

    fn skeleton(theme: &Theme) -> Self {
        Self {
            label: theme.muted(),
            value: theme.muted(),
            fill: theme.skeleton(),
            track: theme.bar_track(),
            reset: theme.muted(),
            remaining: theme.muted(),
        }
    }
}

/// Bordered chart of utilization bars
pub struct UsageChart;

impl UsageChart {
    /// Total height for `row_count` rows including border and padding
    pub fn height(row_count: usize) -> u16 {
        if row_count == 0 {
            return 0;
        }
        // Bar + meta line per row, blank line between rows
        let content = (row_count * 3 - 1) as u16;
        content + 2 + PAD_Y * 2
    }

    /// Render real usage rows
    pub fn render(frame: &mut Frame, area: Rect, rows: &[UsageRow], theme: &Theme) {
        let width = Self::inner_width(area);
        let lines = Self::lines(rows, width, &ChartStyles::data(theme), false);
        Self::render_box(frame, area, lines, theme);
    }

    /// Render placeholder rows while the first sample is loading
    pub fn render_skeleton(frame: &mut Frame, area: Rect, theme: &Theme) {
        let width = Self::inner_width(area);
        let lines = Self::lines(
            &Self::skeleton_rows(),
            width,
            &ChartStyles::skeleton(theme),
            true,
        );
        Self::render_box(frame, area, lines, theme);
    }

    fn render_box(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>, theme: &Theme) {
        if area.height < 3 || area.width < 10 {
            return;
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme.border())
            .padding(Padding::new(PAD_X, PAD_X, PAD_Y, PAD_Y));

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn inner_width(area: Rect) -> usize {
        area.width.saturating_sub(2 + PAD_X * 2) as usize
    }

    fn skeleton_rows() -> Vec<UsageRow> {
        [(LABEL_CURRENT, 65.0), (LABEL_WEEKLY, 40.0)]
            .into_iter()
            .map(|(label, percent)| UsageRow {
                label,
                percent,
                reset: SKELETON_RESET.to_string(),
                remaining: SKELETON_LEFT.to_string(),
            })
            .collect()
    }

    /// Lay out bar and meta lines for every row
    fn lines(
        rows: &[UsageRow],
        width: usize,
        styles: &ChartStyles,
        skeleton: bool,
    ) -> Vec<Line<'static>> {
        let metrics = BarMetrics::compute(width, rows);
        let mut lines = Vec::with_capacity(rows.len() * 3);

        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                lines.push(Line::from(""));
            }
            lines.push(Self::bar_line(row, &metrics, styles, skeleton));
            if let Some(meta) = Self::meta_line(row, &metrics, styles) {
                lines.push(meta);
            }
        }
        lines
    }

    /// " Current ██████░░░░░░   42.0%"
    fn bar_line(
        row: &UsageRow,
        metrics: &BarMetrics,
        styles: &ChartStyles,
        skeleton: bool,
    ) -> Line<'static> {
        let (filled, empty) = bar_cells(metrics.bar_width, row.percent);
        let value = if skeleton {
            SKELETON_VALUE.to_string()
        } else {
            format_percent(row.percent)
        };

        Line::from(vec![
            Span::styled(fit(row.label, metrics.label_width), styles.label),
            Span::raw(" "),
            Span::styled("█".repeat(filled), styles.fill),
            Span::styled("░".repeat(empty), styles.track),
            Span::raw("  "),
            Span::styled(
                format!("{:>w$}", value, w = metrics.value_width),
                styles.value,
            ),
        ])
    }

    /// Reset time and remaining time under the bar, aligned with it
    fn meta_line(row: &UsageRow, metrics: &BarMetrics, styles: &ChartStyles) -> Option<Line<'static>> {
        let mut spans = vec![Span::raw(" ".repeat(metrics.label_width + 1))];
        if !row.reset.is_empty() {
            spans.push(Span::styled(row.reset.clone(), styles.reset));
        }
        if !row.remaining.is_empty() {
            if spans.len() > 1 {
                spans.push(Span::styled(SEPARATOR, styles.reset));
            }
            spans.push(Span::styled(row.remaining.clone(), styles.remaining));
        }
        (spans.len() > 1).then(|| Line::from(spans))
    }
}

/// Pad or cut `text` to exactly `width` cells
fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push_str(&" ".repeat(width - used));
    out
}
