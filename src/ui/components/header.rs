//! Logo mark and title banner.

use once_cell::sync::Lazy;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::ui::Theme;

pub const HEADER_TITLE: &str = "Claude OAuth Usage";
pub const MARK_ART: &str = " ▐▛███▜▌ \n▝▜█████▛▘\n  ▘▘ ▝▝";

/// Horizontal padding around the title inside its banner
const TITLE_PAD: usize = 3;
/// Gap between mark and banner
const MARK_GAP: usize = 2;

static MARK_LINES: Lazy<Vec<&'static str>> = Lazy::new(|| MARK_ART.lines().collect());
static MARK_WIDTH: Lazy<usize> =
    Lazy::new(|| MARK_LINES.iter().map(|l| l.width()).max().unwrap_or(0));

/// Header widget
pub struct Header;

impl Header {
    pub const HEIGHT: u16 = 3;

    /// Build the header lines; called once at startup
    pub fn lines(theme: &Theme) -> Vec<Line<'static>> {
        let banner_width = HEADER_TITLE.width() + TITLE_PAD * 2;
        let pad = " ".repeat(TITLE_PAD);

        (0..Self::HEIGHT as usize)
            .map(|i| {
                let mark = MARK_LINES.get(i).copied().unwrap_or("");
                let banner = if i == 1 {
                    format!("{}{}{}", pad, HEADER_TITLE, pad)
                } else {
                    " ".repeat(banner_width)
                };
                Line::from(vec![
                    Span::styled(format!("{:w$}", mark, w = *MARK_WIDTH), theme.accent()),
                    Span::raw(" ".repeat(MARK_GAP)),
                    Span::styled(banner, theme.title()),
                ])
            })
            .collect()
    }

    /// Render prebuilt header lines
    pub fn render(frame: &mut Frame, area: Rect, lines: &[Line<'static>]) {
        frame.render_widget(Paragraph::new(lines.to_vec()), area);
    }
}
