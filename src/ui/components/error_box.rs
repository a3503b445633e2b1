use ratatui::{
    layout::Rect,
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::ui::Theme;

/// Bordered box showing the last fetch error
pub struct ErrorBox;

impl ErrorBox {
    /// Height needed to show `message` wrapped into `width` columns
    pub fn height(message: &str, width: u16) -> u16 {
        let inner = width.saturating_sub(4).max(1) as usize;
        let lines = message.width().div_ceil(inner).max(1);
        lines as u16 + 2
    }

    pub fn render(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme.error_border())
            .padding(Padding::horizontal(1));

        let paragraph = Paragraph::new(message.to_string())
            .style(theme.error())
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(paragraph, area);
    }
}
