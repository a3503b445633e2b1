use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::ui::Theme;

/// Help popup widget
pub struct HelpPopup;

impl HelpPopup {
    /// Render the help popup
    pub fn render(frame: &mut Frame, area: Rect, theme: &Theme) {
        frame.render_widget(Clear, area);

        let heading = theme.accent().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("quotawatch - Claude OAuth usage", heading)),
            Line::from(""),
            Self::help_line("r / R", "Refresh now", theme),
            Self::help_line("?", "Toggle this help", theme),
            Self::help_line("q / Esc", "Quit", theme),
            Self::help_line("Ctrl+c", "Quit", theme),
            Line::from(""),
            Line::from(Span::styled(
                "Polling backs off after failures and honors Retry-After.",
                theme.muted(),
            )),
            Line::from(""),
            Line::from(Span::styled("Press any key to close", theme.muted())),
        ];

        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme.border());

        frame.render_widget(Paragraph::new(help_text).block(block), area);
    }

    fn help_line(key: &str, description: &str, theme: &Theme) -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("  {:12}", key),
                theme.accent_hi().add_modifier(Modifier::BOLD),
            ),
            Span::styled(description.to_string(), theme.strong()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_line() {
        let line = HelpPopup::help_line("r / R", "Refresh now", &Theme::default());
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[0].content, "  r / R       ");
    }
}
