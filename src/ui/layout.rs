use ratatui::layout::{Constraint, Direction, Rect};

use super::components::Header;

/// Page padding (columns on each side)
const PAGE_PAD_X: u16 = 2;
/// Page padding (rows above and below)
const PAGE_PAD_Y: u16 = 1;
/// Blank rows between header, body and footer
const SECTION_GAP: u16 = 1;

/// Calculated layout areas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutAreas {
    pub header: Rect,
    pub body: Rect,
    pub footer: Rect,
}

/// Layout configuration for the dashboard
#[derive(Debug, Clone, Default)]
pub struct Layout;

impl Layout {
    pub fn new() -> Self {
        Self
    }

    /// Padded content area inside the terminal
    pub fn content(&self, area: Rect) -> Rect {
        Rect {
            x: area.x.saturating_add(PAGE_PAD_X),
            y: area.y.saturating_add(PAGE_PAD_Y),
            width: area.width.saturating_sub(PAGE_PAD_X * 2),
            height: area.height.saturating_sub(PAGE_PAD_Y * 2),
        }
    }

    /// Calculate the main areas
    /// Layout: [Header]
    ///         [Body (body_height rows)]
    ///         [Footer]
    pub fn calculate(&self, area: Rect, body_height: u16) -> LayoutAreas {
        let content = self.content(area);

        let chunks = ratatui::layout::Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(Header::HEIGHT),
                Constraint::Length(SECTION_GAP),
                Constraint::Length(body_height),
                Constraint::Length(SECTION_GAP),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(content);

        LayoutAreas {
            header: chunks[0],
            body: chunks[2],
            footer: chunks[4],
        }
    }

    /// Calculate a centered popup area
    pub fn popup_area(&self, area: Rect, width_pct: u16, height_pct: u16) -> Rect {
        let popup_layout = ratatui::layout::Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - height_pct) / 2),
                Constraint::Percentage(height_pct),
                Constraint::Percentage((100 - height_pct) / 2),
            ])
            .split(area);

        ratatui::layout::Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - width_pct) / 2),
                Constraint::Percentage(width_pct),
                Constraint::Percentage((100 - width_pct) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_stacks_sections() {
        let layout = Layout::new();
        let areas = layout.calculate(Rect::new(0, 0, 80, 30), 9);

        assert_eq!(areas.header, Rect::new(2, 1, 76, 3));
        assert_eq!(areas.body, Rect::new(2, 5, 76, 9));
        assert_eq!(areas.footer, Rect::new(2, 15, 76, 1));
    }

    #[test]
    fn test_tiny_terminal_does_not_panic() {
        let layout = Layout::new();
        let areas = layout.calculate(Rect::new(0, 0, 3, 2), 9);
        assert_eq!(areas.body.width, 0);
    }

    #[test]
    fn test_popup_area() {
        let layout = Layout::new();
        let area = Rect::new(0, 0, 100, 50);
        let popup = layout.popup_area(area, 60, 40);

        // Popup should be centered
        assert!(popup.x > 0);
        assert!(popup.y > 0);
        assert!(popup.x + popup.width < area.width);
        assert!(popup.y + popup.height < area.height);
    }
}
