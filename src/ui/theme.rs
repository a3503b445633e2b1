//! Color palette and style toggles, resolved once at startup.

use ratatui::style::{Color, Modifier, Style};

use quotawatch_core::config::UiSettings;

const ACCENT: Color = Color::Rgb(0xd7, 0x77, 0x57);
const ACCENT_HI: Color = Color::Rgb(0xf0, 0xa8, 0x89);
const MUTED: Color = Color::Rgb(0xb0, 0x9a, 0x90);
const ERROR: Color = Color::Rgb(0xff, 0x7b, 0x7b);
const TRACK: Color = Color::Rgb(0x3c, 0x3c, 0x3c);
const WHITE: Color = Color::Rgb(0xff, 0xff, 0xff);

/// Presentation toggles threaded into every component
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Theme {
    pub no_color: bool,
    pub high_contrast: bool,
}

impl Theme {
    /// Combine settings/CLI toggles with the `NO_COLOR` convention
    pub fn resolve(ui: &UiSettings) -> Self {
        let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self {
            no_color: ui.no_color || no_color_env,
            high_contrast: ui.high_contrast,
        }
    }

    fn fg(&self, color: Color) -> Style {
        if self.no_color {
            Style::default()
        } else {
            Style::default().fg(color)
        }
    }

    fn accent_color(&self) -> Color {
        if self.high_contrast {
            Color::Yellow
        } else {
            ACCENT
        }
    }

    fn muted_color(&self) -> Color {
        if self.high_contrast {
            Color::White
        } else {
            MUTED
        }
    }

    pub fn accent(&self) -> Style {
        self.fg(self.accent_color())
    }

    pub fn accent_hi(&self) -> Style {
        self.fg(if self.high_contrast {
            Color::LightYellow
        } else {
            ACCENT_HI
        })
    }

    pub fn muted(&self) -> Style {
        let style = self.fg(self.muted_color());
        if self.no_color {
            style.add_modifier(Modifier::DIM)
        } else {
            style
        }
    }

    pub fn error(&self) -> Style {
        let style = self.fg(if self.high_contrast {
            Color::LightRed
        } else {
            ERROR
        });
        style.add_modifier(Modifier::BOLD)
    }

    /// Bold white text for labels and values
    pub fn strong(&self) -> Style {
        self.fg(WHITE).add_modifier(Modifier::BOLD)
    }

    /// Banner title: white on the accent color
    pub fn title(&self) -> Style {
        if self.no_color {
            Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default()
                .fg(WHITE)
                .bg(self.accent_color())
                .add_modifier(Modifier::BOLD)
        }
    }

    /// Filled part of a utilization bar
    pub fn bar_fill(&self) -> Style {
        self.accent()
    }

    /// Unfilled part of a utilization bar
    pub fn bar_track(&self) -> Style {
        if self.no_color {
            Style::default().add_modifier(Modifier::DIM)
        } else if self.high_contrast {
            Style::default().fg(Color::Gray)
        } else {
            Style::default().fg(TRACK)
        }
    }

    /// Placeholder bars while loading
    pub fn skeleton(&self) -> Style {
        self.fg(if self.high_contrast { Color::Gray } else { TRACK })
            .add_modifier(Modifier::DIM)
    }

    pub fn border(&self) -> Style {
        self.accent()
    }

    pub fn error_border(&self) -> Style {
        self.fg(if self.high_contrast {
            Color::LightRed
        } else {
            ERROR
        })
    }
}
