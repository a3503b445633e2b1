use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::event::{self, Event};
use ratatui::{backend::CrosstermBackend, text::Line, Frame, Terminal};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use quotawatch_core::config::Settings;
use quotawatch_core::refresh::{ControllerView, RefreshHandle, RefreshRunner};
use quotawatch_core::usage::UsageFetcher;

use super::components::{Header, HelpPopup, StatusBar};
use super::key_handler::{resolve_key, KeyAction};
use super::shutdown::ShutdownSignal;
use super::{Body, Layout, Theme};

/// Spinner animation frames
pub const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const SPINNER_STEP: Duration = Duration::from_millis(150);

/// Theme-dependent text built once at startup
pub struct Chrome {
    pub theme: Theme,
    pub header: Vec<Line<'static>>,
    pub help: Line<'static>,
}

impl Chrome {
    pub fn new(theme: Theme) -> Self {
        Self {
            header: Header::lines(&theme),
            help: StatusBar::help_line(&theme),
            theme,
        }
    }
}

/// Main application
pub struct App {
    settings: Settings,
    chrome: Chrome,
    layout: Layout,
    show_help: bool,
    running: bool,
    spinner_frame: usize,
    last_spinner_update: Instant,
}

impl App {
    /// Create a new application
    pub fn new(settings: Settings) -> Self {
        let theme = Theme::resolve(&settings.ui);
        Self {
            settings,
            chrome: Chrome::new(theme),
            layout: Layout::new(),
            show_help: false,
            running: true,
            spinner_frame: 0,
            last_spinner_update: Instant::now(),
        }
    }

    /// Run the application until the user quits
    pub async fn run(&mut self, fetcher: Arc<dyn UsageFetcher>) -> Result<()> {
        let shutdown = ShutdownSignal::listen()?;

        // Setup terminal
        crossterm::terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)
            .context("Failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Start the refresh loop; the first fetch is issued immediately
        let handle = RefreshRunner::new(self.settings.controller_config(), fetcher).start();
        info!(
            "Dashboard started (interval {:?}, endpoint {})",
            self.settings.refresh_interval(),
            self.settings.endpoint
        );

        let result = self.main_loop(&mut terminal, &handle, &shutdown);

        // Restore terminal
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )?;
        terminal.show_cursor()?;

        handle.shutdown().await?;
        info!("Dashboard stopped");
        result
    }

    fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        handle: &RefreshHandle,
        shutdown: &ShutdownSignal,
    ) -> Result<()> {
        while self.running {
            self.check_shutdown(shutdown);
            if !self.running {
                break;
            }

            let view = handle.view();
            terminal.draw(|frame| self.draw(frame, &view))?;

            self.tick_spinner();

            // Handle events with timeout
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    self.apply(resolve_key(key, self.show_help), handle);
                }
            }
        }
        Ok(())
    }

    fn draw(&self, frame: &mut Frame, view: &ControllerView) {
        let now = Utc::now();
        let theme = &self.chrome.theme;
        let body = Body::from_view(view, now);

        let content_width = self.layout.content(frame.area()).width;
        let areas = self
            .layout
            .calculate(frame.area(), body.height(content_width));

        Header::render(frame, areas.header, &self.chrome.header);
        body.render(frame, areas.body, theme);

        let status = StatusBar::status_text(view, self.spinner_char(), now);
        StatusBar::render(
            frame,
            areas.footer,
            &self.chrome.help,
            &status,
            view.refresh_interval,
            theme,
        );

        if self.show_help {
            let popup_area = self.layout.popup_area(frame.area(), 60, 60);
            HelpPopup::render(frame, popup_area, theme);
        }
    }

    fn apply(&mut self, action: KeyAction, handle: &RefreshHandle) {
        match action {
            KeyAction::None => {}
            KeyAction::Refresh => {
                if !handle.refresh() {
                    debug!("Refresh request dropped");
                }
            }
            KeyAction::Quit => self.running = false,
            KeyAction::ToggleHelp => self.show_help = !self.show_help,
            KeyAction::CloseHelp => self.show_help = false,
        }
    }

    /// Stop the loop once a termination signal arrived
    fn check_shutdown(&mut self, shutdown: &ShutdownSignal) {
        if shutdown.is_triggered() {
            self.running = false;
        }
    }

    /// Advance the spinner animation frame (time-based, ~150ms per frame)
    fn tick_spinner(&mut self) {
        if self.last_spinner_update.elapsed() >= SPINNER_STEP {
            self.last_spinner_update = Instant::now();
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        }
    }

    fn spinner_char(&self) -> char {
        SPINNER_FRAMES[self.spinner_frame]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotawatch_core::usage::{UsageSnapshot, UsageWindow};
    use ratatui::backend::TestBackend;

    fn app() -> App {
        App::new(Settings::default())
    }

    fn render(app: &App, view: &ControllerView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(70, 24)).unwrap();
        terminal.draw(|frame| app.draw(frame, view)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_draw_waiting_state() {
        let app = app();
        let view = ControllerView {
            refresh_interval: Duration::from_secs(30),
            ..ControllerView::default()
        };
        let screen = render(&app, &view);
        assert!(screen.contains("Claude OAuth Usage"));
        assert!(screen.contains("waiting for first sample"));
        assert!(screen.contains("interval 30s"));
    }

    #[test]
    fn test_draw_chart() {
        let app = app();
        let view = ControllerView {
            snapshot: Some(Arc::new(UsageSnapshot {
                five_hour: Some(UsageWindow {
                    utilization: Some(42.0),
                    resets_at: None,
                }),
                seven_day: None,
            })),
            last_updated: Some(Utc::now()),
            refresh_interval: Duration::from_secs(30),
            ..ControllerView::default()
        };
        let screen = render(&app, &view);
        assert!(screen.contains("Current"));
        assert!(screen.contains("42.0%"));
        assert!(!screen.contains("Weekly"));
        assert!(screen.contains("updated right now"));
    }

    #[test]
    fn test_shutdown_signal_stops_loop() {
        let mut app = app();
        let shutdown = ShutdownSignal::new();

        app.check_shutdown(&shutdown);
        assert!(app.running);

        shutdown.trigger();
        app.check_shutdown(&shutdown);
        assert!(!app.running);
    }

    #[test]
    fn test_spinner_wraps() {
        let mut app = app();
        for _ in 0..SPINNER_FRAMES.len() {
            app.last_spinner_update = Instant::now() - SPINNER_STEP;
            app.tick_spinner();
        }
        assert_eq!(app.spinner_frame, 0);
    }
}
