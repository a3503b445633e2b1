//! Refresh state machine as a pure reducer.
//!
//! [`Controller::handle`] consumes one [`Event`] and returns the
//! [`Command`]s to execute. It never performs I/O; the runner executes the
//! commands and feeds results back in as events.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::RngExt;
use tracing::{debug, error, warn};

use super::backoff::{backoff_delay, fetch_timeout};
use crate::usage::{ClassifiedError, UsageRow, UsageSnapshot};

/// Identifies one fetch attempt; a fresh token is minted per fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchToken(u64);

impl std::fmt::Display for FetchToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What asked for a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// First load at startup
    Initial,
    /// Scheduled tick elapsed
    Tick,
    /// User pressed refresh
    Manual,
}

/// Input to the reducer
#[derive(Debug, Clone)]
pub enum Event {
    StartFetch(Trigger),
    FetchSucceeded {
        token: FetchToken,
        snapshot: UsageSnapshot,
    },
    FetchFailed {
        token: FetchToken,
        error: ClassifiedError,
    },
    /// Program is exiting
    Shutdown,
}

/// Side effect requested by the reducer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a fetch bounded by `timeout`
    IssueFetch { token: FetchToken, timeout: Duration },
    /// Cancel the context of an in-flight fetch
    CancelFetch { token: FetchToken },
    /// Fire `StartFetch(Tick)` after `delay`
    ScheduleTick { delay: Duration },
    /// Stop the event loop
    Exit,
}

/// Timing settings the controller needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub refresh_interval: Duration,
    pub client_timeout: Duration,
}

/// State owned by the controller; mutated only through [`Controller::handle`]
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    pub snapshot: Option<Arc<UsageSnapshot>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub loading: bool,
    pub last_error: Option<Arc<ClassifiedError>>,
    pub consecutive_failures: u32,
    pub active_fetch: Option<FetchToken>,
    /// Delay of the most recently scheduled tick
    pub next_delay: Option<Duration>,
}

/// Read-only copy of the state handed to presentation
#[derive(Debug, Clone, Default)]
pub struct ControllerView {
    pub snapshot: Option<Arc<UsageSnapshot>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub loading: bool,
    pub last_error: Option<Arc<ClassifiedError>>,
    pub consecutive_failures: u32,
    pub refresh_interval: Duration,
    pub next_delay: Option<Duration>,
}

impl ControllerView {
    /// Display rows for the current snapshot (empty before the first sample)
    pub fn rows(&self, now: DateTime<Utc>) -> Vec<UsageRow> {
        self.snapshot
            .as_ref()
            .map(|s| s.rows(now))
            .unwrap_or_default()
    }
}

/// The refresh state machine
#[derive(Debug)]
pub struct Controller {
    config: ControllerConfig,
    state: ControllerState,
    next_token: u64,
    shutting_down: bool,
}

impl Controller {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            state: ControllerState::default(),
            next_token: 0,
            shutting_down: false,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    /// Snapshot of the state for presentation
    pub fn view(&self) -> ControllerView {
        ControllerView {
            snapshot: self.state.snapshot.clone(),
            last_updated: self.state.last_updated,
            loading: self.state.loading,
            last_error: self.state.last_error.clone(),
            consecutive_failures: self.state.consecutive_failures,
            refresh_interval: self.config.refresh_interval,
            next_delay: self.state.next_delay,
        }
    }

    /// Apply one event, drawing backoff jitter from the thread RNG
    pub fn handle(&mut self, event: Event, now: DateTime<Utc>) -> Vec<Command> {
        self.handle_with_rng(event, now, &mut rand::rng())
    }

    /// Apply one event with an explicit jitter source
    pub fn handle_with_rng<R: RngExt + ?Sized>(
        &mut self,
        event: Event,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<Command> {
        if self.shutting_down {
            debug!("Refresh: ignoring {:?} during teardown", event_name(&event));
            return Vec::new();
        }

        match event {
            Event::StartFetch(trigger) => self.start_fetch(trigger),
            Event::FetchSucceeded { token, snapshot } => self.fetch_succeeded(token, snapshot, now),
            Event::FetchFailed { token, error } => self.fetch_failed(token, error, rng),
            Event::Shutdown => self.shutdown(),
        }
    }

    fn start_fetch(&mut self, trigger: Trigger) -> Vec<Command> {
        let mut commands = Vec::with_capacity(2);

        if let Some(active) = self.state.active_fetch {
            if trigger != Trigger::Manual {
                debug!("Refresh: {:?} ignored, fetch {} in flight", trigger, active);
                return commands;
            }
            debug!("Refresh: manual refresh supersedes fetch {}", active);
            commands.push(Command::CancelFetch { token: active });
        }

        self.next_token += 1;
        let token = FetchToken(self.next_token);
        self.state.active_fetch = Some(token);
        self.state.loading = true;
        self.state.last_error = None;
        self.state.next_delay = None;

        let timeout = fetch_timeout(self.config.client_timeout, self.config.refresh_interval);
        debug!("Refresh: {:?} starts fetch {} (timeout {:?})", trigger, token, timeout);
        commands.push(Command::IssueFetch { token, timeout });
        commands
    }

    fn fetch_succeeded(
        &mut self,
        token: FetchToken,
        snapshot: UsageSnapshot,
        now: DateTime<Utc>,
    ) -> Vec<Command> {
        if !self.is_current(token) {
            return Vec::new();
        }

        self.state.active_fetch = None;
        self.state.loading = false;
        self.state.consecutive_failures = 0;
        self.state.last_updated = Some(now);
        self.state.last_error = if snapshot.has_usable_windows() {
            None
        } else {
            debug!("Refresh: fetch {} returned no usable windows", token);
            Some(Arc::new(ClassifiedError::NoData))
        };
        self.state.snapshot = Some(Arc::new(snapshot));

        self.schedule(self.config.refresh_interval)
    }

    fn fetch_failed<R: RngExt + ?Sized>(
        &mut self,
        token: FetchToken,
        error: ClassifiedError,
        rng: &mut R,
    ) -> Vec<Command> {
        if !self.is_current(token) {
            return Vec::new();
        }

        self.state.active_fetch = None;
        self.state.loading = false;

        // Soft errors are shown but never counted toward backoff
        if error.is_soft() {
            debug!("Refresh: fetch {} reported {}", token, error);
            self.state.last_error = Some(Arc::new(error));
            return self.schedule(self.config.refresh_interval);
        }

        self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);

        let delay = backoff_delay(
            self.config.refresh_interval,
            self.state.consecutive_failures,
            error.retry_after(),
            rng,
        );
        if error.is_configuration() {
            // Retrying cannot fix these; the user has to change settings
            error!(
                failures = self.state.consecutive_failures,
                "Usage fetch {} rejected before sending: {}",
                token,
                error
            );
        } else {
            warn!(
                failures = self.state.consecutive_failures,
                retry_in = ?delay,
                "Usage fetch {} failed: {}",
                token,
                error
            );
        }
        self.state.last_error = Some(Arc::new(error));

        self.schedule(delay)
    }

    fn shutdown(&mut self) -> Vec<Command> {
        self.shutting_down = true;
        let mut commands = Vec::with_capacity(2);
        if let Some(token) = self.state.active_fetch.take() {
            self.state.loading = false;
            commands.push(Command::CancelFetch { token });
        }
        commands.push(Command::Exit);
        commands
    }

    fn schedule(&mut self, delay: Duration) -> Vec<Command> {
        self.state.next_delay = Some(delay);
        vec![Command::ScheduleTick { delay }]
    }

    /// Stale results (superseded or canceled fetches) are dropped here
    fn is_current(&self, token: FetchToken) -> bool {
        if self.state.active_fetch == Some(token) {
            return true;
        }
        debug!(
            "Refresh: discarding stale result for fetch {} (active: {:?})",
            token, self.state.active_fetch
        );
        false
    }
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::StartFetch(_) => "StartFetch",
        Event::FetchSucceeded { .. } => "FetchSucceeded",
        Event::FetchFailed { .. } => "FetchFailed",
        Event::Shutdown => "Shutdown",
    }
}
