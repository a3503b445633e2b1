//! Async driver for the refresh [`Controller`].
//!
//! The runner task is the single owner of the controller. It multiplexes UI
//! control messages, fetch outcomes and one re-armable tick timer, feeds each
//! into the reducer, executes the returned commands and publishes a fresh
//! [`ControllerView`] on a watch channel after every step.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::controller::{
    Command, Controller, ControllerConfig, ControllerView, Event, FetchToken, Trigger,
};
use crate::usage::{
    ClassifiedError, FetchContext, UsageFetcher, UsageSnapshot, MAX_RETRY_AFTER,
};

/// Sender half of the view channel
pub type ViewSender = watch::Sender<ControllerView>;
/// Receiver half of the view channel
pub type ViewReceiver = watch::Receiver<ControllerView>;

/// Message sent from the UI to the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Fetch now, superseding any in-flight fetch
    Refresh,
    /// Cancel everything and stop
    Quit,
}

/// Result of one spawned fetch, tagged with its token
#[derive(Debug)]
struct FetchOutcome {
    token: FetchToken,
    result: Result<UsageSnapshot, ClassifiedError>,
}

/// Owns the controller and the fetcher; consumed by [`RefreshRunner::start`]
pub struct RefreshRunner {
    controller: Controller,
    fetcher: Arc<dyn UsageFetcher>,
}

/// Timer and in-flight bookkeeping local to the run loop
struct LoopState {
    tick: Pin<Box<Sleep>>,
    tick_armed: bool,
    inflight: Option<(FetchToken, CancellationToken)>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
}

impl RefreshRunner {
    pub fn new(config: ControllerConfig, fetcher: Arc<dyn UsageFetcher>) -> Self {
        Self {
            controller: Controller::new(config),
            fetcher,
        }
    }

    /// Start the refresh loop in a background task.
    ///
    /// The initial fetch is issued immediately.
    pub fn start(self) -> RefreshHandle {
        let (control_tx, control_rx) = mpsc::channel(16);
        let (view_tx, view_rx) = watch::channel(self.controller.view());

        let task = tokio::spawn(async move {
            self.run(control_rx, view_tx).await;
        });

        RefreshHandle {
            control_tx,
            view_rx,
            task,
        }
    }

    /// Run the event loop until a shutdown command is executed
    async fn run(mut self, mut control_rx: mpsc::Receiver<ControlMessage>, view_tx: ViewSender) {
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
        let mut state = LoopState {
            tick: Box::pin(tokio::time::sleep(Duration::ZERO)),
            tick_armed: false,
            inflight: None,
            outcome_tx,
        };

        info!(
            "Refresh loop started (interval {:?})",
            self.controller.config().refresh_interval
        );

        let mut event = Event::StartFetch(Trigger::Initial);
        loop {
            if self.step(event, &mut state, &view_tx) {
                break;
            }

            event = tokio::select! {
                msg = control_rx.recv() => match msg {
                    Some(ControlMessage::Refresh) => Event::StartFetch(Trigger::Manual),
                    // Every handle dropped counts as quit
                    Some(ControlMessage::Quit) | None => Event::Shutdown,
                },
                Some(outcome) = outcome_rx.recv() => {
                    if matches!(&state.inflight, Some((token, _)) if *token == outcome.token) {
                        state.inflight = None;
                    }
                    match outcome.result {
                        Ok(snapshot) => Event::FetchSucceeded { token: outcome.token, snapshot },
                        Err(error) => Event::FetchFailed { token: outcome.token, error },
                    }
                }
                () = state.tick.as_mut(), if state.tick_armed => {
                    state.tick_armed = false;
                    Event::StartFetch(Trigger::Tick)
                }
            };
        }

        info!("Refresh loop stopped");
    }

    /// Feed one event to the controller and execute its commands.
    ///
    /// Returns true once the loop should exit.
    fn step(&mut self, event: Event, state: &mut LoopState, view_tx: &ViewSender) -> bool {
        let commands = self.controller.handle(event, Utc::now());
        let mut exit = false;

        for command in commands {
            match command {
                Command::IssueFetch { token, timeout } => {
                    // A pending tick never coexists with an in-flight fetch
                    state.tick_armed = false;
                    let cancel = CancellationToken::new();
                    state.inflight = Some((token, cancel.clone()));
                    self.spawn_fetch(token, timeout, cancel, state.outcome_tx.clone());
                }
                Command::CancelFetch { token } => match state.inflight.take() {
                    Some((active, cancel)) if active == token => {
                        debug!("Refresh: canceling fetch {}", token);
                        cancel.cancel();
                    }
                    other => state.inflight = other,
                },
                Command::ScheduleTick { delay } => {
                    debug!("Refresh: next tick in {:?}", delay);
                    let now = Instant::now();
                    let deadline = now
                        .checked_add(delay)
                        .unwrap_or_else(|| now + MAX_RETRY_AFTER);
                    state.tick.as_mut().reset(deadline);
                    state.tick_armed = true;
                }
                Command::Exit => {
                    state.tick_armed = false;
                    exit = true;
                }
            }
        }

        view_tx.send_replace(self.controller.view());
        exit
    }

    /// Run one fetch in its own task, bounded by `timeout` and `cancel`
    fn spawn_fetch(
        &self,
        token: FetchToken,
        timeout: Duration,
        cancel: CancellationToken,
        outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    ) {
        let ctx = FetchContext {
            timeout,
            cancel: cancel.clone(),
        };
        let fetch = self.fetcher.fetch(ctx);

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ClassifiedError::Canceled),
                result = tokio::time::timeout(timeout, fetch) => {
                    result.unwrap_or(Err(ClassifiedError::Timeout))
                }
            };
            // The runner may already be gone during shutdown
            let _ = outcome_tx.send(FetchOutcome { token, result });
        });
    }
}

/// Handle held by the UI to drive and observe the refresh loop
pub struct RefreshHandle {
    control_tx: mpsc::Sender<ControlMessage>,
    view_rx: ViewReceiver,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Request a manual refresh; returns false if the loop is gone or busy
    pub fn refresh(&self) -> bool {
        self.control_tx.try_send(ControlMessage::Refresh).is_ok()
    }

    /// Latest published view
    pub fn view(&self) -> ControllerView {
        self.view_rx.borrow().clone()
    }

    /// Independent receiver for change notifications
    pub fn subscribe(&self) -> ViewReceiver {
        self.view_rx.clone()
    }

    /// Cancel the in-flight fetch and wait for the loop to finish
    pub async fn shutdown(self) -> Result<()> {
        // A closed channel means the loop already stopped
        let _ = self.control_tx.send(ControlMessage::Quit).await;
        self.task.await.context("Refresh task failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::{FetchFuture, UsageWindow};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted `(delay, result)` pairs and reports each call
    struct ScriptedFetcher {
        script: Mutex<VecDeque<(Duration, Result<UsageSnapshot, ClassifiedError>)>>,
        calls: mpsc::UnboundedSender<(Instant, CancellationToken)>,
    }

    impl ScriptedFetcher {
        fn new(
            script: Vec<(Duration, Result<UsageSnapshot, ClassifiedError>)>,
        ) -> (Arc<Self>, mpsc::UnboundedReceiver<(Instant, CancellationToken)>) {
            let (calls, rx) = mpsc::unbounded_channel();
            let fetcher = Arc::new(Self {
                script: Mutex::new(script.into()),
                calls,
            });
            (fetcher, rx)
        }
    }

    impl UsageFetcher for ScriptedFetcher {
        fn fetch(&self, ctx: FetchContext) -> FetchFuture {
            let _ = self.calls.send((Instant::now(), ctx.cancel.clone()));
            let next = self.script.lock().unwrap().pop_front();
            Box::pin(async move {
                let (delay, result) =
                    next.unwrap_or((Duration::from_secs(3600), Err(ClassifiedError::Canceled)));
                tokio::time::sleep(delay).await;
                result
            })
        }
    }

    fn config() -> ControllerConfig {
        ControllerConfig {
            refresh_interval: Duration::from_secs(30),
            client_timeout: Duration::from_secs(8),
        }
    }

    fn snapshot(percent: f64) -> UsageSnapshot {
        UsageSnapshot {
            five_hour: Some(UsageWindow {
                utilization: Some(percent),
                resets_at: None,
            }),
            seven_day: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_fetch_publishes_snapshot() {
        let (fetcher, mut calls) = ScriptedFetcher::new(vec![(Duration::ZERO, Ok(snapshot(42.0)))]);
        let handle = RefreshRunner::new(config(), fetcher).start();

        calls.recv().await.unwrap();
        let mut rx = handle.subscribe();
        let view = rx
            .wait_for(|v| v.last_updated.is_some())
            .await
            .unwrap()
            .clone();

        assert!(!view.loading);
        assert_eq!(view.snapshot.unwrap().five_hour_percent(), Some(42.0));
        assert_eq!(view.next_delay, Some(Duration::from_secs(30)));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_hint_schedules_exactly() {
        let (fetcher, mut calls) = ScriptedFetcher::new(vec![
            (
                Duration::ZERO,
                Err(ClassifiedError::HttpStatus {
                    code: 429,
                    body: "slow down".to_string(),
                    retry_after: Duration::from_secs(30),
                }),
            ),
            (Duration::ZERO, Ok(snapshot(10.0))),
        ]);
        let handle = RefreshRunner::new(config(), fetcher).start();

        let (first, _) = calls.recv().await.unwrap();
        let mut rx = handle.subscribe();
        let view = rx
            .wait_for(|v| v.last_error.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(view.last_error.as_deref().and_then(|e| e.status()), Some(429));
        assert_eq!(view.consecutive_failures, 1);

        let (second, _) = calls.recv().await.unwrap();
        assert_eq!(second - first, Duration::from_secs(30));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_retry_hint_keeps_loop_alive() {
        let retry_after =
            crate::usage::client::parse_retry_after("10000000000000000000", Utc::now());
        let (fetcher, mut calls) = ScriptedFetcher::new(vec![
            (
                Duration::ZERO,
                Err(ClassifiedError::HttpStatus {
                    code: 429,
                    body: "slow down".to_string(),
                    retry_after,
                }),
            ),
            (Duration::ZERO, Ok(snapshot(3.0))),
        ]);
        let handle = RefreshRunner::new(config(), fetcher).start();

        calls.recv().await.unwrap();
        let mut rx = handle.subscribe();
        let view = rx
            .wait_for(|v| v.last_error.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(view.next_delay, Some(MAX_RETRY_AFTER));

        // Manual refresh still works while the long tick is pending
        assert!(handle.refresh());
        let view = rx
            .wait_for(|v| v.last_updated.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(view.snapshot.unwrap().five_hour_percent(), Some(3.0));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_cancels_in_flight_fetch() {
        let (fetcher, mut calls) = ScriptedFetcher::new(vec![
            // Slow first fetch that would succeed with stale data
            (Duration::from_secs(5), Ok(snapshot(99.0))),
            (Duration::from_secs(1), Ok(snapshot(7.0))),
        ]);
        let handle = RefreshRunner::new(config(), fetcher).start();

        let (_, first_cancel) = calls.recv().await.unwrap();
        assert!(handle.view().loading);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(handle.refresh());

        let (_, second_cancel) = calls.recv().await.unwrap();
        assert!(first_cancel.is_cancelled());
        assert!(!second_cancel.is_cancelled());

        let mut rx = handle.subscribe();
        let view = rx
            .wait_for(|v| v.last_updated.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(view.snapshot.unwrap().five_hour_percent(), Some(7.0));
        assert!(view.last_error.is_none());
        assert_eq!(view.consecutive_failures, 0);

        // Well past the point where the first fetch would have finished
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(
            handle.view().snapshot.unwrap().five_hour_percent(),
            Some(7.0)
        );

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_deadline_reports_timeout() {
        let (fetcher, mut calls) =
            ScriptedFetcher::new(vec![(Duration::from_secs(60), Ok(snapshot(1.0)))]);
        let handle = RefreshRunner::new(config(), fetcher).start();

        let (started, _) = calls.recv().await.unwrap();
        let mut rx = handle.subscribe();
        let view = rx
            .wait_for(|v| v.last_error.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(view.last_error.as_deref(), Some(&ClassifiedError::Timeout));
        assert!(Instant::now() - started >= Duration::from_secs(8));
        assert!(view.snapshot.is_none());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_in_flight_fetch() {
        let (fetcher, mut calls) =
            ScriptedFetcher::new(vec![(Duration::from_secs(60), Ok(snapshot(1.0)))]);
        let handle = RefreshRunner::new(config(), fetcher).start();

        let (_, cancel) = calls.recv().await.unwrap();
        let rx = handle.subscribe();
        handle.shutdown().await.unwrap();

        assert!(cancel.is_cancelled());
        assert!(!rx.borrow().loading);
        assert!(rx.borrow().last_error.is_none());
    }
}
