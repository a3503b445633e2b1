//! Process signals turned into a graceful quit request.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Shared flag raised by SIGTERM/SIGINT and polled by the app loop
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install signal handlers and spawn the task that watches them
    pub fn listen() -> Result<Self> {
        let signal = Self::new();
        let flag = signal.clone();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal as unix_signal, SignalKind};
            let mut sigterm =
                unix_signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
            let mut sigint =
                unix_signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
            tokio::spawn(async move {
                let name = tokio::select! {
                    _ = sigterm.recv() => "SIGTERM",
                    _ = sigint.recv() => "SIGINT",
                };
                info!("Received {}, shutting down", name);
                flag.trigger();
            });
        }

        #[cfg(not(unix))]
        {
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Received Ctrl+C, shutting down");
                    flag.trigger();
                }
            });
        }

        Ok(signal)
    }

    pub fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_trigger_is_shared_between_clones() {
        let signal = ShutdownSignal::new();
        let watcher = signal.clone();
        assert!(!watcher.is_triggered());
        signal.trigger();
        assert!(watcher.is_triggered());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sigterm_raises_flag() {
        let signal = ShutdownSignal::listen().unwrap();

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), async {
            while !signal.is_triggered() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }
}
