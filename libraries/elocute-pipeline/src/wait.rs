//! Bounded waits for a result descriptor to appear
//!
//! Both waiters honour the same contract: check, then wait one interval, for
//! at most `max_checks` checks, with one final check at the deadline. A file
//! that exists but is still empty counts as not yet written.

use async_trait::async_trait;
use notify::{RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How the protocol learns that a result has been written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitStrategy {
    /// Fixed-interval existence checks
    #[default]
    Poll,
    /// Filesystem events, with interval re-checks as a backstop
    Notify,
}

impl WaitStrategy {
    pub fn waiter(self, interval: Duration, max_checks: u32) -> Arc<dyn ResultWaiter> {
        match self {
            WaitStrategy::Poll => Arc::new(PollingWaiter::new(interval, max_checks)),
            WaitStrategy::Notify => Arc::new(NotifyWaiter::new(interval, max_checks)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Ready,
    TimedOut(Duration),
    Cancelled,
}

#[async_trait]
pub trait ResultWaiter: Send + Sync {
    /// Wait until `path` holds a non-empty file, the bound elapses, or
    /// `cancel` fires.
    async fn wait_for(&self, path: &Path, cancel: &CancellationToken) -> WaitOutcome;
}

/// Whether the descriptor is fully present
pub async fn is_ready(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}

fn bound(interval: Duration, max_checks: u32) -> Duration {
    interval.saturating_mul(max_checks)
}

#[derive(Debug, Clone)]
pub struct PollingWaiter {
    interval: Duration,
    max_checks: u32,
}

impl PollingWaiter {
    pub fn new(interval: Duration, max_checks: u32) -> Self {
        Self {
            interval,
            max_checks,
        }
    }
}

#[async_trait]
impl ResultWaiter for PollingWaiter {
    async fn wait_for(&self, path: &Path, cancel: &CancellationToken) -> WaitOutcome {
        for check in 0..self.max_checks {
            if is_ready(path).await {
                debug!("Result ready after {} checks", check + 1);
                return WaitOutcome::Ready;
            }
            tokio::select! {
                biased;
                () = cancel.cancelled() => return WaitOutcome::Cancelled,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        if is_ready(path).await {
            return WaitOutcome::Ready;
        }
        WaitOutcome::TimedOut(bound(self.interval, self.max_checks))
    }
}

/// Event-driven waiter backed by a `notify` watcher on the result directory.
///
/// Falls back to [`PollingWaiter`] when the platform watcher cannot be
/// created.
#[derive(Debug, Clone)]
pub struct NotifyWaiter {
    interval: Duration,
    max_checks: u32,
}

impl NotifyWaiter {
    pub fn new(interval: Duration, max_checks: u32) -> Self {
        Self {
            interval,
            max_checks,
        }
    }

    fn fallback(&self) -> PollingWaiter {
        PollingWaiter::new(self.interval, self.max_checks)
    }
}

#[async_trait]
impl ResultWaiter for NotifyWaiter {
    async fn wait_for(&self, path: &Path, cancel: &CancellationToken) -> WaitOutcome {
        let Some(dir) = path.parent() else {
            return self.fallback().wait_for(path, cancel).await;
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        });
        let mut watcher = match watcher {
            Ok(w) => w,
            Err(e) => {
                warn!("File watcher unavailable, polling instead: {}", e);
                return self.fallback().wait_for(path, cancel).await;
            }
        };
        if let Err(e) = watcher.watch(dir, RecursiveMode::NonRecursive) {
            warn!("Cannot watch {}, polling instead: {}", dir.display(), e);
            return self.fallback().wait_for(path, cancel).await;
        }

        let waited = bound(self.interval, self.max_checks);
        let deadline = Instant::now() + waited;
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if is_ready(path).await {
                return WaitOutcome::Ready;
            }
            tokio::select! {
                biased;
                () = cancel.cancelled() => return WaitOutcome::Cancelled,
                () = tokio::time::sleep_until(deadline) => {
                    if is_ready(path).await {
                        return WaitOutcome::Ready;
                    }
                    return WaitOutcome::TimedOut(waited);
                }
                Some(event) = rx.recv() => {
                    if event.paths.iter().any(|p| p.file_name() == path.file_name()) {
                        debug!("Watcher saw {:?} on result path", event.kind);
                    }
                }
                _ = ticker.tick() => {}
            }
        }
    }
}
