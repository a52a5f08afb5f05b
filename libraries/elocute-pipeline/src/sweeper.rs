/// Orphan sweeper - removes results nobody will read and stale inputs
///
/// A result that arrives after its job timed out or was cancelled has no
/// reader. Neither does a request the engine never picked up when the
/// process died mid-job.
use crate::{
    error::Result,
    protocol::ProtocolOptions,
    store::{ArtifactStore, SubArea},
};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Input-side suffixes this service writes
const INPUT_SUFFIXES: [&str; 3] = [".request", ".wav", ".tmp"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
}

/// Smallest `max_age` that cannot catch a job still inside its wait bound.
///
/// A live job's request and clip are as old as its wait; two extra poll
/// intervals cover the final check and the read that follows it.
pub fn minimum_max_age(options: &ProtocolOptions) -> Duration {
    options
        .timeout()
        .saturating_add(options.poll_interval.saturating_mul(2))
}

pub struct OrphanSweeper {
    store: Arc<ArtifactStore>,
    max_age: Duration,
}

impl OrphanSweeper {
    /// `max_age` must exceed [`minimum_max_age`] for the protocol in use,
    /// otherwise in-flight requests and clips are swept out from under the
    /// engine.
    pub fn new(store: Arc<ArtifactStore>, max_age: Duration) -> Self {
        Self { store, max_age }
    }

    /// One pass over `output/` and `input/`
    pub async fn sweep_once(&self) -> Result<SweepReport> {
        let now = SystemTime::now();
        let mut report = SweepReport::default();

        for area in [SubArea::Output, SubArea::Input] {
            for entry in self.store.entries(area).await? {
                if area == SubArea::Input
                    && !INPUT_SUFFIXES.iter().any(|s| entry.name.ends_with(s))
                {
                    continue;
                }
                report.scanned += 1;

                // Clock skew puts mtime in the future; treat as fresh.
                let age = now.duration_since(entry.modified).unwrap_or_default();
                if age < self.max_age {
                    continue;
                }

                if self.store.remove(area, &entry.name).await {
                    debug!("Swept {} (age {:?})", entry.path.display(), age);
                    report.removed += 1;
                }
            }
        }

        if report.removed > 0 {
            info!(
                "Sweep removed {} of {} files",
                report.removed, report.scanned
            );
        }
        Ok(report)
    }

    /// Run [`Self::sweep_once`] every `interval` until `cancel` fires
    pub fn spawn(self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Orphan sweeper started (interval {:?}, max age {:?})",
                interval, self.max_age
            );
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(interval) => {}
                }
                if let Err(e) = self.sweep_once().await {
                    warn!("Sweep failed: {}", e);
                }
            }
            info!("Orphan sweeper stopped");
        })
    }
}
