//! File-queue exchange with the analysis engine
//!
//! The engine watches `input/` for `<id>.request` descriptors and answers by
//! writing `output/<id>.wav.result`. There is no acknowledgment channel: the
//! only signals are the result file appearing or the wait bound elapsing.
//!
//! ```text
//! RequestPending ──► ResultAvailable
//!        │   └─────► ResultError
//!        ├─────────► TimedOut
//!        └─────────► Cancelled
//! ```

use crate::{
    artifact::ArtifactGuard,
    error::{PipelineError, Result},
    store::{ArtifactStore, SubArea},
    wait::{ResultWaiter, WaitOutcome, WaitStrategy},
};
use elocute_core::{AnalysisRequest, AnalysisResult, JobId, PronunciationResult};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Engine text used when an error descriptor carries none
pub const UNKNOWN_ENGINE_ERROR: &str = "unknown engine error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolOptions {
    pub poll_interval: Duration,
    pub timeout_intervals: u32,
    pub wait_strategy: WaitStrategy,
}

impl Default for ProtocolOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout_intervals: 30,
            wait_strategy: WaitStrategy::Poll,
        }
    }
}

impl ProtocolOptions {
    /// Upper bound on the wait for one result
    pub fn timeout(&self) -> Duration {
        self.poll_interval.saturating_mul(self.timeout_intervals)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolState {
    RequestPending,
    ResultAvailable,
    ResultError,
    TimedOut,
    Cancelled,
}

impl fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProtocolState::RequestPending => "request_pending",
            ProtocolState::ResultAvailable => "result_available",
            ProtocolState::ResultError => "result_error",
            ProtocolState::TimedOut => "timed_out",
            ProtocolState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A submitted request awaiting its result.
///
/// Owns the request descriptor: dropping this without awaiting removes it, so
/// an abandoned job never leaves work for the engine.
#[derive(Debug)]
pub struct PendingAnalysis {
    job_id: JobId,
    submitted_at: Instant,
    _request: ArtifactGuard,
}

impl PendingAnalysis {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }
}

pub struct AnalysisProtocol {
    store: Arc<ArtifactStore>,
    options: ProtocolOptions,
    waiter: Arc<dyn ResultWaiter>,
}

impl AnalysisProtocol {
    /// Waiter chosen by `options.wait_strategy`
    pub fn new(store: Arc<ArtifactStore>, options: ProtocolOptions) -> Self {
        let waiter = options
            .wait_strategy
            .waiter(options.poll_interval, options.timeout_intervals);
        Self::with_waiter(store, options, waiter)
    }

    pub fn with_waiter(
        store: Arc<ArtifactStore>,
        options: ProtocolOptions,
        waiter: Arc<dyn ResultWaiter>,
    ) -> Self {
        Self {
            store,
            options,
            waiter,
        }
    }

    pub fn options(&self) -> &ProtocolOptions {
        &self.options
    }

    /// Publish the request descriptor into `input/`
    pub async fn submit(&self, job_id: &JobId, request: &AnalysisRequest) -> Result<PendingAnalysis> {
        let name = ArtifactStore::request_name(job_id);
        let json = request
            .to_json()
            .map_err(|e| PipelineError::io(format!("encode {}", name), std::io::Error::other(e)))?;

        let guard = self.store.guard(SubArea::Input, &name);
        self.store.write_atomic(SubArea::Input, &name, &json).await?;
        transition(job_id, ProtocolState::RequestPending);

        Ok(PendingAnalysis {
            job_id: job_id.clone(),
            submitted_at: Instant::now(),
            _request: guard,
        })
    }

    /// Wait for the engine's answer and interpret it.
    ///
    /// The result file is deleted once read, whatever it contains. On timeout
    /// or cancellation nothing is known about the engine's progress, so a late
    /// result is left for the sweeper.
    pub async fn await_result(
        &self,
        pending: PendingAnalysis,
        cancel: &CancellationToken,
    ) -> Result<PronunciationResult> {
        let name = ArtifactStore::result_name(&pending.job_id);
        let path = self.store.path(SubArea::Output, &name);

        match self.waiter.wait_for(&path, cancel).await {
            WaitOutcome::Ready => {}
            WaitOutcome::TimedOut(waited) => {
                transition(&pending.job_id, ProtocolState::TimedOut);
                return Err(PipelineError::AnalysisTimeout { waited });
            }
            WaitOutcome::Cancelled => {
                transition(&pending.job_id, ProtocolState::Cancelled);
                return Err(PipelineError::Cancelled);
            }
        }

        debug!(
            "Result for {} after {:?}",
            pending.job_id,
            pending.submitted_at.elapsed()
        );

        let bytes = self.store.read(SubArea::Output, &name).await;
        self.store.remove(SubArea::Output, &name).await;
        let bytes = bytes?;

        let result = match AnalysisResult::parse(&bytes) {
            Ok(result) => result,
            Err(e) => {
                transition(&pending.job_id, ProtocolState::ResultError);
                return Err(PipelineError::ResultParseError(e.to_string()));
            }
        };

        if result.is_error() {
            transition(&pending.job_id, ProtocolState::ResultError);
            let message = result
                .error
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_ENGINE_ERROR.to_string());
            return Err(PipelineError::AnalysisEngineFailure(message));
        }

        transition(&pending.job_id, ProtocolState::ResultAvailable);
        Ok(PronunciationResult::from_engine(result))
    }
}

fn transition(job_id: &JobId, state: ProtocolState) {
    match state {
        ProtocolState::RequestPending | ProtocolState::ResultAvailable => {
            info!(job_id = %job_id, state = %state, "Protocol transition");
        }
        _ => warn!(job_id = %job_id, state = %state, "Protocol transition"),
    }
}
