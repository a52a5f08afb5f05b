//! Elocute Pipeline
//!
//! Turns an uploaded clip into a pronunciation score by way of an external
//! analysis engine that only speaks through a shared directory.
//!
//! # Architecture
//!
//! - `transcoder`: FFmpeg invocation producing 16 kHz mono PCM WAV
//! - `store`: path layout and file lifecycle under the shared root
//! - `protocol`: request submission and bounded wait for the result descriptor
//! - `wait`: polling and filesystem-event result waiters
//! - `orchestrator`: the end-to-end job with guaranteed cleanup
//! - `sweeper`: periodic removal of results that arrived too late
//!
//! # Shared layout
//!
//! ```text
//! <root>/input/<id>.wav            converted clip
//! <root>/input/<id>.request        request descriptor (JSON)
//! <root>/output/<id>.wav.result    result descriptor (JSON, written by the engine)
//! ```

pub mod artifact;
mod error;
pub mod orchestrator;
pub mod protocol;
pub mod store;
pub mod sweeper;
pub mod transcoder;
pub mod wait;
pub mod wav_probe;

pub use artifact::ArtifactGuard;
pub use error::{PipelineError, Result};
pub use orchestrator::Pipeline;
pub use protocol::{AnalysisProtocol, PendingAnalysis, ProtocolOptions, ProtocolState};
pub use store::{ArtifactStore, StoredArtifact, SubArea};
pub use sweeper::{minimum_max_age, OrphanSweeper, SweepReport};
pub use transcoder::{ConversionJob, ConversionProfile, Transcoder};
pub use wait::{NotifyWaiter, PollingWaiter, ResultWaiter, WaitOutcome, WaitStrategy};
