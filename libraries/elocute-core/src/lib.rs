//! Elocute Core
//!
//! Domain types shared by the Elocute pipeline and the service shell.
//!
//! This crate does no I/O. It defines:
//! - **Identifiers**: `JobId`, the key that scopes every artifact of one analysis
//! - **Descriptors**: `AnalysisRequest` (written for the engine) and
//!   `AnalysisResult` (written by the engine)
//! - **Caller-facing output**: `PronunciationResult` and its detail types
//!
//! # Example
//!
//! ```rust
//! use elocute_core::{AnalysisRequest, JobId, Language};
//!
//! let job = JobId::generate();
//! let request = AnalysisRequest::new(&job, Language::English, Some("  hello world "));
//!
//! assert_eq!(request.wav_file, format!("{}.wav", job));
//! assert_eq!(request.target_text.as_deref(), Some("hello world"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod types;

pub use error::{CoreError, Result};
pub use types::{
    AnalysisDetails, AnalysisRequest, AnalysisResult, AudioInfo, JobId, Language,
    PronunciationResult, ResultStatus, WordAccuracy, LABEL_TYPE_ARTICULATION, LABEL_TYPE_PRON,
    MAX_SCORE, MIN_SCORE,
};
