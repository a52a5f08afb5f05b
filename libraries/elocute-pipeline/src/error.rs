//! Error types for the analysis pipeline

use std::time::Duration;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Every way a job can fail. All of them are terminal for the job.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Converter binary cannot be started or fails its version probe
    #[error("Converter unavailable ({path}): {reason}")]
    ToolMissing { path: String, reason: String },

    /// Converter ran and exited unsuccessfully
    #[error("Audio conversion failed: {detail}")]
    ConversionFailed {
        exit_code: Option<i32>,
        detail: String,
    },

    /// Staging or shared-directory I/O failed
    #[error("I/O failure ({context}): {source}")]
    IoFailure {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// No result descriptor appeared in time
    #[error("Analysis timed out after {}s", .waited.as_secs_f64())]
    AnalysisTimeout { waited: Duration },

    /// Engine reported `status: error`
    #[error("Analysis engine failure: {0}")]
    AnalysisEngineFailure(String),

    /// Result descriptor was not valid
    #[error("Malformed analysis result: {0}")]
    ResultParseError(String),

    /// Caller aborted the wait
    #[error("Analysis cancelled")]
    Cancelled,

    /// Nothing to convert
    #[error("No audio data provided")]
    EmptyInput,
}

impl PipelineError {
    /// Wrap an I/O error with what was being attempted
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoFailure {
            context: context.into(),
            source,
        }
    }

    /// Short stable name, used in logs and API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::ToolMissing { .. } => "tool_missing",
            PipelineError::ConversionFailed { .. } => "conversion_failed",
            PipelineError::IoFailure { .. } => "io_failure",
            PipelineError::AnalysisTimeout { .. } => "analysis_timeout",
            PipelineError::AnalysisEngineFailure(_) => "analysis_engine_failure",
            PipelineError::ResultParseError(_) => "result_parse_error",
            PipelineError::Cancelled => "cancelled",
            PipelineError::EmptyInput => "empty_input",
        }
    }
}
