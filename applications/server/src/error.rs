/// Server error types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use elocute_core::CoreError;
use elocute_pipeline::PipelineError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<CoreError> for ServerError {
    fn from(err: CoreError) -> Self {
        // Only request parsing reaches this: unknown language codes
        ServerError::BadRequest(err.to_string())
    }
}

impl ServerError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(e) => pipeline_status(e),
            ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn pipeline_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::EmptyInput => StatusCode::BAD_REQUEST,
        PipelineError::ToolMissing { .. } | PipelineError::Cancelled => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        PipelineError::ConversionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::IoFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        PipelineError::AnalysisTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        PipelineError::AnalysisEngineFailure(_) | PipelineError::ResultParseError(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            ServerError::BadRequest(msg) => msg,
            ServerError::Pipeline(PipelineError::IoFailure { ref context, ref source }) => {
                tracing::error!("Pipeline I/O failure ({}): {:?}", context, source);
                "Internal I/O failure".to_string()
            }
            ServerError::Pipeline(e) => e.to_string(),
            ServerError::Config(ref msg) => {
                tracing::error!("Config error: {}", msg);
                "Configuration error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
            "timestamp": chrono::Utc::now().timestamp_millis(),
        }));

        (status, body).into_response()
    }
}
