/// Health check API routes
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Whether the converter answered its version probe
    pub converter_available: bool,
    pub shared_root: String,
}

/// GET /api/health - Health check endpoint
///
/// Reports `degraded` rather than failing when the converter is missing,
/// since the process itself is up.
pub async fn health(State(app_state): State<AppState>) -> Json<HealthResponse> {
    let pipeline = &app_state.pipeline;
    let converter_available = match pipeline.transcoder().probe().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Health probe: {}", e);
            false
        }
    };

    Json(HealthResponse {
        status: if converter_available { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        converter_available,
        shared_root: pipeline.store().root().display().to_string(),
    })
}
