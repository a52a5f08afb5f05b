/// API route modules
pub mod health;
pub mod pronunciation;

use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

/// Routes under `/api`, with the upload limit applied
pub fn router(app_state: AppState) -> Router {
    let max_upload_bytes = app_state.max_upload_bytes;

    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/pronunciation/analyze", post(pronunciation::analyze));

    Router::new()
        .nest("/api", routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(app_state)
}
