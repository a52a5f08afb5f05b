/// Shared application state
use crate::config::ServerConfig;
use elocute_pipeline::{AnalysisProtocol, ArtifactStore, OrphanSweeper, Pipeline, Transcoder};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, max_upload_bytes: usize) -> Self {
        Self {
            pipeline,
            max_upload_bytes,
        }
    }

    /// Wire the pipeline from configuration
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(Arc::new(build_pipeline(config)), config.upload.max_bytes)
    }

    /// Sweeper over the same shared root the pipeline writes to
    pub fn sweeper(&self, config: &ServerConfig) -> OrphanSweeper {
        OrphanSweeper::new(Arc::clone(self.pipeline.store()), config.sweeper.max_age())
    }
}

pub fn build_pipeline(config: &ServerConfig) -> Pipeline {
    let store = Arc::new(ArtifactStore::new(&config.shared.root));
    let transcoder = Transcoder::new(
        &config.converter.ffmpeg_path,
        &config.shared.staging_dir,
    );
    let protocol = AnalysisProtocol::new(
        Arc::clone(&store),
        config.analysis.protocol_options(),
    );
    Pipeline::new(transcoder, store, protocol)
}
