//! End-to-end job: convert, hand off, wait, interpret
use crate::{
    artifact::ArtifactGuard,
    error::{PipelineError, Result},
    protocol::AnalysisProtocol,
    store::{ArtifactStore, SubArea},
    transcoder::Transcoder,
    wav_probe,
};
use elocute_core::{AnalysisRequest, JobId, Language, PronunciationResult};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, Span};

pub struct Pipeline {
    transcoder: Transcoder,
    store: Arc<ArtifactStore>,
    protocol: AnalysisProtocol,
}

impl Pipeline {
    pub fn new(transcoder: Transcoder, store: Arc<ArtifactStore>, protocol: AnalysisProtocol) -> Self {
        Self {
            transcoder,
            store,
            protocol,
        }
    }

    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    pub fn transcoder(&self) -> &Transcoder {
        &self.transcoder
    }

    pub fn protocol(&self) -> &AnalysisProtocol {
        &self.protocol
    }

    /// Analyze one clip with no external cancellation
    pub async fn run(
        &self,
        audio: &[u8],
        language: Language,
        target_text: Option<&str>,
    ) -> Result<PronunciationResult> {
        self.run_with_cancel(audio, language, target_text, &CancellationToken::new())
            .await
    }

    /// Analyze one clip.
    ///
    /// Every file this job creates is owned by a guard, so the staged WAV,
    /// `input/<id>.wav` and `input/<id>.request` are gone when this returns,
    /// whatever the outcome, and also when the future is dropped mid-await.
    #[instrument(
        name = "analysis",
        skip(self, audio, target_text, cancel),
        fields(job_id = tracing::field::Empty, bytes = audio.len(), lang = %language)
    )]
    pub async fn run_with_cancel(
        &self,
        audio: &[u8],
        language: Language,
        target_text: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<PronunciationResult> {
        if audio.is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let job_id = JobId::generate();
        Span::current().record("job_id", job_id.as_str());

        let outcome = self
            .execute(&job_id, audio, language, target_text, cancel)
            .await;
        match &outcome {
            Ok(result) => info!(
                "Analysis complete: score={:?} grade={:?}",
                result.score,
                result.score_grade()
            ),
            Err(e) => error!(kind = e.kind(), "Analysis failed: {}", e),
        }
        outcome
    }

    async fn execute(
        &self,
        job_id: &JobId,
        audio: &[u8],
        language: Language,
        target_text: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<PronunciationResult> {
        // Nothing is written until the converter is known to run
        self.transcoder.probe().await?;
        self.store.ensure_directories().await?;

        let conversion = self.transcoder.prepare(job_id);
        let _staged_guard = ArtifactGuard::new(&conversion.output_path);
        self.transcoder
            .transcode(job_id, audio, &conversion.output_path)
            .await?;

        let wav_name = ArtifactStore::wav_name(job_id);
        let _wav_guard = self.store.guard(SubArea::Input, &wav_name);
        let wav_path = self
            .store
            .place(&conversion.output_path, SubArea::Input, &wav_name)
            .await?;
        info!("Clip placed at {}", wav_path.display());

        let audio_info = tokio::task::spawn_blocking(move || wav_probe::inspect(&wav_path))
            .await
            .ok()
            .flatten();
        if let Some(info) = &audio_info {
            if !wav_probe::matches_profile(info) {
                tracing::warn!(
                    "Converted clip is {} Hz / {} ch, engine expects 16000 Hz mono",
                    info.sample_rate,
                    info.channels
                );
            }
        }

        let request = AnalysisRequest::new(job_id, language, target_text);
        let pending = self.protocol.submit(job_id, &request).await?;
        let result = self.protocol.await_result(pending, cancel).await?;

        Ok(result
            .with_target_text(request.target_text)
            .with_language(language)
            .with_audio_info(audio_info))
    }
}
