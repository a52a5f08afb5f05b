/// Transcoder - FFmpeg wrapper that normalizes clips to the engine's PCM profile
use crate::{
    artifact::ArtifactGuard,
    error::{PipelineError, Result},
};
use elocute_core::JobId;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Target format agreed with the analysis engine. Not configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionProfile;

impl ConversionProfile {
    /// Signed 16-bit little-endian PCM
    pub const CODEC: &'static str = "pcm_s16le";
    pub const SAMPLE_RATE: u32 = 16_000;
    pub const CHANNELS: u16 = 1;
    pub const BITS_PER_SAMPLE: u16 = 16;
}

/// Staging paths of one conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub job_id: JobId,
    /// `<staging>/<job-id>.src`
    pub source_path: PathBuf,
    /// `<staging>/<job-id>.wav`
    pub output_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Transcoder {
    converter_path: PathBuf,
    staging_dir: PathBuf,
}

impl Transcoder {
    pub fn new(converter_path: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            converter_path: converter_path.into(),
            staging_dir: staging_dir.into(),
        }
    }

    pub fn converter_path(&self) -> &Path {
        &self.converter_path
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// `<staging>/<job-id>.src`
    pub fn staged_source_path(&self, job_id: &JobId) -> PathBuf {
        self.staging_dir.join(format!("{}.src", job_id.as_str()))
    }

    /// `<staging>/<job-id>.wav`
    pub fn staged_output_path(&self, job_id: &JobId) -> PathBuf {
        self.staging_dir.join(format!("{}.wav", job_id.as_str()))
    }

    pub fn prepare(&self, job_id: &JobId) -> ConversionJob {
        ConversionJob {
            job_id: job_id.clone(),
            source_path: self.staged_source_path(job_id),
            output_path: self.staged_output_path(job_id),
        }
    }

    /// Check that the converter can be invoked (`-version`).
    ///
    /// Returns the first line of the version banner.
    pub async fn probe(&self) -> Result<String> {
        let output = Command::new(&self.converter_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.tool_missing(e.to_string()))?;

        if !output.status.success() {
            return Err(self.tool_missing(format!(
                "version probe exited with {}",
                output.status
            )));
        }

        let banner = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        debug!("Converter available: {}", banner);
        Ok(banner)
    }

    /// Convert raw clip bytes to a PCM WAV at `output`.
    ///
    /// The bytes are staged to `<job-id>.src` first; that file is removed on
    /// every path out of this function. On failure `output` is removed too.
    /// Only the converter's exit code decides success.
    pub async fn convert(&self, job_id: &JobId, audio: &[u8], output: &Path) -> Result<PathBuf> {
        self.probe().await?;
        self.transcode(job_id, audio, output).await
    }

    /// [`Self::convert`] for callers that already ran [`Self::probe`].
    ///
    /// A converter that vanished since the probe still maps to `ToolMissing`.
    pub async fn transcode(&self, job_id: &JobId, audio: &[u8], output: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(|e| {
                PipelineError::io(format!("create {}", self.staging_dir.display()), e)
            })?;

        let source = self.staged_source_path(job_id);
        let _source_guard = ArtifactGuard::new(&source);
        tokio::fs::write(&source, audio)
            .await
            .map_err(|e| PipelineError::io(format!("stage {}", source.display()), e))?;
        debug!("Staged {} bytes at {}", audio.len(), source.display());

        let output_guard = ArtifactGuard::new(output);
        let args = conversion_args(&source, output);
        info!(
            "Running converter: {} {}",
            self.converter_path.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let result = Command::new(&self.converter_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    self.tool_missing(e.to_string())
                }
                _ => PipelineError::io("spawn converter", e),
            })?;

        // Output text is diagnostics only.
        for line in String::from_utf8_lossy(&result.stdout)
            .lines()
            .chain(String::from_utf8_lossy(&result.stderr).lines())
        {
            debug!(target: "elocute_pipeline::converter", "{}", line);
        }

        if !result.status.success() {
            let exit_code = result.status.code();
            let detail = match exit_code {
                Some(code) => format!("converter exited with code {}", code),
                None => "converter terminated by signal".to_string(),
            };
            return Err(PipelineError::ConversionFailed { exit_code, detail });
        }

        info!("Converted job {} to {}", job_id, output.display());
        Ok(output_guard.disarm())
    }

    fn tool_missing(&self, reason: String) -> PipelineError {
        PipelineError::ToolMissing {
            path: self.converter_path.display().to_string(),
            reason,
        }
    }
}

/// Fixed argument list: mono, 16-bit PCM, 16 kHz, overwrite
pub fn conversion_args(input: &Path, output: &Path) -> Vec<OsString> {
    vec![
        "-i".into(),
        input.into(),
        "-acodec".into(),
        ConversionProfile::CODEC.into(),
        "-ar".into(),
        ConversionProfile::SAMPLE_RATE.to_string().into(),
        "-ac".into(),
        ConversionProfile::CHANNELS.to_string().into(),
        "-y".into(),
        output.into(),
    ]
}
