/// Request descriptor handed to the analysis engine
use super::{JobId, Language};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// First label type the engine scores against
pub const LABEL_TYPE_PRON: &str = "pron";

/// Second label type the engine scores against
pub const LABEL_TYPE_ARTICULATION: &str = "articulation";

/// Contents of `input/<job-id>.request`
///
/// Field names are the engine's; they must not be renamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// File name of the converted clip, relative to `input/`
    pub wav_file: String,

    /// Language the clip is spoken in
    pub lang: Language,

    /// Always `"pron"`
    pub label_type1: String,

    /// Always `"articulation"`
    pub label_type2: String,

    /// Submit time in milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Text the speaker was asked to read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_text: Option<String>,
}

impl AnalysisRequest {
    /// Build the request for a job, stamped with the current time.
    ///
    /// Target text is trimmed; blank text is dropped entirely.
    pub fn new(job_id: &JobId, lang: Language, target_text: Option<&str>) -> Self {
        Self {
            wav_file: format!("{}.wav", job_id.as_str()),
            lang,
            label_type1: LABEL_TYPE_PRON.to_string(),
            label_type2: LABEL_TYPE_ARTICULATION.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            target_text: target_text
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string),
        }
    }

    /// Serialize to the JSON bytes written on disk
    pub fn to_json(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
