/// Caller-facing pronunciation result
use super::{AnalysisResult, AudioInfo, Language, ResultStatus};
use serde::{Deserialize, Serialize, Serializer};

/// Lowest score a result can carry
pub const MIN_SCORE: f64 = 0.0;

/// Highest score a result can carry
pub const MAX_SCORE: f64 = 5.0;

/// Accuracy of a single word in the clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordAccuracy {
    /// The word
    pub word: String,

    /// Expected pronunciation (target)
    #[serde(default, alias = "expected_pronunciation", skip_serializing_if = "Option::is_none")]
    pub expected_pronunciation: Option<String>,

    /// Pronunciation heard in the clip
    #[serde(default, alias = "actual_pronunciation", skip_serializing_if = "Option::is_none")]
    pub actual_pronunciation: Option<String>,

    /// Accuracy in 0.0-1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,

    /// `correct`, `incorrect`, `missing` or `extra`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Improvement hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl WordAccuracy {
    /// Whether the engine judged this word correct
    pub fn is_correct(&self) -> bool {
        self.status.as_deref() == Some("correct")
    }
}

/// Extra breakdown attached to a result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDetails {
    /// Words in the breakdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_words: Option<u32>,

    /// Words judged correct
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_words: Option<u32>,

    /// `correct_words / total_words`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_accuracy_rate: Option<f64>,

    /// Clarity score reported by the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarity_score: Option<f64>,

    /// Fluency score reported by the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fluency_score: Option<f64>,

    /// Engine processing time in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<u64>,

    /// Model the engine used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_info: Option<String>,

    /// Language code of the analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Converted clip properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_info: Option<AudioInfo>,
}

impl AnalysisDetails {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Normalized pronunciation score returned to callers
///
/// Scores are always inside [`MIN_SCORE`, `MAX_SCORE`]. Serializes to
/// camelCase JSON with absent fields omitted, plus the derived `scoreGrade`,
/// `scoreAsPercentage` and `success` fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationResult {
    /// Pronunciation score
    #[serde(default)]
    pub score: Option<f64>,

    /// Prosody score
    #[serde(default)]
    pub prosody_score: Option<f64>,

    /// Engine timestamp
    #[serde(default)]
    pub timestamp: Option<i64>,

    /// `success` or `error`
    pub status: ResultStatus,

    /// Error text, for error results
    #[serde(default)]
    pub error: Option<String>,

    /// Speech-to-text of the clip
    #[serde(default)]
    pub transcription: Option<String>,

    /// Text the speaker was asked to read
    #[serde(default)]
    pub target_text: Option<String>,

    /// Per-word breakdown
    #[serde(default)]
    pub word_accuracies: Option<Vec<WordAccuracy>>,

    /// Additional analysis information
    #[serde(default)]
    pub analysis_details: Option<AnalysisDetails>,
}

/// Clamp a score into the valid range
pub(crate) fn clamp_score(field: &str, value: f64) -> f64 {
    let clamped = value.clamp(MIN_SCORE, MAX_SCORE);
    if (clamped - value).abs() > f64::EPSILON {
        tracing::warn!(
            "Engine reported {} {} outside [{}, {}], clamped to {}",
            field,
            value,
            MIN_SCORE,
            MAX_SCORE,
            clamped
        );
    }
    clamped
}

impl PronunciationResult {
    /// Normalize an engine descriptor.
    ///
    /// Out-of-range scores are an engine bug; they are corrected, not rejected.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_engine(result: AnalysisResult) -> Self {
        let details = AnalysisDetails {
            clarity_score: result.clarity_score,
            fluency_score: result.fluency_score,
            processing_time: result
                .processing_time
                .filter(|secs| *secs >= 0.0)
                .map(|secs| (secs * 1000.0).round() as u64),
            model_info: result.model_type,
            language: result.language,
            ..AnalysisDetails::default()
        };

        let mut normalized = Self {
            score: result.score.map(|s| clamp_score("score", s)),
            prosody_score: result.prosody_score.map(|s| clamp_score("prosody_score", s)),
            timestamp: result.timestamp.map(|t| t as i64),
            status: result.status,
            error: result.error,
            transcription: result.transcription,
            target_text: None,
            word_accuracies: None,
            analysis_details: (!details.is_empty()).then_some(details),
        };

        if let Some(words) = result.word_accuracies {
            normalized = normalized.with_word_accuracies(words);
        }

        normalized
    }

    /// Attach the text the speaker was asked to read
    #[must_use]
    pub fn with_target_text(mut self, target_text: Option<String>) -> Self {
        self.target_text = target_text;
        self
    }

    /// Attach the analysis language, unless the engine already reported one
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        let details = self.analysis_details.get_or_insert_with(AnalysisDetails::default);
        if details.language.is_none() {
            details.language = Some(language.code().to_string());
        }
        self
    }

    /// Attach properties of the converted clip
    #[must_use]
    pub fn with_audio_info(mut self, audio_info: Option<AudioInfo>) -> Self {
        if let Some(info) = audio_info {
            self.analysis_details
                .get_or_insert_with(AnalysisDetails::default)
                .audio_info = Some(info);
        }
        self
    }

    /// Attach a per-word breakdown and derive the word counts from it
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn with_word_accuracies(mut self, words: Vec<WordAccuracy>) -> Self {
        let total = words.len() as u32;
        let correct = words.iter().filter(|w| w.is_correct()).count() as u32;

        let details = self.analysis_details.get_or_insert_with(AnalysisDetails::default);
        details.total_words = Some(total);
        details.correct_words = Some(correct);
        details.word_accuracy_rate = (total > 0).then(|| f64::from(correct) / f64::from(total));

        self.word_accuracies = Some(words);
        self
    }

    /// Successful and scored
    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success && self.score.is_some()
    }

    /// Score as 0-100
    pub fn score_as_percentage(&self) -> Option<f64> {
        self.score.map(|s| s / MAX_SCORE * 100.0)
    }

    /// Letter grade for the score
    pub fn score_grade(&self) -> Option<&'static str> {
        let score = self.score?;
        Some(if score >= 4.5 {
            "A"
        } else if score >= 3.5 {
            "B"
        } else if score >= 2.5 {
            "C"
        } else if score >= 1.5 {
            "D"
        } else {
            "F"
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireResult<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prosody_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
    status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transcription: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    word_accuracies: Option<&'a [WordAccuracy]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis_details: Option<&'a AnalysisDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score_grade: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score_as_percentage: Option<f64>,
    success: bool,
}

impl Serialize for PronunciationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireResult {
            score: self.score,
            prosody_score: self.prosody_score,
            timestamp: self.timestamp,
            status: self.status,
            error: self.error.as_deref(),
            transcription: self.transcription.as_deref(),
            target_text: self.target_text.as_deref(),
            word_accuracies: self.word_accuracies.as_deref(),
            analysis_details: self.analysis_details.as_ref(),
            score_grade: self.score_grade(),
            score_as_percentage: self.score_as_percentage(),
            success: self.is_success(),
        }
        .serialize(serializer)
    }
}
