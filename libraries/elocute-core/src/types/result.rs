/// Result descriptor written by the analysis engine
use super::WordAccuracy;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Outcome the engine reports for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    /// Analysis produced a score
    Success,
    /// Engine gave up; `error` explains why
    Error,
}

impl ResultStatus {
    /// Wire string for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Success => "success",
            ResultStatus::Error => "error",
        }
    }
}

/// Contents of `output/<job-id>.wav.result`
///
/// Engines are loose about numbers: any numeric field may arrive as a JSON
/// number or as a numeric string. Values that are neither are dropped with a
/// warning instead of failing the whole descriptor. The same goes for a
/// word breakdown that does not parse, and an `error` that is not a string
/// is kept as its JSON text. Only `status` is strict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// `success` or `error`; anything else is a malformed descriptor
    pub status: ResultStatus,

    /// Pronunciation score, nominally 0.0-5.0
    #[serde(default, deserialize_with = "lenient_f64")]
    pub score: Option<f64>,

    /// Prosody score, nominally 0.0-5.0
    #[serde(default, deserialize_with = "lenient_f64")]
    pub prosody_score: Option<f64>,

    /// Speech-to-text of the clip
    #[serde(default)]
    pub transcription: Option<String>,

    /// Engine-side timestamp (integer or fractional)
    #[serde(default, deserialize_with = "lenient_f64")]
    pub timestamp: Option<f64>,

    /// Engine error text when `status` is `error`
    #[serde(default, deserialize_with = "lenient_text")]
    pub error: Option<String>,

    /// Language the engine analysed with
    #[serde(default)]
    pub language: Option<String>,

    /// Engine processing time in seconds
    #[serde(default, deserialize_with = "lenient_f64")]
    pub processing_time: Option<f64>,

    /// Model identifier
    #[serde(default)]
    pub model_type: Option<String>,

    /// Articulation clarity score
    #[serde(default, deserialize_with = "lenient_f64")]
    pub clarity_score: Option<f64>,

    /// Fluency score
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fluency_score: Option<f64>,

    /// Per-word breakdown, when the engine provides one
    #[serde(default, deserialize_with = "lenient_words")]
    pub word_accuracies: Option<Vec<WordAccuracy>>,
}

impl AnalysisResult {
    /// Parse a descriptor from raw file contents
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::malformed(e.to_string()))
    }

    /// Whether the engine reported a failure
    pub fn is_error(&self) -> bool {
        self.status == ResultStatus::Error
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                tracing::warn!("Ignoring non-numeric value in result descriptor: {:?}", s);
                None
            }
        },
        Some(other) => {
            tracing::warn!("Ignoring non-numeric value in result descriptor: {}", other);
            None
        }
    })
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_words<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<WordAccuracy>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(raw) => match serde_json::from_value::<Vec<WordAccuracy>>(raw) {
            Ok(words) => Some(words),
            Err(e) => {
                tracing::warn!("Ignoring malformed word_accuracies in result descriptor: {}", e);
                None
            }
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_success() {
        let result =
            AnalysisResult::parse(br#"{"status":"success","score":4.2,"timestamp":1234}"#)
                .unwrap();
        assert_eq!(result.status, ResultStatus::Success);
        assert_eq!(result.score, Some(4.2));
        assert_eq!(result.timestamp, Some(1234.0));
        assert!(result.transcription.is_none());
    }

    #[test]
    fn accepts_numeric_strings_and_fractional_timestamps() {
        let result = AnalysisResult::parse(
            br#"{"status":"success","score":"3.5","timestamp":1700000000.25,"processing_time":"1.5"}"#,
        )
        .unwrap();
        assert_eq!(result.score, Some(3.5));
        assert_eq!(result.timestamp, Some(1_700_000_000.25));
        assert_eq!(result.processing_time, Some(1.5));
    }

    #[test]
    fn drops_garbage_numbers_without_failing() {
        let result =
            AnalysisResult::parse(br#"{"status":"success","score":"n/a","prosody_score":[1]}"#)
                .unwrap();
        assert!(result.score.is_none());
        assert!(result.prosody_score.is_none());
    }

    #[test]
    fn parses_engine_extras() {
        let result = AnalysisResult::parse(
            br#"{
                "status": "success",
                "score": 4.0,
                "timestamp": 1.0,
                "language": "en",
                "processing_time": 2.25,
                "model_type": "baseline-v1",
                "unknown_field": true
            }"#,
        )
        .unwrap();
        assert_eq!(result.language.as_deref(), Some("en"));
        assert_eq!(result.model_type.as_deref(), Some("baseline-v1"));
    }

    #[test]
    fn error_status_carries_message() {
        let result =
            AnalysisResult::parse(br#"{"status":"error","error":"model failure"}"#).unwrap();
        assert!(result.is_error());
        assert_eq!(result.error.as_deref(), Some("model failure"));
    }

    #[test]
    fn structured_error_is_kept_as_text() {
        let result =
            AnalysisResult::parse(br#"{"status":"error","error":{"code":1}}"#).unwrap();
        assert!(result.is_error());
        assert_eq!(result.error.as_deref(), Some(r#"{"code":1}"#));
    }

    #[test]
    fn malformed_word_breakdown_is_dropped() {
        let result = AnalysisResult::parse(
            br#"{"status":"success","score":4.0,"word_accuracies":[{"accuracy":0.9}]}"#,
        )
        .unwrap();
        assert_eq!(result.score, Some(4.0));
        assert!(result.word_accuracies.is_none());

        let result =
            AnalysisResult::parse(br#"{"status":"success","word_accuracies":"none"}"#).unwrap();
        assert!(result.word_accuracies.is_none());
    }

    #[test]
    fn rejects_unknown_or_missing_status() {
        assert!(AnalysisResult::parse(br#"{"status":"pending"}"#).is_err());
        assert!(AnalysisResult::parse(br#"{"score":4.0}"#).is_err());
    }

    #[test]
    fn rejects_truncated_json() {
        let err = AnalysisResult::parse(br#"{"status":"succ"#).unwrap_err();
        assert!(matches!(err, CoreError::MalformedResult(_)));
    }
}
