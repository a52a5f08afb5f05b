mod audio;
mod ids;
mod language;
mod pronunciation;
mod request;
mod result;

pub use audio::AudioInfo;
pub use ids::JobId;
pub use language::Language;
pub use pronunciation::{
    AnalysisDetails, PronunciationResult, WordAccuracy, MAX_SCORE, MIN_SCORE,
};
pub use request::{AnalysisRequest, LABEL_TYPE_ARTICULATION, LABEL_TYPE_PRON};
pub use result::{AnalysisResult, ResultStatus};
