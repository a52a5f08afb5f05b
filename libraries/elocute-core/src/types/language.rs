/// Languages the analysis engine accepts
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Spoken language of a clip, serialized as the engine's code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    /// `en`
    #[default]
    #[serde(rename = "en")]
    English,
    /// `de`
    #[serde(rename = "de")]
    German,
    /// `es`
    #[serde(rename = "es")]
    Spanish,
    /// `fr`
    #[serde(rename = "fr")]
    French,
    /// `jp`
    #[serde(rename = "jp")]
    Japanese,
    /// `ru`
    #[serde(rename = "ru")]
    Russian,
    /// `zh`
    #[serde(rename = "zh")]
    Chinese,
}

impl Language {
    /// All supported languages
    pub const ALL: [Language; 7] = [
        Language::English,
        Language::German,
        Language::Spanish,
        Language::French,
        Language::Japanese,
        Language::Russian,
        Language::Chinese,
    ];

    /// Engine code for this language
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::German => "de",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::Japanese => "jp",
            Language::Russian => "ru",
            Language::Chinese => "zh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.code() == code)
            .ok_or_else(|| CoreError::UnsupportedLanguage(s.to_string()))
    }
}
