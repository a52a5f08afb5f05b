/// Pronunciation analysis API routes
use crate::{
    error::{Result, ServerError},
    state::AppState,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use elocute_core::{Language, PronunciationResult};

/// Fields of the analysis upload form
#[derive(Debug, Default)]
pub struct AnalysisForm {
    pub audio: Option<Vec<u8>>,
    pub file_name: Option<String>,
    pub lang: Option<String>,
    pub text: Option<String>,
}

impl AnalysisForm {
    /// Language code, defaulting to English when absent or blank
    pub fn language(&self) -> Result<Language> {
        match self.lang.as_deref().map(str::trim) {
            None | Some("") => Ok(Language::default()),
            Some(code) => Ok(code.parse::<Language>()?),
        }
    }
}

/// POST /api/pronunciation/analyze
///
/// Multipart form: `audioFile` (required), `lang` (default `en`), `text`
/// (optional target sentence). The response is held open until the engine
/// answers or the analysis bound elapses.
pub async fn analyze(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PronunciationResult>> {
    let form = parse_form(&headers, body).await?;
    let language = form.language()?;

    let audio = form
        .audio
        .ok_or_else(|| ServerError::BadRequest("Missing audioFile".to_string()))?;
    if audio.is_empty() {
        return Err(ServerError::BadRequest(
            "Uploaded audio file is empty".to_string(),
        ));
    }

    tracing::info!(
        "Analysis requested: {} bytes ({}), lang={}",
        audio.len(),
        form.file_name.as_deref().unwrap_or("unnamed"),
        language
    );

    let result = app_state
        .pipeline
        .run(&audio, language, form.text.as_deref())
        .await?;

    Ok(Json(result))
}

async fn parse_form(headers: &HeaderMap, body: Bytes) -> Result<AnalysisForm> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ServerError::BadRequest("Missing Content-Type".to_string()))?;

    if !content_type.starts_with("multipart/form-data") {
        return Err(ServerError::BadRequest(
            "Expected multipart/form-data".to_string(),
        ));
    }

    let boundary = multer::parse_boundary(content_type)
        .map_err(|_| ServerError::BadRequest("Missing boundary".to_string()))?;

    // Convert Bytes to a stream for multer
    let stream = futures_util::stream::once(async move { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut form = AnalysisForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "audioFile" => {
                form.file_name = field.file_name().map(str::to_string);
                form.audio = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            ServerError::BadRequest(format!("Failed to read audioFile: {}", e))
                        })?
                        .to_vec(),
                );
            }
            "lang" => {
                form.lang = Some(field.text().await.map_err(|e| {
                    ServerError::BadRequest(format!("Failed to read lang: {}", e))
                })?);
            }
            "text" => {
                form.text = Some(field.text().await.map_err(|e| {
                    ServerError::BadRequest(format!("Failed to read text: {}", e))
                })?);
            }
            other => tracing::debug!("Ignoring form field {:?}", other),
        }
    }

    Ok(form)
}
