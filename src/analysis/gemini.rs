//! Gemini `generateContent` client.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{parse, prompt, ExternalAnalysisClient, ImageInput};
use crate::error::AnalysisError;
use crate::types::{AiSuggestion, ConfirmedCrop, RecommendationContext};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Value shipped in `.env` templates; treated as "no key".
const PLACEHOLDER_KEY: &str = "YOUR_API_KEY_HERE";

/// Longest error body kept in `AnalysisError::Status`.
const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Ceiling for a single HTTP exchange.
    pub timeout: Duration,
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn has_usable_key(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != PLACEHOLDER_KEY
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Result<Self, AnalysisError> {
        if !settings.has_usable_key() {
            return Err(AnalysisError::NotConfigured);
        }

        let http = reqwest::Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { http, settings })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, parts: Vec<Part>) -> Result<String, AnalysisError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        );
        let body = GenerateRequest {
            contents: vec![Content { parts }],
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.settings.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let mut text = response.text().await.unwrap_or_default();
            if text.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
            }
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| self.map_transport(e))?;

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            tracing::warn!("Gemini blocked the prompt: {}", reason);
            return Err(AnalysisError::Blocked);
        }

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<Vec<_>>().join(""))
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AnalysisError::Blocked);
        }
        Ok(text)
    }

    fn map_transport(&self, e: reqwest::Error) -> AnalysisError {
        if e.is_timeout() {
            AnalysisError::Timeout(self.settings.timeout)
        } else if e.is_decode() {
            AnalysisError::Malformed(e.to_string())
        } else {
            AnalysisError::Http(e)
        }
    }
}

#[async_trait]
impl ExternalAnalysisClient for GeminiClient {
    async fn identify(
        &self,
        image: &ImageInput,
        notes: &str,
    ) -> Result<Vec<ConfirmedCrop>, AnalysisError> {
        let parts = vec![
            Part::text(prompt::identification_prompt(notes)),
            Part::inline(&image.mime_type, &image.bytes),
        ];

        tracing::debug!("Identifying crops ({} image bytes)", image.bytes.len());
        let raw = self.generate(parts).await?;
        parse::parse_identified_crops(&raw)
    }

    async fn suggest(
        &self,
        crops: &[String],
        context: &RecommendationContext,
    ) -> Result<Vec<AiSuggestion>, AnalysisError> {
        let parts = vec![Part::text(prompt::suggestion_prompt(crops, context))];

        tracing::debug!("Requesting companion suggestions for {:?}", crops);
        let raw = self.generate(parts).await?;
        parse::parse_suggestions(&raw)
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Default)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: String) -> Self {
        Part {
            text: Some(text),
            inline_data: None,
        }
    }

    fn inline(mime_type: &str, bytes: &[u8]) -> Self {
        Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: BASE64.encode(bytes),
            }),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
