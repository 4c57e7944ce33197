//! External analysis capability
//!
//! The multimodal model is used twice: to identify crops in a photo and,
//! when the knowledge base is thin, to suggest companions. Both calls may
//! fail or hang; callers bound them and treat failure as "no answer".

pub mod cache;
pub mod gemini;
pub mod parse;
pub mod prompt;

pub use cache::CachingClient;
pub use gemini::{GeminiClient, GeminiSettings};

use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::types::{AiSuggestion, ConfirmedCrop, RecommendationContext};

/// Uploaded image bytes plus MIME type.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

#[async_trait]
pub trait ExternalAnalysisClient: Send + Sync {
    /// Identify plants in an image, guided by the user's notes.
    async fn identify(
        &self,
        image: &ImageInput,
        notes: &str,
    ) -> Result<Vec<ConfirmedCrop>, AnalysisError>;

    /// Suggest companion plants for the confirmed crops.
    async fn suggest(
        &self,
        crops: &[String],
        context: &RecommendationContext,
    ) -> Result<Vec<AiSuggestion>, AnalysisError>;
}
