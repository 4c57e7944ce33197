//! Companion planting guide
//!
//! Farm-management backend: crop identification through an external
//! multimodal model, companion-planting recommendations from a local plant
//! knowledge base with AI fallback, and JSON-file stores for plants and a
//! farming diary.
//!
//! Layout:
//! - `knowledge_base/`: immutable plant snapshots, name matching, FST search
//! - `recommendation/`: ranking, exclusion rules, AI merge
//! - `analysis/`: external model client, prompts, response parsing, cache
//! - `store/`: plant and diary files
//! - `api_server`: axum routes (feature `api`)

pub mod analysis;
pub mod config;
pub mod error;
pub mod history;
pub mod knowledge_base;
pub mod recommendation;
pub mod store;
pub mod types;
pub mod utils;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use analysis::{CachingClient, ExternalAnalysisClient, GeminiClient, GeminiSettings, ImageInput};
pub use config::AppConfig;
pub use error::{AnalysisError, KnowledgeBaseError, RecommendationError, StoreError};
pub use history::History;
pub use knowledge_base::{
    CanonicalKey, KnowledgeBaseHandle, KnowledgeBaseState, LoadReport, PlantKnowledgeBase,
};
pub use recommendation::{EngineConfig, RecommendationEngine};
pub use store::{DiaryStore, Page, PlantStore};
pub use types::*;

#[cfg(feature = "api")]
pub use api_server::{create_router, AppError, AppState};
