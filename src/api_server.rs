// Axum API server
//
// Purpose: JSON API for crop identification, companion recommendations,
// the plant database and the farming diary.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use anyhow::Context;

use crate::analysis::{CachingClient, ExternalAnalysisClient, GeminiClient, ImageInput};
use crate::config::AppConfig;
use crate::error::{AnalysisError, RecommendationError, StoreError};
use crate::history::History;
use crate::knowledge_base::KnowledgeBaseHandle;
use crate::recommendation::RecommendationEngine;
use crate::store::{DiaryEntryInput, DiaryQuery, DiaryStore, PlantQuery, PlantStore};
use crate::types::{ConfirmedCrop, RecommendationContext};

/// Uploads larger than this are rejected before reaching the handler.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

const DEFAULT_SEARCH_LIMIT: usize = 10;

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub kb: KnowledgeBaseHandle,
    pub engine: RecommendationEngine,
    pub plants: Arc<PlantStore>,
    pub diary: Arc<DiaryStore>,
    /// `None` when no API key is configured.
    pub analysis: Option<Arc<dyn ExternalAnalysisClient>>,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("creating data directory {:?}", config.data_dir))?;

        tracing::info!("Loading plant knowledge base...");
        let kb = KnowledgeBaseHandle::new();
        if kb.reload_from_path(&config.plants_file).is_err() {
            tracing::info!("Starting without plant data; add plants through the API");
        }

        tracing::info!("Loading historical data...");
        let history = History::load(&config.history_file);

        let analysis: Option<Arc<dyn ExternalAnalysisClient>> = match config.gemini_settings() {
            Some(settings) => match GeminiClient::new(settings) {
                Ok(client) => {
                    tracing::info!("Analysis client ready (model {})", client.model());
                    Some(Arc::new(CachingClient::new(Arc::new(client))))
                }
                Err(e) => {
                    tracing::warn!("Analysis client disabled: {}", e);
                    None
                }
            },
            None => {
                tracing::warn!(
                    "GEMINI_API_KEY not set; identification disabled, \
                     recommendations use local data only"
                );
                None
            }
        };

        let mut engine = RecommendationEngine::new(kb.clone())
            .with_config(config.engine_config())
            .with_default_history(history.seasons);
        if let Some(client) = &analysis {
            engine = engine.with_client(client.clone());
        }

        let plants = Arc::new(PlantStore::new(&config.plants_file, kb.clone()));
        let diary = Arc::new(DiaryStore::new(&config.diary_file));

        Ok(Self {
            kb,
            engine,
            plants,
            diary,
            analysis,
        })
    }

    /// State from prebuilt parts. The engine should share `kb`.
    pub fn from_parts(
        kb: KnowledgeBaseHandle,
        engine: RecommendationEngine,
        plants: PlantStore,
        diary: DiaryStore,
        analysis: Option<Arc<dyn ExternalAnalysisClient>>,
    ) -> Self {
        Self {
            kb,
            engine,
            plants: Arc::new(plants),
            diary: Arc::new(diary),
            analysis,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Identification and recommendations (also served at the bare paths)
        .route("/api/analyze", post(analyze))
        .route("/analyze", post(analyze))
        .route("/api/recommend", post(recommend))
        .route("/recommend", post(recommend))

        // Plant database
        .route("/api/plants", get(list_plants).post(create_plant))
        .route("/api/plants/search", get(search_plants))
        .route("/api/plants/import", post(import_plants))
        .route("/api/plants/:id", get(get_plant).put(update_plant).delete(delete_plant))
        .route("/api/plants/:id/details", get(plant_details))

        // Farming diary
        .route("/api/diary", get(list_diary).post(create_diary))
        .route("/api/diary/:id", get(get_diary).put(update_diary).delete(delete_diary))

        // Middleware (applied in reverse order)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "knowledge_base": state.kb.state(),
        "search_index": state.kb.current().map(|kb| kb.index_stats()),
        "analysis_configured": state.analysis.is_some(),
        "ai_fallback": state.engine.has_ai(),
    }))
}

async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let client = state.analysis.clone().ok_or(AppError::Unconfigured)?;

    let mut image: Option<ImageInput> = None;
    let mut notes = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let mime = field.content_type().unwrap_or("image/jpeg").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("failed to read image: {}", e)))?;
                if !bytes.is_empty() {
                    image = Some(ImageInput::new(bytes.to_vec(), mime));
                }
            }
            "text" => {
                notes = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("failed to read text: {}", e)))?;
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| AppError::BadRequest("No image file provided".to_string()))?;
    let crops = client.identify(&image, &notes).await?;
    tracing::info!("Identified {} crops", crops.len());

    Ok(Json(serde_json::json!({ "identified_crops": crops })))
}

/// A crop as sent by clients: a bare name or `{name, id}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CropInput {
    Name(String),
    Crop(ConfirmedCrop),
}

impl From<CropInput> for ConfirmedCrop {
    fn from(input: CropInput) -> Self {
        match input {
            CropInput::Name(name) => ConfirmedCrop::named(name),
            CropInput::Crop(crop) => crop,
        }
    }
}

#[derive(Deserialize)]
struct RecommendRequest {
    #[serde(default)]
    crops: Vec<CropInput>,
    #[serde(default)]
    context: RecommendationContext,
}

async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let crops: Vec<ConfirmedCrop> = request.crops.into_iter().map(Into::into).collect();
    let recommendations = state.engine.recommend(&crops, &request.context).await?;

    Ok(Json(serde_json::json!({ "recommendations": recommendations })))
}

async fn list_plants(
    State(state): State<AppState>,
    Query(query): Query<PlantQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.plants.list(&query).await?))
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

async fn search_plants(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, 100);
    let results: Vec<serde_json::Value> = match state.kb.current() {
        Some(kb) => kb
            .search(&params.q, limit)
            .into_iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "name": r.name,
                    "scientific_name": r.scientific_name,
                })
            })
            .collect(),
        None => Vec::new(),
    };

    Json(serde_json::json!({ "query": params.q, "results": results }))
}

async fn get_plant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.plants.get(&id).await?))
}

async fn plant_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .kb
        .current()
        .and_then(|kb| kb.details_for(&id))
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("plant {} not found", id)))
}

async fn create_plant(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let record = state.plants.create(&body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_plant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.plants.update(&id, &body).await?))
}

async fn delete_plant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let removed = state.plants.delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": removed.id })))
}

async fn import_plants(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.plants.import(&body).await?))
}

async fn list_diary(
    State(state): State<AppState>,
    Query(query): Query<DiaryQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.diary.list(&query).await?))
}

async fn get_diary(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.diary.get(id).await?))
}

async fn create_diary(
    State(state): State<AppState>,
    Json(input): Json<DiaryEntryInput>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state.diary.create(input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_diary(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<DiaryEntryInput>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.diary.update(id, input).await?))
}

async fn delete_diary(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    let removed = state.diary.delete(id).await?;
    Ok(Json(serde_json::json!({ "deleted": removed.id })))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    /// Recommendation engine had nothing to offer.
    Unavailable(String),
    /// Analysis service is not configured on this server.
    Unconfigured,
    /// Analysis service failed.
    Upstream(String),
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => AppError::NotFound(e.to_string()),
            StoreError::Conflict(_) => AppError::Conflict(e.to_string()),
            StoreError::Invalid(_) => AppError::BadRequest(e.to_string()),
            other => {
                tracing::error!("Store failure: {}", other);
                AppError::Internal(other.to_string())
            }
        }
    }
}

impl From<RecommendationError> for AppError {
    fn from(e: RecommendationError) -> Self {
        match e {
            RecommendationError::EmptyCropList => {
                AppError::BadRequest("No confirmed crops provided.".to_string())
            }
            RecommendationError::Unavailable { .. } => AppError::Unavailable(e.to_string()),
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::NotConfigured => AppError::Unconfigured,
            other => {
                tracing::warn!("Analysis failed: {}", other);
                AppError::Upstream(other.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Unconfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "API key is not configured on the server.".to_string(),
            ),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
