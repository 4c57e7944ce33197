//! Recommendation Engine
//!
//! Produces a ranked, deduplicated companion list for a set of confirmed
//! crops:
//! 1. Local pass over one knowledge-base snapshot (`ranking`)
//! 2. AI fallback when the local pool is thin or no snapshot is loaded
//! 3. Merge: database entries first, AI entries after, deduplicated by
//!    canonical key with the same exclusion rules applied
//!
//! The engine never writes anything. It reads the current snapshot once
//! per request and uses it throughout.

pub mod benefits;
pub mod ranking;
pub mod reasons;

pub use ranking::{rank_local, ConfirmedSet, Exclusions, LocalRanking};

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Duration;

use crate::analysis::ExternalAnalysisClient;
use crate::error::{AnalysisError, RecommendationError};
use crate::knowledge_base::{KnowledgeBaseHandle, PlantKnowledgeBase};
use crate::types::{
    AiSuggestion, ConfirmedCrop, HistoricalSeason, Recommendation, RecommendationContext,
    RecommendationSource,
};

pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MIN_LOCAL_CANDIDATES: usize = 2;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on a single `suggest` call.
    pub ai_timeout: Duration,
    /// The AI fallback runs when fewer local candidates than this survive.
    pub min_local_candidates: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ai_timeout: DEFAULT_AI_TIMEOUT,
            min_local_candidates: DEFAULT_MIN_LOCAL_CANDIDATES,
        }
    }
}

#[derive(Clone)]
pub struct RecommendationEngine {
    kb: KnowledgeBaseHandle,
    client: Option<Arc<dyn ExternalAnalysisClient>>,
    config: EngineConfig,
    /// Seasons used for the AI prompt when the request has none.
    default_history: Arc<Vec<HistoricalSeason>>,
}

impl RecommendationEngine {
    pub fn new(kb: KnowledgeBaseHandle) -> Self {
        Self {
            kb,
            client: None,
            config: EngineConfig::default(),
            default_history: Arc::new(Vec::new()),
        }
    }

    pub fn with_client(mut self, client: Arc<dyn ExternalAnalysisClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_default_history(mut self, history: Vec<HistoricalSeason>) -> Self {
        self.default_history = Arc::new(history);
        self
    }

    /// Whether an AI fallback is wired in.
    pub fn has_ai(&self) -> bool {
        self.client.is_some()
    }

    /// Ranked companion suggestions for the confirmed crops.
    ///
    /// Fails with `EmptyCropList` when no crop has a name, and with
    /// `Unavailable` only when nothing was found locally and the AI
    /// fallback could not answer. An empty `Ok` means every candidate was
    /// excluded.
    pub async fn recommend(
        &self,
        crops: &[ConfirmedCrop],
        context: &RecommendationContext,
    ) -> Result<Vec<Recommendation>, RecommendationError> {
        let snapshot = self.kb.current();
        let loaded = snapshot.is_some();
        let kb = snapshot.unwrap_or_else(|| Arc::new(PlantKnowledgeBase::empty()));

        let confirmed = ConfirmedSet::new(&kb, crops.iter().map(|c| c.name.as_str()));
        if confirmed.is_empty() {
            return Err(RecommendationError::EmptyCropList);
        }

        let exclusions = Exclusions::new(&kb, &confirmed);
        let local = rank_local(&kb, &confirmed, &exclusions, context);
        let mut results = local.recommendations;

        let needs_ai = !loaded || results.len() < self.config.min_local_candidates;
        if !needs_ai {
            tracing::debug!(
                "Recommending {} database companions for {:?}",
                results.len(),
                confirmed.names
            );
            return Ok(results);
        }

        tracing::debug!(
            "Local pool thin ({} of {} survived); asking AI fallback",
            results.len(),
            local.pool_size
        );

        match self.fetch_ai(&confirmed.names, context).await {
            Ok(suggestions) => {
                merge_ai(&kb, &confirmed, &exclusions, &mut results, suggestions);
                Ok(results)
            }
            Err(e) if local.pool_size == 0 => {
                tracing::warn!("No local candidates and AI fallback failed: {}", e);
                Err(RecommendationError::Unavailable { cause: Some(e) })
            }
            Err(e) => {
                tracing::warn!("AI fallback failed, returning database results only: {}", e);
                Ok(results)
            }
        }
    }

    async fn fetch_ai(
        &self,
        crops: &[String],
        context: &RecommendationContext,
    ) -> Result<Vec<AiSuggestion>, AnalysisError> {
        let client = self.client.as_ref().ok_or(AnalysisError::NotConfigured)?;

        let with_history;
        let context = if context.history.is_empty() && !self.default_history.is_empty() {
            with_history = RecommendationContext {
                history: self.default_history.as_ref().clone(),
                ..context.clone()
            };
            &with_history
        } else {
            context
        };

        match tokio::time::timeout(self.config.ai_timeout, client.suggest(crops, context)).await {
            Ok(result) => result,
            Err(_) => Err(AnalysisError::Timeout(self.config.ai_timeout)),
        }
    }
}

/// Append AI suggestions after the database entries.
///
/// First occurrence wins, existing entries win over AI ones, and the same
/// antagonist/self rules apply as for database candidates.
fn merge_ai(
    kb: &PlantKnowledgeBase,
    confirmed: &ConfirmedSet,
    exclusions: &Exclusions,
    results: &mut Vec<Recommendation>,
    suggestions: Vec<AiSuggestion>,
) {
    let mut seen: FxHashSet<_> = results.iter().map(|r| kb.canonical_key(&r.plant)).collect();

    for suggestion in suggestions {
        let plant = suggestion.plant.trim();
        if plant.is_empty() {
            continue;
        }

        let key = kb.canonical_key(plant);
        if exclusions.excludes(kb, confirmed, &key, plant) || !seen.insert(key) {
            continue;
        }

        let reason = if suggestion.reason.trim().is_empty() {
            reasons::generic_ai_reason(&confirmed.names)
        } else {
            suggestion.reason
        };

        results.push(Recommendation {
            plant: plant.to_string(),
            reason,
            source: RecommendationSource::Ai,
            support: None,
            paired_with: SmallVec::new(),
        });
    }
}
