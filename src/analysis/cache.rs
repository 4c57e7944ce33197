//! Response cache for companion suggestions.
//!
//! Identical crop lists and context get the same answer for the cache
//! lifetime, which keeps AI-backed results stable across repeated
//! requests and saves quota. Only successful answers are stored.
//! Identification is never cached (every upload is a new image).

use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::{ExternalAnalysisClient, ImageInput};
use crate::error::AnalysisError;
use crate::types::{AiSuggestion, ConfirmedCrop, RecommendationContext};
use crate::utils::normalize_name;

pub const DEFAULT_CAPACITY: u64 = 1_000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

pub struct CachingClient {
    inner: Arc<dyn ExternalAnalysisClient>,
    cache: Cache<String, Arc<Vec<AiSuggestion>>>,
}

impl CachingClient {
    pub fn new(inner: Arc<dyn ExternalAnalysisClient>) -> Self {
        Self::with_limits(inner, DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    pub fn with_limits(
        inner: Arc<dyn ExternalAnalysisClient>,
        capacity: u64,
        ttl: Duration,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    fn key(crops: &[String], context: &RecommendationContext) -> String {
        let mut names: Vec<String> = crops.iter().map(|c| normalize_name(c)).collect();
        names.sort();
        names.dedup();
        format!("suggest:{}:{}", names.join("|"), context.cache_key())
    }
}

#[async_trait]
impl ExternalAnalysisClient for CachingClient {
    async fn identify(
        &self,
        image: &ImageInput,
        notes: &str,
    ) -> Result<Vec<ConfirmedCrop>, AnalysisError> {
        self.inner.identify(image, notes).await
    }

    async fn suggest(
        &self,
        crops: &[String],
        context: &RecommendationContext,
    ) -> Result<Vec<AiSuggestion>, AnalysisError> {
        let key = Self::key(crops, context);

        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!("Cache hit for companion suggestions");
            return Ok(cached.as_ref().clone());
        }

        let fresh = self.inner.suggest(crops, context).await?;
        self.cache.insert(key, Arc::new(fresh.clone())).await;
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClient {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ExternalAnalysisClient for CountingClient {
        async fn identify(
            &self,
            _: &ImageInput,
            _: &str,
        ) -> Result<Vec<ConfirmedCrop>, AnalysisError> {
            Err(AnalysisError::NoCropsIdentified)
        }

        async fn suggest(
            &self,
            _: &[String],
            _: &RecommendationContext,
        ) -> Result<Vec<AiSuggestion>, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AnalysisError::Blocked);
            }
            Ok(vec![AiSuggestion {
                plant: "Clover".into(),
                reason: "fixes nitrogen".into(),
            }])
        }
    }

    #[tokio::test]
    async fn test_successful_answers_are_cached() {
        let inner = Arc::new(CountingClient {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let client = CachingClient::new(inner.clone());
        let ctx = RecommendationContext::default();

        let first = client.suggest(&["Tomato".into(), "Basil".into()], &ctx).await.unwrap();
        // Same crops, different order and case
        let second = client.suggest(&["basil".into(), "tomato".into()], &ctx).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        let other_ctx = RecommendationContext {
            soil_ph: Some(6.0),
            ..Default::default()
        };
        client.suggest(&["Tomato".into()], &other_ctx).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let inner = Arc::new(CountingClient {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let client = CachingClient::new(inner.clone());
        let ctx = RecommendationContext::default();

        assert!(client.suggest(&["Tomato".into()], &ctx).await.is_err());
        assert!(client.suggest(&["Tomato".into()], &ctx).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
