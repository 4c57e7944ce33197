//! Local candidate pool and ranking
//!
//! Pure functions over one knowledge-base snapshot. No I/O, no AI.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::cmp::Ordering;

use super::benefits::benefit_score;
use super::reasons::database_reason;
use crate::knowledge_base::{CanonicalKey, PlantKnowledgeBase};
use crate::types::{Recommendation, RecommendationContext, RecommendationSource};

/// Confirmed crops after blank removal and canonical dedup.
#[derive(Debug, Clone)]
pub struct ConfirmedSet {
    /// Display names in input order.
    pub names: Vec<String>,
    pub keys: FxHashSet<CanonicalKey>,
}

impl ConfirmedSet {
    pub fn new<'a, I>(kb: &PlantKnowledgeBase, crops: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut names = Vec::new();
        let mut keys = FxHashSet::default();
        for raw in crops {
            let name = raw.trim();
            if name.is_empty() {
                continue;
            }
            if keys.insert(kb.canonical_key(name)) {
                names.push(name.to_string());
            }
        }
        Self { names, keys }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Rules that remove a candidate regardless of where it came from.
#[derive(Debug, Default)]
pub struct Exclusions {
    /// Antagonists listed by any confirmed crop.
    antagonists: FxHashSet<CanonicalKey>,
}

impl Exclusions {
    pub fn new(kb: &PlantKnowledgeBase, confirmed: &ConfirmedSet) -> Self {
        let antagonists = confirmed
            .names
            .iter()
            .flat_map(|crop| kb.antagonists_of(crop))
            .map(|a| kb.canonical_key(&a))
            .collect();
        Self { antagonists }
    }

    /// Should a candidate named `name` (with canonical `key`) be dropped?
    pub fn excludes(
        &self,
        kb: &PlantKnowledgeBase,
        confirmed: &ConfirmedSet,
        key: &CanonicalKey,
        name: &str,
    ) -> bool {
        if confirmed.keys.contains(key) || self.antagonists.contains(key) {
            return true;
        }

        // Reverse direction: the candidate dislikes one of the crops.
        kb.lookup(name).is_some_and(|record| {
            record
                .antagonistic_plants
                .iter()
                .any(|a| confirmed.keys.contains(&kb.canonical_key(a)))
        })
    }
}

/// A candidate gathered from companion lists.
#[derive(Debug, Clone)]
struct Candidate {
    name: String,
    record_id: Option<String>,
    paired_with: SmallVec<[String; 4]>,
    score: u32,
}

/// Result of the local pass.
#[derive(Debug)]
pub struct LocalRanking {
    /// Distinct candidates before any exclusion.
    pub pool_size: usize,
    pub recommendations: Vec<Recommendation>,
}

/// Gather, filter and rank database companions for the confirmed crops.
pub fn rank_local(
    kb: &PlantKnowledgeBase,
    confirmed: &ConfirmedSet,
    exclusions: &Exclusions,
    context: &RecommendationContext,
) -> LocalRanking {
    let mut order: Vec<CanonicalKey> = Vec::new();
    let mut pool: FxHashMap<CanonicalKey, Candidate> = FxHashMap::default();

    for crop in &confirmed.names {
        for companion in kb.companions_of(crop) {
            let key = kb.canonical_key(&companion);
            let entry = pool.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                let record = kb.lookup(&companion);
                Candidate {
                    name: record
                        .map(|r| r.name.clone())
                        .unwrap_or_else(|| companion.trim().to_string()),
                    record_id: record.map(|r| r.id.clone()),
                    paired_with: SmallVec::new(),
                    score: record.map(|r| benefit_score(&r.benefits)).unwrap_or(0),
                }
            });
            if !entry.paired_with.contains(crop) {
                entry.paired_with.push(crop.clone());
            }
        }
    }

    let pool_size = order.len();

    let mut survivors: Vec<Candidate> = order
        .into_iter()
        .filter_map(|key| {
            let candidate = pool.remove(&key)?;
            if exclusions.excludes(kb, confirmed, &key, &candidate.name) {
                tracing::debug!("Excluding candidate {}", candidate.name);
                None
            } else {
                Some(candidate)
            }
        })
        .collect();

    survivors.sort_by(compare_candidates);

    let recommendations = survivors
        .into_iter()
        .map(|c| {
            let record = c.record_id.as_deref().and_then(|id| kb.get(id));
            Recommendation {
                reason: database_reason(&c.paired_with, record, context),
                plant: c.name,
                source: RecommendationSource::Database,
                support: Some(c.paired_with.len()),
                paired_with: c.paired_with,
            }
        })
        .collect();

    LocalRanking {
        pool_size,
        recommendations,
    }
}

/// Support desc, benefit score desc, name asc (case-insensitive, then exact).
fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.paired_with
        .len()
        .cmp(&a.paired_with.len())
        .then_with(|| b.score.cmp(&a.score))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}
