//! Plant Knowledge Base
//!
//! Immutable snapshot over `id -> PlantRecord` with:
//! - Exact and normalized name matching (ids, names, scientific names, aliases)
//! - Singular/plural tolerance (typo-tolerant matching is `search` only)
//! - Companion / antagonist traversal for the recommendation engine
//!
//! A snapshot is never mutated after `load`. Edits produce a new snapshot
//! which is published through `KnowledgeBaseHandle`.

pub mod handle;
pub mod schema;
pub mod search_index;

pub use handle::{KnowledgeBaseHandle, KnowledgeBaseState};
pub use schema::SkippedRecord;
pub use search_index::{PlantRef, SearchIndex, SearchIndexStats};

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::KnowledgeBaseError;
use crate::types::{PlantDetails, PlantRecord};
use crate::utils::{display_label, name_variants, normalize_name, singular_form};

/// Identity used for every equality/dedup decision.
///
/// Names that resolve to a record compare by record id; anything else
/// compares by its folded label, so "Marigolds" and "marigold" collapse
/// even when no record exists for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalKey {
    Record(String),
    Label(String),
}

/// Outcome of building a snapshot from a document.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedRecord>,
}

/// Point-in-time view of the plant data.
pub struct PlantKnowledgeBase {
    records: BTreeMap<String, PlantRecord>,
    /// normalized term -> record id
    name_index: FxHashMap<String, String>,
    search_index: SearchIndex,
    loaded_at: DateTime<Utc>,
}

impl PlantKnowledgeBase {
    /// Build a snapshot from already-validated records.
    pub fn load(records: BTreeMap<String, PlantRecord>) -> Self {
        let mut name_index: FxHashMap<String, String> = FxHashMap::default();

        // Priority: ids, then display names, then scientific names, then aliases.
        // Within a tier the first record (by id) wins.
        for record in records.values() {
            insert_term(&mut name_index, &record.id, &record.id);
        }
        for record in records.values() {
            insert_term(&mut name_index, &record.name, &record.id);
        }
        for record in records.values() {
            if let Some(sci) = &record.scientific_name {
                insert_term(&mut name_index, sci, &record.id);
            }
        }
        for record in records.values() {
            for alias in &record.aliases {
                insert_term(&mut name_index, alias, &record.id);
            }
        }

        let search_index = SearchIndex::build(records.values()).unwrap_or_else(|e| {
            tracing::warn!("Failed to build plant search index: {}", e);
            SearchIndex::default()
        });

        tracing::debug!("Knowledge base snapshot built ({} records)", records.len());

        Self {
            records,
            name_index,
            search_index,
            loaded_at: Utc::now(),
        }
    }

    /// Snapshot with no records. Every lookup misses.
    pub fn empty() -> Self {
        Self::load(BTreeMap::new())
    }

    /// Parse and validate a JSON document, then build a snapshot.
    pub fn from_json_str(json: &str) -> Result<(Self, LoadReport), KnowledgeBaseError> {
        let doc: serde_json::Value = serde_json::from_str(json)?;
        let (records, skipped) = schema::parse_document(&doc)?;

        for skip in &skipped {
            tracing::warn!("Skipping plant record {}: {}", skip.key, skip.reason);
        }

        let report = LoadReport {
            loaded: records.len(),
            skipped,
        };
        Ok((Self::load(records), report))
    }

    /// Read, parse and validate a plant file.
    pub fn from_path(path: &Path) -> Result<(Self, LoadReport), KnowledgeBaseError> {
        let contents = std::fs::read_to_string(path).map_err(|source| KnowledgeBaseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Find the record for a free-text name or id.
    ///
    /// Not-found is a normal outcome: unknown plants simply contribute
    /// nothing locally. A name one letter away from a record is a different
    /// plant ("Pear" is not "Pea"), so no edit distance is applied here.
    pub fn lookup(&self, name: &str) -> Option<&PlantRecord> {
        let normalized = normalize_name(name);
        if normalized.is_empty() {
            return None;
        }

        name_variants(&normalized)
            .iter()
            .find_map(|variant| self.name_index.get(variant))
            .and_then(|id| self.records.get(id))
    }

    /// Direct access by exact record id.
    pub fn get(&self, id: &str) -> Option<&PlantRecord> {
        self.records.get(id)
    }

    /// Identity of a name for dedup purposes.
    pub fn canonical_key(&self, name: &str) -> CanonicalKey {
        match self.lookup(name) {
            Some(record) => CanonicalKey::Record(record.id.clone()),
            None => CanonicalKey::Label(singular_form(&normalize_name(name))),
        }
    }

    /// Companions of the matched record, minus anything the same record
    /// also lists as an antagonist. Empty when the name is unknown.
    pub fn companions_of(&self, name: &str) -> BTreeSet<String> {
        let Some(record) = self.lookup(name) else {
            return BTreeSet::new();
        };

        let excluded: BTreeSet<CanonicalKey> = record
            .antagonistic_plants
            .iter()
            .map(|a| self.canonical_key(a))
            .collect();

        record
            .companion_plants
            .iter()
            .filter(|c| !excluded.contains(&self.canonical_key(c)))
            .cloned()
            .collect()
    }

    /// Antagonists of the matched record. Empty when the name is unknown.
    pub fn antagonists_of(&self, name: &str) -> BTreeSet<String> {
        self.lookup(name)
            .map(|r| r.antagonistic_plants.clone())
            .unwrap_or_default()
    }

    /// Whatever soil/growing/harvest/benefit data is known for a plant.
    pub fn details_for(&self, name: &str) -> Option<PlantDetails> {
        let record = self.lookup(name)?;
        Some(PlantDetails {
            id: record.id.clone(),
            name: record.name.clone(),
            label: display_label(&record.name, record.scientific_name.as_deref()),
            soil: record.soil_requirements.clone().filter(|s| !s.is_empty()),
            growing: record.growing_conditions.clone().filter(|g| !g.is_empty()),
            harvest: record.harvest_info.clone().filter(|h| !h.is_empty()),
            benefits: record.benefits.iter().cloned().collect(),
        })
    }

    /// Prefix/fuzzy search for typeahead.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&PlantRecord> {
        self.search_index
            .search(query, limit)
            .into_iter()
            .filter_map(|p| self.records.get(&p.id))
            .collect()
    }

    pub fn records(&self) -> &BTreeMap<String, PlantRecord> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn index_stats(&self) -> SearchIndexStats {
        self.search_index.stats()
    }
}

fn insert_term(index: &mut FxHashMap<String, String>, raw: &str, id: &str) {
    let term = normalize_name(raw);
    if !term.is_empty() {
        index.entry(term).or_insert_with(|| id.to_string());
    }
}
