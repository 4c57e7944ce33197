//! FST-based Search Index for Plant Name Lookup
//!
//! Provides prefix and typo-tolerant search across:
//! - Record ids and display names
//! - Scientific names
//! - Aliases (other common names)
//! - Individual words of multi-word names ("basil" -> "Sweet Basil")
//!
//! Built once per snapshot; never mutated afterwards.

use fst::automaton::{Levenshtein, Str};
use fst::{Automaton, IntoStreamer, Map, MapBuilder, Streamer};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::types::PlantRecord;
use crate::utils::normalize_name;

/// Reference to a plant in the index
#[derive(Debug, Clone, serde::Serialize)]
pub struct PlantRef {
    pub id: String,
    pub name: String,
    pub scientific_name: Option<String>,
}

/// FST-based search index for plant lookup
#[derive(Default)]
pub struct SearchIndex {
    /// FST mapping normalized search term -> first plant index
    fst_map: Option<Map<Vec<u8>>>,
    /// All plants (indexed by position)
    plants: Vec<PlantRef>,
    /// Reverse lookup: search term -> list of plant indices (for duplicates)
    term_to_indices: FxHashMap<String, Vec<usize>>,
}

impl SearchIndex {
    /// Build the index over records in iteration order.
    pub fn build<'a, I>(records: I) -> Result<Self, fst::Error>
    where
        I: IntoIterator<Item = &'a PlantRecord>,
    {
        let mut plants: Vec<PlantRef> = Vec::new();
        let mut search_terms: Vec<(String, usize)> = Vec::new(); // (term, plant_index)

        for record in records {
            let plant_idx = plants.len();

            let mut names: Vec<&str> = vec![record.id.as_str(), record.name.as_str()];
            if let Some(sci) = &record.scientific_name {
                names.push(sci.as_str());
            }
            names.extend(record.aliases.iter().map(|a| a.as_str()));

            for raw in names {
                let term = normalize_name(raw);
                if term.is_empty() {
                    continue;
                }

                // Also index individual words (for "basil" matching "sweet basil")
                for word in term.split_whitespace() {
                    if word.len() >= 3 && word != term {
                        search_terms.push((word.to_string(), plant_idx));
                    }
                }
                search_terms.push((term, plant_idx));
            }

            plants.push(PlantRef {
                id: record.id.clone(),
                name: record.name.clone(),
                scientific_name: record.scientific_name.clone(),
            });
        }

        // Sort terms lexicographically (required for FST)
        search_terms.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut term_to_indices: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (term, idx) in &search_terms {
            let indices = term_to_indices.entry(term.clone()).or_default();
            if !indices.contains(idx) {
                indices.push(*idx);
            }
        }

        // FST requires unique keys
        let mut builder = MapBuilder::memory();
        let mut last_term: Option<&str> = None;
        for (term, idx) in &search_terms {
            if last_term != Some(term.as_str()) {
                builder.insert(term.as_bytes(), *idx as u64)?;
                last_term = Some(term.as_str());
            }
        }
        let fst_map = Map::new(builder.into_inner()?)?;

        tracing::debug!(
            "Search index built ({} plants, {} unique terms, {} bytes)",
            plants.len(),
            term_to_indices.len(),
            fst_map.as_fst().as_bytes().len()
        );

        Ok(Self {
            fst_map: Some(fst_map),
            plants,
            term_to_indices,
        })
    }

    /// Prefix search (for typeahead)
    pub fn search_prefix(&self, query: &str, limit: usize) -> Vec<&PlantRef> {
        let query_norm = normalize_name(query);
        if query_norm.is_empty() {
            return vec![];
        }
        let Some(map) = &self.fst_map else {
            return vec![];
        };

        let prefix = Str::new(&query_norm).starts_with();
        self.collect(map.search(prefix).into_stream(), limit)
    }

    /// Fuzzy search (allows typos)
    pub fn search_fuzzy(&self, query: &str, max_distance: u32, limit: usize) -> Vec<&PlantRef> {
        let query_norm = normalize_name(query);
        if query_norm.is_empty() {
            return vec![];
        }
        let Some(map) = &self.fst_map else {
            return vec![];
        };

        let lev = match Levenshtein::new(&query_norm, max_distance) {
            Ok(l) => l,
            Err(_) => return self.search_prefix(query, limit), // Fallback to prefix
        };

        self.collect(map.search(lev).into_stream(), limit)
    }

    /// Combined search: prefix first, then fuzzy if under half the limit matched.
    ///
    /// Typeahead only. Exact identification goes through
    /// `PlantKnowledgeBase::lookup`, which never guesses.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&PlantRef> {
        let prefix_results = self.search_prefix(query, limit);

        if prefix_results.len() >= limit.div_ceil(2) {
            return prefix_results;
        }

        // If few prefix results, try fuzzy with 1 typo
        if query.trim().len() >= 3 {
            let fuzzy_results = self.search_fuzzy(query, 1, limit);
            if fuzzy_results.len() > prefix_results.len() {
                return fuzzy_results;
            }
        }

        prefix_results
    }

    fn collect<'s, S>(&'s self, mut stream: S, limit: usize) -> Vec<&'s PlantRef>
    where
        S: for<'a> Streamer<'a, Item = (&'a [u8], u64)>,
    {
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        let mut results: Vec<&PlantRef> = Vec::new();

        while let Some((term, _idx)) = stream.next() {
            let Ok(term_str) = std::str::from_utf8(term) else {
                continue;
            };
            if let Some(indices) = self.term_to_indices.get(term_str) {
                for &plant_idx in indices {
                    if let Some(plant) = self.plants.get(plant_idx) {
                        if seen.insert(plant_idx) {
                            results.push(plant);
                            if results.len() >= limit {
                                return results;
                            }
                        }
                    }
                }
            }
        }

        results
    }

    /// Get index statistics
    pub fn stats(&self) -> SearchIndexStats {
        SearchIndexStats {
            plant_count: self.plants.len(),
            term_count: self.term_to_indices.len(),
            fst_bytes: self
                .fst_map
                .as_ref()
                .map(|m| m.as_fst().as_bytes().len())
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SearchIndexStats {
    pub plant_count: usize,
    pub term_count: usize,
    pub fst_bytes: usize,
}
