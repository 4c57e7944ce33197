//! Snapshot holder shared by the engine, the stores and the HTTP layer.
//!
//! Lifecycle: Unloaded -> Loaded -> (reload) -> Loaded. The pointer is
//! swapped atomically and readers never take a lock: a request loads the
//! `Arc` once and reads that snapshot for its whole duration.

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

use super::{LoadReport, PlantKnowledgeBase};
use crate::error::KnowledgeBaseError;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum KnowledgeBaseState {
    Unloaded,
    Loaded { records: usize, loaded_at: DateTime<Utc> },
}

#[derive(Clone, Default)]
pub struct KnowledgeBaseHandle {
    current: Arc<ArcSwapOption<PlantKnowledgeBase>>,
}

impl KnowledgeBaseHandle {
    /// Handle in the Unloaded state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle already holding a snapshot.
    pub fn with_snapshot(snapshot: PlantKnowledgeBase) -> Self {
        let handle = Self::new();
        handle.publish(snapshot);
        handle
    }

    /// The snapshot requests should read, if any.
    pub fn current(&self) -> Option<Arc<PlantKnowledgeBase>> {
        self.current.load_full()
    }

    /// Replace the current snapshot wholesale.
    pub fn publish(&self, snapshot: PlantKnowledgeBase) {
        let records = snapshot.len();
        self.current.store(Some(Arc::new(snapshot)));
        tracing::info!("Published knowledge base snapshot ({} records)", records);
    }

    pub fn state(&self) -> KnowledgeBaseState {
        match self.current() {
            Some(kb) => KnowledgeBaseState::Loaded {
                records: kb.len(),
                loaded_at: kb.loaded_at(),
            },
            None => KnowledgeBaseState::Unloaded,
        }
    }

    /// Rebuild from the plant file.
    ///
    /// On failure the previous snapshot stays current; with none, the
    /// engine keeps running in AI-only mode.
    pub fn reload_from_path(&self, path: &Path) -> Result<LoadReport, KnowledgeBaseError> {
        match PlantKnowledgeBase::from_path(path) {
            Ok((snapshot, report)) => {
                tracing::info!(
                    "Loaded {} plant records from {:?} ({} skipped)",
                    report.loaded,
                    path,
                    report.skipped.len()
                );
                self.publish(snapshot);
                Ok(report)
            }
            Err(e) => {
                match self.state() {
                    KnowledgeBaseState::Loaded { records, .. } => tracing::warn!(
                        "Plant data reload failed ({}); keeping last good snapshot ({} records)",
                        e,
                        records
                    ),
                    KnowledgeBaseState::Unloaded => tracing::warn!(
                        "Plant data load failed ({}); recommendations will use AI only",
                        e
                    ),
                }
                Err(e)
            }
        }
    }
}
