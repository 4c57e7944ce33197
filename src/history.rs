//! Historical season data for the farm plot.
//!
//! Static input, loaded once at startup. Never fatal: a missing or broken
//! file just means the AI prompt says no history is available.

use serde::Deserialize;
use std::path::Path;

use crate::types::HistoricalSeason;

#[derive(Debug, Clone, Default)]
pub struct History {
    pub seasons: Vec<HistoricalSeason>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryDocument {
    Wrapped { history: Vec<HistoricalSeason> },
    Bare(Vec<HistoricalSeason>),
}

impl History {
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("No historical data at {:?}: {}", path, e);
                return Self::default();
            }
        };

        match Self::from_json_str(&contents) {
            Ok(history) => {
                tracing::info!("Loaded {} historical seasons", history.seasons.len());
                history
            }
            Err(e) => {
                tracing::warn!("Ignoring invalid historical data {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let seasons = match serde_json::from_str::<HistoryDocument>(json)? {
            HistoryDocument::Wrapped { history } => history,
            HistoryDocument::Bare(seasons) => seasons,
        };
        Ok(Self { seasons })
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }
}
