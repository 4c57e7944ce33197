//! Error types
//!
//! One enum per concern. "Plant not in the knowledge base" is not an error
//! (lookups return `Option`); only the conditions callers must handle
//! distinctly live here.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The knowledge-base backing data could not be turned into a snapshot.
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    #[error("failed to read plant data {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("plant data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("plant data has an unexpected shape: {0}")]
    InvalidShape(String),
}

/// The external analysis service could not produce a usable answer.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis service is not configured (missing API key)")]
    NotConfigured,

    #[error("analysis service timed out after {0:?}")]
    Timeout(Duration),

    #[error("analysis request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("analysis service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model response was blocked or empty")]
    Blocked,

    #[error("could not parse model response: {0}")]
    Malformed(String),

    #[error("could not identify any crops")]
    NoCropsIdentified,
}

/// `recommend` could not produce a result.
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("no confirmed crops provided")]
    EmptyCropList,

    /// Nothing known locally and the AI fallback failed. Distinct from an
    /// empty-but-successful result.
    #[error("no recommendations available; try different crops or context")]
    Unavailable {
        #[source]
        cause: Option<AnalysisError>,
    },
}

/// JSON-file store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file {path:?} is corrupt: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to replace {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("invalid input: {0}")]
    Invalid(String),
}
