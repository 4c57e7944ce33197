//! Runtime configuration from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::analysis::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::analysis::GeminiSettings;
use crate::recommendation::{EngineConfig, DEFAULT_MIN_LOCAL_CANDIDATES};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub plants_file: PathBuf,
    pub diary_file: PathBuf,
    pub history_file: PathBuf,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub ai_timeout: Duration,
    pub min_local_candidates: usize,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_dir =
            PathBuf::from(get("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));
        let file = |key: &str, default: &str| {
            get(key).map(PathBuf::from).unwrap_or_else(|| data_dir.join(default))
        };

        Self {
            plants_file: file("PLANTS_FILE", "plants.json"),
            diary_file: file("DIARY_FILE", "diary.json"),
            history_file: file("HISTORY_FILE", "history.json"),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            ai_timeout: Duration::from_secs(parse_or(
                "AI_TIMEOUT_SECS",
                get("AI_TIMEOUT_SECS"),
                DEFAULT_AI_TIMEOUT_SECS,
            )),
            min_local_candidates: parse_or(
                "MIN_LOCAL_CANDIDATES",
                get("MIN_LOCAL_CANDIDATES"),
                DEFAULT_MIN_LOCAL_CANDIDATES,
            ),
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT),
            data_dir,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            ai_timeout: self.ai_timeout,
            min_local_candidates: self.min_local_candidates,
        }
    }

    /// Settings for the Gemini client; `None` without an API key.
    pub fn gemini_settings(&self) -> Option<GeminiSettings> {
        let key = self.gemini_api_key.as_ref()?;
        let mut settings = GeminiSettings::new(key.clone());
        settings.model = self.gemini_model.clone();
        settings.base_url = self.gemini_base_url.clone();
        // The engine's own timeout is the tighter bound; this just stops
        // identification uploads from hanging.
        settings.timeout = self.ai_timeout.max(Duration::from_secs(30));
        Some(settings)
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(
    key: &str,
    raw: Option<String>,
    default: T,
) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {}={:?}, using default {}", key, raw, default);
            default
        }),
    }
}
