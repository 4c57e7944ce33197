//! Farming diary
//!
//! Dated notes about the plot: what was planted, sprayed, harvested, and
//! the weather at the time. Ids increase monotonically and are never
//! reused, even after deletes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{read_json, write_json_atomic, Page};
use crate::error::StoreError;
use crate::utils::{normalize_name, singular_form};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: u64,
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub crops: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied fields for create/update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiaryEntryInput {
    /// Defaults to today (UTC).
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub crops: Vec<String>,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub weather: Option<String>,
}

impl DiaryEntryInput {
    fn validate(&self) -> Result<(), StoreError> {
        if self.title.trim().is_empty() {
            return Err(StoreError::Invalid("diary entry needs a title".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiaryQuery {
    /// Only entries mentioning this crop.
    pub crop: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Substring of title or notes.
    pub q: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct DiaryFile {
    next_id: u64,
    entries: Vec<DiaryEntry>,
}

/// Older files are a bare array of entries.
#[derive(Deserialize)]
#[serde(untagged)]
enum DiaryDocument {
    Current(DiaryFile),
    Legacy(Vec<DiaryEntry>),
}

pub struct DiaryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl DiaryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Newest date first, then newest id.
    pub async fn list(&self, query: &DiaryQuery) -> Result<Page<DiaryEntry>, StoreError> {
        let file = self.read_file()?;

        let crop = query.crop.as_deref().map(crop_key).filter(|c| !c.is_empty());
        let needle = query
            .q
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let mut entries: Vec<DiaryEntry> = file
            .entries
            .into_iter()
            .filter(|e| query.from.map_or(true, |from| e.date >= from))
            .filter(|e| query.to.map_or(true, |to| e.date <= to))
            .filter(|e| {
                crop.as_deref()
                    .map_or(true, |c| e.crops.iter().any(|x| crop_key(x) == c))
            })
            .filter(|e| {
                needle.as_deref().map_or(true, |q| {
                    e.title.to_lowercase().contains(q) || e.notes.to_lowercase().contains(q)
                })
            })
            .collect();

        entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        Ok(Page::paginate(entries, query.page, query.per_page))
    }

    pub async fn get(&self, id: u64) -> Result<DiaryEntry, StoreError> {
        self.read_file()?
            .entries
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, input: DiaryEntryInput) -> Result<DiaryEntry, StoreError> {
        input.validate()?;

        let _guard = self.write_lock.lock().await;
        let mut file = self.read_file()?;

        let id = file.next_id;
        // Only reachable once an entry holds u64::MAX
        if file.entries.iter().any(|e| e.id == id) {
            return Err(StoreError::Conflict(format!("diary entry {} (ids exhausted)", id)));
        }

        let now = Utc::now();
        let entry = DiaryEntry {
            id,
            date: input.date.unwrap_or_else(|| now.date_naive()),
            title: input.title.trim().to_string(),
            notes: input.notes,
            crops: clean_crops(input.crops),
            activity: clean_tag(input.activity),
            weather: clean_tag(input.weather),
            created_at: now,
            updated_at: now,
        };

        file.next_id = id.saturating_add(1);
        file.entries.push(entry.clone());
        write_json_atomic(&self.path, &file)?;

        tracing::info!("Created diary entry {}", entry.id);
        Ok(entry)
    }

    /// Replace the editable fields; `created_at` is kept.
    pub async fn update(&self, id: u64, input: DiaryEntryInput) -> Result<DiaryEntry, StoreError> {
        input.validate()?;

        let _guard = self.write_lock.lock().await;
        let mut file = self.read_file()?;
        let entry = file.entries.iter_mut().find(|e| e.id == id).ok_or_else(|| not_found(id))?;

        if let Some(date) = input.date {
            entry.date = date;
        }
        entry.title = input.title.trim().to_string();
        entry.notes = input.notes;
        entry.crops = clean_crops(input.crops);
        entry.activity = clean_tag(input.activity);
        entry.weather = clean_tag(input.weather);
        entry.updated_at = Utc::now();

        let updated = entry.clone();
        write_json_atomic(&self.path, &file)?;
        tracing::info!("Updated diary entry {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: u64) -> Result<DiaryEntry, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.read_file()?;
        let pos = file.entries.iter().position(|e| e.id == id).ok_or_else(|| not_found(id))?;
        let removed = file.entries.remove(pos);

        write_json_atomic(&self.path, &file)?;
        tracing::info!("Deleted diary entry {}", id);
        Ok(removed)
    }

    fn read_file(&self) -> Result<DiaryFile, StoreError> {
        let mut file = match read_json::<DiaryDocument>(&self.path)? {
            None => DiaryFile::default(),
            Some(DiaryDocument::Current(file)) => file,
            Some(DiaryDocument::Legacy(entries)) => DiaryFile {
                next_id: 0,
                entries,
            },
        };

        // Never hand out an id at or below one already on disk
        let floor = file
            .entries
            .iter()
            .map(|e| e.id.saturating_add(1))
            .max()
            .unwrap_or(1);
        file.next_id = file.next_id.max(floor);
        Ok(file)
    }
}

fn not_found(id: u64) -> StoreError {
    StoreError::NotFound(format!("diary entry {}", id))
}

/// Plural-insensitive identity of a crop name.
fn crop_key(name: &str) -> String {
    singular_form(&normalize_name(name))
}

fn clean_crops(crops: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for crop in crops {
        let crop = crop.trim();
        if !crop.is_empty() && !out.iter().any(|c| crop_key(c) == crop_key(crop)) {
            out.push(crop.to_string());
        }
    }
    out
}

fn clean_tag(tag: Option<String>) -> Option<String> {
    tag.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
