//! Plant database file and its CRUD operations.
//!
//! Every successful write publishes a fresh knowledge-base snapshot, so
//! the recommendation engine sees edits on its next request.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{read_json, write_json_atomic, Page};
use crate::error::StoreError;
use crate::knowledge_base::schema::{parse_document, parse_record};
use crate::knowledge_base::{KnowledgeBaseHandle, PlantKnowledgeBase, SkippedRecord};
use crate::recommendation::benefits::canonical_tag;
use crate::types::PlantRecord;
use crate::utils::normalize_name;

/// Filters for `PlantStore::list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlantQuery {
    /// Substring of id, name, scientific name or alias.
    pub q: Option<String>,
    /// Benefit tag the plant must carry (aliases accepted).
    pub benefit: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: Vec<SkippedRecord>,
    pub total: usize,
}

pub struct PlantStore {
    path: PathBuf,
    handle: KnowledgeBaseHandle,
    write_lock: Mutex<()>,
}

impl PlantStore {
    pub fn new(path: impl Into<PathBuf>, handle: KnowledgeBaseHandle) -> Self {
        Self {
            path: path.into(),
            handle,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn list(&self, query: &PlantQuery) -> Result<Page<PlantRecord>, StoreError> {
        let records = self.read_all()?;

        let needle = query.q.as_deref().map(normalize_name).filter(|q| !q.is_empty());
        let benefit = query.benefit.as_deref().map(canonical_tag).filter(|b| !b.is_empty());

        let mut matches: Vec<PlantRecord> = records
            .into_values()
            .filter(|r| needle.as_deref().map_or(true, |q| matches_text(r, q)))
            .filter(|r| {
                benefit
                    .as_deref()
                    .map_or(true, |b| r.benefits.iter().any(|t| canonical_tag(t) == b))
            })
            .collect();

        matches.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(Page::paginate(matches, query.page, query.per_page))
    }

    pub async fn get(&self, id: &str) -> Result<PlantRecord, StoreError> {
        self.read_all()?
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(format!("plant {}", id)))
    }

    /// Add a record. The id comes from the body's `id` field or is
    /// slugified from the name.
    pub async fn create(&self, body: &Value) -> Result<PlantRecord, StoreError> {
        let record = record_from_body(None, body)?;

        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all()?;
        if records.contains_key(&record.id) {
            return Err(StoreError::Conflict(format!("plant {}", record.id)));
        }

        records.insert(record.id.clone(), record.clone());
        self.commit(records)?;
        tracing::info!("Created plant {}", record.id);
        Ok(record)
    }

    /// Replace an existing record. The path id wins over any id in the body.
    pub async fn update(&self, id: &str, body: &Value) -> Result<PlantRecord, StoreError> {
        let record = record_from_body(Some(id), body)?;

        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all()?;
        if !records.contains_key(id) {
            return Err(StoreError::NotFound(format!("plant {}", id)));
        }

        records.insert(record.id.clone(), record.clone());
        self.commit(records)?;
        tracing::info!("Updated plant {}", id);
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> Result<PlantRecord, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all()?;
        let removed = records
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(format!("plant {}", id)))?;

        self.commit(records)?;
        tracing::info!("Deleted plant {}", id);
        Ok(removed)
    }

    /// Merge a whole document into the store, overwriting records with the
    /// same id. Invalid records are reported, not fatal.
    pub async fn import(&self, document: &Value) -> Result<ImportReport, StoreError> {
        let (incoming, skipped) =
            parse_document(document).map_err(|e| StoreError::Invalid(e.to_string()))?;

        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all()?;
        let imported = incoming.len();
        records.extend(incoming);
        let total = records.len();

        self.commit(records)?;
        tracing::info!("Imported {} plants ({} skipped, {} total)", imported, skipped.len(), total);
        Ok(ImportReport {
            imported,
            skipped,
            total,
        })
    }

    fn read_all(&self) -> Result<BTreeMap<String, PlantRecord>, StoreError> {
        let Some(doc) = read_json::<Value>(&self.path)? else {
            return Ok(BTreeMap::new());
        };

        let (records, skipped) =
            parse_document(&doc).map_err(|e| StoreError::Invalid(e.to_string()))?;
        for skip in &skipped {
            tracing::warn!("Plant file entry {} ignored: {}", skip.key, skip.reason);
        }
        Ok(records)
    }

    /// Persist and publish. Called with the write lock held.
    fn commit(&self, records: BTreeMap<String, PlantRecord>) -> Result<(), StoreError> {
        write_json_atomic(&self.path, &records)?;
        self.handle.publish(PlantKnowledgeBase::load(records));
        Ok(())
    }
}

fn record_from_body(id: Option<&str>, body: &Value) -> Result<PlantRecord, StoreError> {
    let obj = body
        .as_object()
        .ok_or_else(|| StoreError::Invalid("plant must be a JSON object".to_string()))?;
    parse_record(id, obj).map_err(StoreError::Invalid)
}

fn matches_text(record: &PlantRecord, needle: &str) -> bool {
    std::iter::once(record.id.as_str())
        .chain(std::iter::once(record.name.as_str()))
        .chain(record.scientific_name.as_deref())
        .chain(record.aliases.iter().map(|a| a.as_str()))
        .any(|text| normalize_name(text).contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_slugifies_and_publishes() {
        let dir = tempfile::tempdir().unwrap();
        let handle = KnowledgeBaseHandle::new();
        let store = PlantStore::new(dir.path().join("plants.json"), handle.clone());

        let created = store
            .create(&json!({"name": "Sweet Potato", "companions": "beans, thyme"}))
            .await
            .unwrap();
        assert_eq!(created.id, "sweet_potato");
        assert_eq!(created.companion_plants.len(), 2);

        let kb = handle.current().unwrap();
        assert_eq!(kb.lookup("sweet potatoes").unwrap().id, "sweet_potato");

        assert!(matches!(
            store.create(&json!({"name": "Sweet Potato"})).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            store.create(&json!({"benefits": []})).await,
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn test_matches_text() {
        let mut record = PlantRecord::new("marigold", "Marigold");
        record.scientific_name = Some("Tagetes erecta".to_string());
        assert!(matches_text(&record, "tagetes"));
        assert!(matches_text(&record, "mari"));
        assert!(!matches_text(&record, "basil"));
    }
}
