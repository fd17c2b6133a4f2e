//! Saved-project storage
//!
//! Persists generated units so a user can reopen them later. A single JSON
//! file holds an ordered list of records; load tolerates a missing file,
//! every failure is a typed error the caller can surface, and no durability
//! beyond a successful write is promised.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::classify::RequestCategory;
use crate::normalize::NormalizedUnit;

/// One saved project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    /// Display name shown in the shell's project list.
    pub name: String,
    /// The request text the unit was generated from.
    pub request: String,
    pub unit: NormalizedUnit,
    pub category: RequestCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    pub fn new(
        name: impl Into<String>,
        request: impl Into<String>,
        unit: NormalizedUnit,
        category: RequestCategory,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            request: request.into(),
            unit,
            category,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse project list: {0}")]
    Parse(serde_json::Error),
    #[error("failed to serialize project list: {0}")]
    Serialize(serde_json::Error),
}

/// JSON-file-backed project list.
pub struct ProjectStore {
    path: PathBuf,
}

impl ProjectStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load all records, oldest first. A missing file is an empty list.
    pub async fn load(&self) -> Result<Vec<ProjectRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path).await.map_err(StoreError::Io)?;
        serde_json::from_str(&contents).map_err(StoreError::Parse)
    }

    /// Insert or replace a record by id. Replacement refreshes `updated_at`
    /// and keeps the record's position in the list.
    pub async fn upsert(&self, record: ProjectRecord) -> Result<(), StoreError> {
        let mut records = self.load().await?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                *existing = ProjectRecord { updated_at: Utc::now(), ..record };
            }
            None => records.push(record),
        }
        self.persist(&records).await
    }

    /// Delete a record by id. Returns whether anything was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.load().await?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.persist(&records).await?;
        Ok(true)
    }

    async fn persist(&self, records: &[ProjectRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(StoreError::Io)?;
        }
        let contents = serde_json::to_string_pretty(records).map_err(StoreError::Serialize)?;
        fs::write(&self.path, contents).await.map_err(StoreError::Io)?;
        log::debug!("saved {} project record(s) to {:?}", records.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn record(name: &str) -> ProjectRecord {
        ProjectRecord::new(
            name,
            "a button",
            normalize("function Btn(){return <button>x</button>;}"),
            RequestCategory::Simple,
        )
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("projects.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_and_load_preserve_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("projects.json"));

        let first = record("first");
        let second = record("second");
        store.upsert(first.clone()).await.unwrap();
        store.upsert(second.clone()).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, first.id);
        assert_eq!(loaded[1].id, second.id);
        assert_eq!(loaded[0].unit, first.unit);
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("projects.json"));

        let mut rec = record("before");
        store.upsert(rec.clone()).await.unwrap();
        rec.name = "after".to_string();
        store.upsert(rec.clone()).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "after");
        assert!(loaded[0].updated_at >= loaded[0].created_at);
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("projects.json"));

        let keep = record("keep");
        let drop = record("drop");
        store.upsert(keep.clone()).await.unwrap();
        store.upsert(drop.clone()).await.unwrap();

        assert!(store.delete(&drop.id).await.unwrap());
        assert!(!store.delete(&drop.id).await.unwrap());

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, keep.id);
    }
}
