//! Local brute-force knowledge store.
//!
//! Keeps every record and its embedding in memory and scores all of them on
//! each query. When opened with a path, the index is loaded from and saved
//! to a JSON file.

use super::KnowledgeStore;
use crate::embedding::{Embedder, cosine_similarity};
use crate::models::CaseRecord;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// A stored record with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCase {
    record: CaseRecord,
    embedding: Vec<f32>,
}

/// Index data for serialization.
#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexData {
    dimensions: usize,
    cases: HashMap<String, StoredCase>,
}

/// Brute-force cosine knowledge store.
pub struct LocalStore {
    /// Path to the index file; `None` for in-memory.
    index_path: Option<PathBuf>,
    /// Embedder owned by the store.
    embedder: Arc<dyn Embedder>,
    /// Records below this score are dropped from query results.
    min_score: Option<f32>,
    /// In-memory records: id -> case.
    cases: Mutex<HashMap<String, StoredCase>>,
}

impl LocalStore {
    /// Creates an in-memory store (no file persistence).
    #[must_use]
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            index_path: None,
            embedder,
            min_score: None,
            cases: Mutex::new(HashMap::new()),
        }
    }

    /// Opens a store persisted at `path`, loading it if the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it was
    /// written with different embedding dimensions.
    pub fn open(path: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let index_path = path.into();
        let cases = load(&index_path, embedder.dimensions())?;
        tracing::debug!(
            path = %index_path.display(),
            records = cases.len(),
            "Opened local knowledge store"
        );
        Ok(Self {
            index_path: Some(index_path),
            embedder,
            min_score: None,
            cases: Mutex::new(cases),
        })
    }

    /// Drops query results scoring below `min_score` (in `[0, 1]`).
    #[must_use]
    pub const fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    /// Returns the index path, if persisted.
    #[must_use]
    pub fn index_path(&self) -> Option<&Path> {
        self.index_path.as_deref()
    }

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Returns up to `k` records with their similarity scores, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails or the lock is poisoned.
    pub fn query_scored(&self, text: &str, k: usize) -> Result<Vec<(CaseRecord, f32)>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(text)?;
        let cases = self.lock()?;

        let mut scores: Vec<(&StoredCase, f32)> = cases
            .values()
            .map(|case| (case, cosine_similarity(&query_embedding, &case.embedding)))
            .filter(|(_, score)| self.min_score.is_none_or(|min| *score >= min))
            .collect();

        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scores
            .into_iter()
            .take(k)
            .map(|(case, score)| (case.record.clone(), score))
            .collect())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredCase>>> {
        self.cases.lock().map_err(|e| Error::OperationFailed {
            operation: "lock_local_store".to_string(),
            cause: e.to_string(),
        })
    }

    /// Writes the index to a temporary file, then renames it into place.
    fn save(&self, cases: &HashMap<String, StoredCase>) -> Result<()> {
        let Some(path) = &self.index_path else {
            return Ok(());
        };

        let data = IndexData {
            dimensions: self.embedder.dimensions(),
            cases: cases.clone(),
        };

        let content = serde_json::to_string(&data).map_err(|e| Error::OperationFailed {
            operation: "serialize_index".to_string(),
            cause: e.to_string(),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_index_dir".to_string(),
                cause: e.to_string(),
            })?;
        }

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content).map_err(|e| Error::OperationFailed {
            operation: "write_index".to_string(),
            cause: e.to_string(),
        })?;
        fs::rename(&tmp_path, path).map_err(|e| Error::OperationFailed {
            operation: "rename_index".to_string(),
            cause: e.to_string(),
        })
    }
}

/// Loads an index file; a missing file is an empty index.
fn load(path: &Path, dimensions: usize) -> Result<HashMap<String, StoredCase>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let content = fs::read_to_string(path).map_err(|e| Error::OperationFailed {
        operation: "load_index".to_string(),
        cause: e.to_string(),
    })?;

    let data: IndexData = serde_json::from_str(&content).map_err(|e| Error::OperationFailed {
        operation: "parse_index".to_string(),
        cause: e.to_string(),
    })?;

    if data.dimensions != dimensions {
        return Err(Error::InvalidInput(format!(
            "Index dimensions mismatch: expected {dimensions}, got {}",
            data.dimensions
        )));
    }

    Ok(data.cases)
}

impl KnowledgeStore for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    fn upsert(&self, records: &[CaseRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;

        let mut cases = self.lock()?;
        let mut updated = cases.clone();
        for (record, embedding) in records.iter().zip(embeddings) {
            updated.insert(
                Uuid::new_v4().to_string(),
                StoredCase {
                    record: record.clone(),
                    embedding,
                },
            );
        }
        self.save(&updated)?;
        *cases = updated;

        tracing::info!(store = "local", written = records.len(), "Upserted cases");
        Ok(records.len())
    }

    fn query(&self, text: &str, k: usize) -> Result<Vec<CaseRecord>> {
        Ok(self
            .query_scored(text, k)?
            .into_iter()
            .map(|(record, _)| record)
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use crate::models::CaseType;
    use tempfile::TempDir;

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(HashEmbedder::new(256))
    }

    fn record(content: &str) -> CaseRecord {
        CaseRecord::new(content, CaseType::InitialData)
    }

    #[test]
    fn test_empty_store_query_is_empty() {
        let store = LocalStore::in_memory(embedder());
        let results = store.query("anything", 3).unwrap_or_default();
        assert!(results.is_empty());
    }

    #[test]
    fn test_upsert_empty_slice() {
        let store = LocalStore::in_memory(embedder());
        assert_eq!(store.upsert(&[]).ok(), Some(0));
        assert_eq!(store.count().ok(), Some(0));
    }

    #[test]
    fn test_query_own_text_is_top_hit() {
        let store = LocalStore::in_memory(embedder());
        let target = "zsh: command not found: yyy. Check the spelling of the command.";
        let written = store
            .upsert(&[
                record("ModuleNotFoundError: install the missing package with pip."),
                record(target),
                record("Docker daemon is not running: start the Docker service."),
            ])
            .unwrap_or_default();
        assert_eq!(written, 3);

        let results = store.query(target, 1).unwrap_or_default();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, target);
    }

    #[test]
    fn test_query_respects_k() {
        let store = LocalStore::in_memory(embedder());
        let records: Vec<CaseRecord> = (0..5).map(|i| record(&format!("case {i}"))).collect();
        store.upsert(&records).unwrap_or_default();

        assert_eq!(store.query("case", 3).unwrap_or_default().len(), 3);
        assert!(store.query("case", 0).unwrap_or_default().is_empty());
    }

    #[test]
    fn test_duplicate_upserts_are_kept() {
        let store = LocalStore::in_memory(embedder());
        store.upsert(&[record("same")]).unwrap_or_default();
        store.upsert(&[record("same")]).unwrap_or_default();
        assert_eq!(store.count().ok(), Some(2));
    }

    #[test]
    fn test_min_score_filters_unrelated() {
        let store = LocalStore::in_memory(embedder()).with_min_score(0.9);
        store
            .upsert(&[record("permission denied opening socket")])
            .unwrap_or_default();
        assert!(store.query("command not found", 3).unwrap_or_default().is_empty());
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("index.json");

        {
            let store = LocalStore::open(&path, embedder()).unwrap();
            store
                .upsert(&[CaseRecord::success_case("resolved case")])
                .unwrap();
        }
        assert!(path.exists());

        let reopened = LocalStore::open(&path, embedder()).unwrap();
        assert_eq!(reopened.count().ok(), Some(1));
        let results = reopened.query("resolved case", 3).unwrap();
        assert_eq!(results[0].case_type(), CaseType::SuccessCase);
    }

    #[test]
    fn test_dimension_mismatch_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");

        LocalStore::open(&path, embedder())
            .unwrap()
            .upsert(&[record("x")])
            .unwrap();

        let result = LocalStore::open(&path, Arc::new(HashEmbedder::new(8)));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_failed_save_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        let store = LocalStore::open(blocker.join("index.json"), embedder()).unwrap();
        let result = store.upsert(&[record("permission denied")]);

        assert!(matches!(result, Err(Error::OperationFailed { .. })));
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.query("permission denied", 3).unwrap().is_empty());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        let store = LocalStore::open(&path, embedder()).unwrap();
        store.upsert(&[record("disk full")]).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
