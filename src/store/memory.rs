//! In-process [`BatchStore`] used by the test suite.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{BatchStore, StoreError};
use crate::{BatchId, BatchSummary, EquipmentRecord, UploadBatch};

// ---

#[derive(Debug, Default)]
pub struct MemoryBatchStore {
    // ---
    batches: Mutex<Vec<UploadBatch>>,
    next_id: Mutex<BatchId>,
    unavailable: AtomicBool,
}

impl MemoryBatchStore {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the database were down.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        // ---
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl BatchStore for MemoryBatchStore {
    // ---
    async fn create(
        &self,
        filename: &str,
        records: &[EquipmentRecord],
    ) -> Result<BatchId, StoreError> {
        // ---
        self.check_available()?;
        if records.is_empty() {
            return Err(StoreError::EmptyBatch);
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let id = *next_id;

        self.batches.lock().unwrap().push(UploadBatch {
            id,
            filename: filename.to_string(),
            created_at: Utc::now(),
            records: records.to_vec(),
        });

        Ok(id)
    }

    async fn get(&self, id: BatchId) -> Result<UploadBatch, StoreError> {
        // ---
        self.check_available()?;
        self.batches
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<BatchSummary>, StoreError> {
        // ---
        self.check_available()?;
        let mut summaries: Vec<BatchSummary> =
            self.batches.lock().unwrap().iter().map(UploadBatch::summary).collect();

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        summaries.truncate(limit as usize);
        Ok(summaries)
    }

    async fn delete(&self, id: BatchId) -> Result<(), StoreError> {
        // ---
        self.check_available()?;
        let mut batches = self.batches.lock().unwrap();
        let before = batches.len();
        batches.retain(|b| b.id != id);

        if batches.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn create_test_records(n: usize) -> Vec<EquipmentRecord> {
        // ---
        (0..n)
            .map(|i| EquipmentRecord {
                name: format!("Unit{i}"),
                equipment_type: "Pump".to_string(),
                flowrate: i as f64,
                pressure: 100.0,
                temperature: 20.0,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_create_then_get_preserves_order() {
        // ---
        let store = MemoryBatchStore::new();
        let id = store.create("a.csv", &create_test_records(3)).await.unwrap();

        let batch = store.get(id).await.unwrap();
        assert_eq!(batch.filename, "a.csv");
        let names: Vec<&str> = batch.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Unit0", "Unit1", "Unit2"]);
    }

    #[tokio::test]
    async fn test_ids_never_reused_after_delete() {
        // ---
        let store = MemoryBatchStore::new();
        let first = store.create("a.csv", &create_test_records(1)).await.unwrap();
        store.delete(first).await.unwrap();
        let second = store.create("b.csv", &create_test_records(1)).await.unwrap();

        assert_ne!(first, second);
        assert!(matches!(store.get(first).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(first).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_recent_newest_first_with_limit() {
        // ---
        let store = MemoryBatchStore::new();
        for i in 0..7 {
            store
                .create(&format!("{i}.csv"), &create_test_records(i + 1))
                .await
                .unwrap();
        }

        let recent = store.list_recent(5).await.unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].filename, "6.csv");
        assert_eq!(recent[0].record_count, 7);
        for pair in recent.windows(2) {
            assert!(
                (pair[0].created_at, pair[0].id) > (pair[1].created_at, pair[1].id),
                "history must be strictly descending"
            );
        }
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        // ---
        let store = MemoryBatchStore::new();
        assert!(matches!(store.create("a.csv", &[]).await, Err(StoreError::EmptyBatch)));
        assert_eq!(store.batch_count(), 0);
    }
}
