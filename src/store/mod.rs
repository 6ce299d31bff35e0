//! Batch persistence.
//!
//! A batch and all of its records are written as one unit and never
//! modified afterwards. Readers either see the whole batch or nothing.

use async_trait::async_trait;
use thiserror::Error;

use crate::{BatchId, BatchSummary, EquipmentRecord, UploadBatch};

mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgBatchStore;

// ---

/// Errors surfaced by a [`BatchStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    // ---
    #[error("batch {0} not found")]
    NotFound(BatchId),

    #[error("a batch must contain at least one record")]
    EmptyBatch,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Write-once storage of upload batches.
///
/// Implementations must make `create` atomic: concurrent creates never
/// interleave records, and a failed create leaves nothing visible.
#[async_trait]
pub trait BatchStore: Send + Sync {
    // ---
    /// Persist a batch with its records in file order and return its new id.
    async fn create(&self, filename: &str, records: &[EquipmentRecord])
        -> Result<BatchId, StoreError>;

    async fn get(&self, id: BatchId) -> Result<UploadBatch, StoreError>;

    /// Most recent batches first; ties on creation time go to the higher id.
    async fn list_recent(&self, limit: u32) -> Result<Vec<BatchSummary>, StoreError>;

    /// Remove a batch and, by ownership, every record in it.
    async fn delete(&self, id: BatchId) -> Result<(), StoreError>;
}
