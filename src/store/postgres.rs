//! PostgreSQL-backed [`BatchStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::{BatchStore, StoreError};
use crate::{BatchId, BatchSummary, EquipmentRecord, UploadBatch};

// ---

#[derive(Debug, Clone)]
pub struct PgBatchStore {
    // ---
    pool: PgPool,
}

impl PgBatchStore {
    // ---
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// One record joined with its batch header.
#[derive(sqlx::FromRow)]
struct BatchRow {
    // ---
    filename: String,
    created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    record: EquipmentRecord,
}

#[async_trait]
impl BatchStore for PgBatchStore {
    // ---
    async fn create(
        &self,
        filename: &str,
        records: &[EquipmentRecord],
    ) -> Result<BatchId, StoreError> {
        // ---
        if records.is_empty() {
            return Err(StoreError::EmptyBatch);
        }

        let mut tx = self.pool.begin().await?;

        let (id,): (BatchId,) =
            sqlx::query_as("INSERT INTO upload_batch (filename) VALUES ($1) RETURNING id")
                .bind(filename)
                .fetch_one(&mut *tx)
                .await?;

        let names: Vec<String> = records.iter().map(|r| r.name.clone()).collect();
        let types: Vec<String> = records.iter().map(|r| r.equipment_type.clone()).collect();
        let flowrates: Vec<f64> = records.iter().map(|r| r.flowrate).collect();
        let pressures: Vec<f64> = records.iter().map(|r| r.pressure).collect();
        let temperatures: Vec<f64> = records.iter().map(|r| r.temperature).collect();

        // One statement for the whole record set; ORDINALITY preserves file order.
        sqlx::query(
            r#"
            INSERT INTO equipment (
                batch_id, position, name, equipment_type,
                flowrate, pressure, temperature
            )
            SELECT $1, (t.ord - 1)::INTEGER, t.name, t.equipment_type,
                   t.flowrate, t.pressure, t.temperature
            FROM UNNEST($2::TEXT[], $3::TEXT[], $4::FLOAT8[], $5::FLOAT8[], $6::FLOAT8[])
                WITH ORDINALITY AS t(name, equipment_type, flowrate, pressure, temperature, ord)
            "#,
        )
        .bind(id)
        .bind(names)
        .bind(types)
        .bind(flowrates)
        .bind(pressures)
        .bind(temperatures)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!("Stored batch {} with {} records", id, records.len());
        Ok(id)
    }

    async fn get(&self, id: BatchId) -> Result<UploadBatch, StoreError> {
        // ---
        // Single statement, so the header and its records share one snapshot
        // even when a delete commits concurrently.
        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT b.filename, b.created_at,
                   e.name, e.equipment_type, e.flowrate, e.pressure, e.temperature
            FROM upload_batch b
            JOIN equipment e ON e.batch_id = b.id
            WHERE b.id = $1
            ORDER BY e.position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        // Stored batches are never empty, so no rows means no batch.
        let (filename, created_at) = match rows.first() {
            Some(row) => (row.filename.clone(), row.created_at),
            None => return Err(StoreError::NotFound(id)),
        };

        Ok(UploadBatch {
            id,
            filename,
            created_at,
            records: rows.into_iter().map(|row| row.record).collect(),
        })
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<BatchSummary>, StoreError> {
        // ---
        let rows = sqlx::query_as::<_, BatchSummary>(
            r#"
            SELECT b.id, b.filename, b.created_at, COUNT(e.id) AS record_count
            FROM upload_batch b
            LEFT JOIN equipment e ON e.batch_id = b.id
            GROUP BY b.id
            ORDER BY b.created_at DESC, b.id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn delete(&self, id: BatchId) -> Result<(), StoreError> {
        // ---
        let result = sqlx::query("DELETE FROM upload_batch WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        debug!("Deleted batch {}", id);
        Ok(())
    }
}
