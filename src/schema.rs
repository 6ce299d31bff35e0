//! Database schema management for `equipflow`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `upload_batch` table (one row per upload event) and the
/// `equipment` table holding each batch's records. Records are owned by their
/// batch: deleting a batch cascades to its records.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS upload_batch (
            id          BIGSERIAL PRIMARY KEY,
            filename    TEXT        NOT NULL,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // `position` is the 0-based row order within the uploaded file
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS equipment (
            id              BIGSERIAL PRIMARY KEY,
            batch_id        BIGINT           NOT NULL
                            REFERENCES upload_batch (id) ON DELETE CASCADE,
            position        INTEGER          NOT NULL,
            name            TEXT             NOT NULL,
            equipment_type  TEXT             NOT NULL,
            flowrate        DOUBLE PRECISION NOT NULL,
            pressure        DOUBLE PRECISION NOT NULL,
            temperature     DOUBLE PRECISION NOT NULL,
            UNIQUE (batch_id, position)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // History listing: newest first, ties on id
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_upload_batch_recent
            ON upload_batch (created_at DESC, id DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
