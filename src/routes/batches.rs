//! Per-batch reads and deletion under `/api/batch/{id}`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::AppState;
use crate::aggregate::aggregate_batch;
use crate::auth::Authorized;
use crate::report::{assemble, ReportContent, Statistics};
use crate::{ApiError, BatchId};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/batch/{id}", get(statistics).delete(remove))
        .route("/api/batch/{id}/report", get(report))
}

#[derive(Debug, Serialize)]
struct BatchStatisticsResponse {
    batch_id: BatchId,
    filename: String,
    uploaded_at: DateTime<Utc>,
    statistics: Statistics,
}

async fn statistics(
    State(state): State<AppState>,
    _caller: Authorized,
    Path(id): Path<BatchId>,
) -> Result<Json<BatchStatisticsResponse>, ApiError> {
    // ---
    let batch = state.store.get(id).await?;
    let result = aggregate_batch(&batch);

    Ok(Json(BatchStatisticsResponse {
        batch_id: batch.id,
        statistics: Statistics::from(&result),
        filename: batch.filename,
        uploaded_at: batch.created_at,
    }))
}

async fn report(
    State(state): State<AppState>,
    _caller: Authorized,
    Path(id): Path<BatchId>,
) -> Result<Json<ReportContent>, ApiError> {
    // ---
    let batch = state.store.get(id).await?;
    Ok(Json(assemble(&batch, &aggregate_batch(&batch))))
}

async fn remove(
    State(state): State<AppState>,
    caller: Authorized,
    Path(id): Path<BatchId>,
) -> Result<StatusCode, ApiError> {
    // ---
    state.store.delete(id).await?;
    info!("Batch {} deleted by '{}'", id, caller.username());
    Ok(StatusCode::NO_CONTENT)
}
