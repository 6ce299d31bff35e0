//! `POST /api/upload` (submit a file) and `GET /api/upload` (recent history).

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppState;
use crate::auth::Authorized;
use crate::ingest::submit;
use crate::report::Statistics;
use crate::{ApiError, BatchId, BatchSummary};

// ---

/// Upper bound for `?limit=` on the history listing.
const MAX_HISTORY_LIMIT: u32 = 100;

/// Name stored when the multipart part carries no filename.
const DEFAULT_FILENAME: &str = "upload.csv";

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/upload", get(history).post(upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    batch_id: BatchId,
    filename: String,
    statistics: Statistics,
}

async fn upload(
    State(state): State<AppState>,
    caller: Authorized,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    // ---
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Read error: {e}")))?;
        file = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;

    info!("POST /api/upload - '{}' ({} bytes)", filename, bytes.len());

    let ingested = submit(state.store.as_ref(), &caller, &bytes, &filename).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            batch_id: ingested.batch_id,
            statistics: Statistics::from(&ingested.statistics),
            filename: ingested.filename,
        }),
    ))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<u32>,
}

async fn history(
    State(state): State<AppState>,
    _caller: Authorized,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<BatchSummary>>, ApiError> {
    // ---
    let limit = params
        .limit
        .unwrap_or(state.config.history_limit)
        .clamp(1, MAX_HISTORY_LIMIT);

    let recent = state.store.list_recent(limit).await?;
    Ok(Json(recent))
}
