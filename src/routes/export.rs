//! `GET /api/export-pdf/{id}`: the batch report as a downloadable PDF.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::info;

use super::AppState;
use crate::aggregate::aggregate_batch;
use crate::auth::Authorized;
use crate::pdf::{render_pdf, ReportError};
use crate::report::assemble;
use crate::{ApiError, BatchId};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/export-pdf/{id}", get(handler))
}

async fn handler(
    State(state): State<AppState>,
    _caller: Authorized,
    Path(id): Path<BatchId>,
) -> Result<impl IntoResponse, ApiError> {
    // ---
    let batch = state.store.get(id).await?;
    let content = assemble(&batch, &aggregate_batch(&batch));

    // printpdf is synchronous and CPU bound
    let bytes = tokio::task::spawn_blocking(move || render_pdf(&content))
        .await
        .map_err(|e| ReportError::Render(e.to_string()))??;

    info!("GET /api/export-pdf/{} - {} bytes", id, bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"batch_{id}_report.pdf\""),
            ),
        ],
        bytes,
    ))
}
