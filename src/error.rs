//! Caller-visible error outcomes.
//!
//! Every failure from the parser, store and renderer is mapped here to one
//! HTTP response. Validation and parse failures are 4xx with full detail;
//! store and rendering failures are 5xx and logged.

use std::collections::BTreeMap;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::ingest::IngestError;
use crate::parser::ParseError;
use crate::pdf::ReportError;
use crate::store::StoreError;
use crate::BatchId;

// ---

/// Field-level input errors, keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {errors:?}")]
pub struct ValidationError {
    pub errors: BTreeMap<&'static str, String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    // ---
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("authorization required")]
    Unauthorized,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("batch {0} not found")]
    NotFound(BatchId),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("persistence failure: {0}")]
    Persistence(#[source] StoreError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        // ---
        match e {
            StoreError::NotFound(id) => ApiError::NotFound(id),
            other => ApiError::Persistence(other),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        // ---
        match e {
            IngestError::Parse(e) => ApiError::Parse(e),
            IngestError::Persist(e) => ApiError::Persistence(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        match self {
            ApiError::Validation(e) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": e.errors }))).into_response()
            }
            ApiError::Parse(e) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "parse_error",
                    "kind": e.kind,
                    "row_index": e.row_index,
                    "field": e.field,
                    "reason": e.reason,
                    "message": e.message,
                })),
            )
                .into_response(),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"equipflow\"")],
                Json(json!({ "error": "Authorization required" })),
            )
                .into_response(),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid username or password" })),
            )
                .into_response(),
            ApiError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("Batch {id} not found") })),
            )
                .into_response(),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Persistence(e) => {
                error!("Persistence failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Storage unavailable, upload not saved" })),
                )
                    .into_response()
            }
            ApiError::Report(e) => {
                error!("Report failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to generate report" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_status_mapping() {
        // ---
        let parse_err = parse(b"name\nPumpA", "x.csv").unwrap_err();
        let cases = [
            (ApiError::from(parse_err), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApiError::from(StoreError::NotFound(4)), StatusCode::NOT_FOUND),
            (
                ApiError::from(StoreError::Database(sqlx::Error::PoolTimedOut)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(IngestError::Persist(StoreError::NotFound(4))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_unauthorized_challenges_basic() {
        // ---
        let response = ApiError::Unauthorized.into_response();
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }
}
