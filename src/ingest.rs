//! Ingestion use case: parse an upload, persist it, and aggregate it.
//!
//! One call runs the whole request to a terminal state:
//!
//! ```text
//! Received -> Parsing -> Parsed -> Persisting -> Persisted -> Aggregating -> Done
//!                \-> ParseFailed           \-> PersistFailed
//! ```
//!
//! Nothing is retried. A failure is returned once, with its detail intact.

use std::fmt;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::aggregate::{aggregate, AggregationResult};
use crate::auth::Authorized;
use crate::parser::{parse, ParseError};
use crate::store::{BatchStore, StoreError};
use crate::BatchId;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Received,
    Parsing,
    Persisting,
    Aggregating,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        let name = match self {
            Stage::Received => "received",
            Stage::Parsing => "parsing",
            Stage::Persisting => "persisting",
            Stage::Aggregating => "aggregating",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    // ---
    /// The file was rejected; nothing was stored.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The store failed while writing or re-reading the new batch.
    #[error("failed to persist upload: {0}")]
    Persist(#[source] StoreError),
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct Ingested {
    // ---
    pub batch_id: BatchId,
    pub filename: String,
    pub statistics: AggregationResult,
}

/// Submit an uploaded file on behalf of an authorized caller.
///
/// Header-only files are rejected as [`ParseError::empty_file`]; a batch is
/// only ever stored with at least one record.
pub async fn submit(
    store: &dyn BatchStore,
    caller: &Authorized,
    bytes: &[u8],
    filename: &str,
) -> Result<Ingested, IngestError> {
    // ---
    let mut stage = Stage::Received;
    debug!("Upload '{}' from '{}' {} ({} bytes)", filename, caller.username(), stage, bytes.len());

    stage = Stage::Parsing;
    debug!("Upload '{}' {}", filename, stage);
    let parsed = parse(bytes, filename)
        .and_then(|p| {
            if p.records.is_empty() {
                Err(ParseError::empty_file())
            } else {
                Ok(p)
            }
        })
        .map_err(|e| {
            warn!(
                "Upload '{}' rejected: kind={:?} row={:?} field={:?} reason={:?}",
                filename, e.kind, e.row_index, e.field, e.reason
            );
            e
        })?;

    stage = Stage::Persisting;
    debug!("Upload '{}' {} {} records", filename, stage, parsed.records.len());
    let batch_id = store
        .create(&parsed.filename, &parsed.records)
        .await
        .map_err(|e| {
            error!("Failed to persist upload '{}': {}", filename, e);
            IngestError::Persist(e)
        })?;

    stage = Stage::Aggregating;
    debug!("Batch {} {}", batch_id, stage);
    let statistics = aggregate(store, batch_id).await.map_err(|e| {
        error!("Failed to read back batch {}: {}", batch_id, e);
        IngestError::Persist(e)
    })?;

    stage = Stage::Done;
    info!(
        "Batch {} {}: '{}' with {} records",
        batch_id, stage, parsed.filename, statistics.total_count
    );

    Ok(Ingested {
        batch_id,
        filename: parsed.filename,
        statistics,
    })
}
