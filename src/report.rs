//! Presentation of aggregation results.
//!
//! [`Statistics`] is the rounded view served to dashboards; [`ReportContent`]
//! is the fixed-shape model handed to the report renderer (see
//! [`crate::pdf`]). Rounding happens here and only here.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{AggregationResult, TypeDistribution};
use crate::{BatchId, UploadBatch};

// ---

/// Decimal places for averages.
const AVERAGE_PLACES: i32 = 2;

/// Decimal places for type-distribution percentages.
const PERCENT_PLACES: i32 = 1;

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    // ---
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    if !scaled.is_finite() {
        // Already far beyond the precision being rounded to.
        return value;
    }
    scaled.round() / factor
}

/// Dashboard statistics: averages rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    // ---
    pub total_count: u64,
    pub average_flowrate: f64,
    pub average_pressure: f64,
    pub average_temperature: f64,
    pub type_distribution: TypeDistribution,
}

impl From<&AggregationResult> for Statistics {
    fn from(result: &AggregationResult) -> Self {
        // ---
        Statistics {
            total_count: result.total_count,
            average_flowrate: round_to(result.average_flowrate, AVERAGE_PLACES),
            average_pressure: round_to(result.average_pressure, AVERAGE_PLACES),
            average_temperature: round_to(result.average_temperature, AVERAGE_PLACES),
            type_distribution: result.type_distribution.clone(),
        }
    }
}

/// One row of the report's type breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeShare {
    // ---
    pub label: String,
    pub count: u64,
    /// `count / total * 100`, one decimal.
    pub percentage: f64,
}

/// Everything the rendered report shows, in display form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportContent {
    // ---
    pub batch_id: BatchId,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub total_count: u64,
    pub average_flowrate: f64,
    pub average_pressure: f64,
    pub average_temperature: f64,
    pub type_distribution: Vec<TypeShare>,
}

/// Map a batch and its aggregation into report content.
///
/// A zero total yields an empty breakdown rather than dividing by zero.
pub fn assemble(batch: &UploadBatch, aggregation: &AggregationResult) -> ReportContent {
    // ---
    let total = aggregation.total_count;
    let type_distribution = if total == 0 {
        Vec::new()
    } else {
        aggregation
            .type_distribution
            .iter()
            .map(|(label, count)| TypeShare {
                label: label.to_string(),
                count,
                percentage: round_to(count as f64 / total as f64 * 100.0, PERCENT_PLACES),
            })
            .collect()
    };

    let stats = Statistics::from(aggregation);
    ReportContent {
        batch_id: batch.id,
        filename: batch.filename.clone(),
        uploaded_at: batch.created_at,
        total_count: stats.total_count,
        average_flowrate: stats.average_flowrate,
        average_pressure: stats.average_pressure,
        average_temperature: stats.average_temperature,
        type_distribution,
    }
}
