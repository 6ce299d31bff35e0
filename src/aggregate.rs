//! Summary statistics over a batch's records.
//!
//! Computed on every request; batches are immutable so there is nothing to
//! invalidate. Values carry full `f64` precision, rounding for display
//! happens in [`crate::report`].

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::store::{BatchStore, StoreError};
use crate::{BatchId, EquipmentRecord, UploadBatch};

// ---

/// Record count per equipment type, in first-seen order.
///
/// Labels are compared exactly, so `Pump` and `pump` are distinct types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDistribution(Vec<(String, u64)>);

impl TypeDistribution {
    // ---
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(label, count)| (label.as_str(), *count))
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.iter().find(|(l, _)| *l == label).map(|(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts; equals the batch's record count.
    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, c)| c).sum()
    }
}

/// Serialized as a JSON object whose key order is first-seen order.
impl Serialize for TypeDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // ---
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, count) in &self.0 {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

/// Derived statistics for one batch. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationResult {
    // ---
    pub total_count: u64,
    pub average_flowrate: f64,
    pub average_pressure: f64,
    pub average_temperature: f64,
    pub type_distribution: TypeDistribution,
}

/// Compute statistics over records. An empty slice yields zeros and an
/// empty distribution.
pub fn summarize(records: &[EquipmentRecord]) -> AggregationResult {
    // ---
    if records.is_empty() {
        return AggregationResult::default();
    }

    let mut counts: Vec<(String, u64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match index.get(record.equipment_type.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(&record.equipment_type, counts.len());
                counts.push((record.equipment_type.clone(), 1));
            }
        }
    }

    AggregationResult {
        total_count: records.len() as u64,
        average_flowrate: mean(records, |r| r.flowrate),
        average_pressure: mean(records, |r| r.pressure),
        average_temperature: mean(records, |r| r.temperature),
        type_distribution: TypeDistribution(counts),
    }
}

/// Arithmetic mean of one numeric column over a non-empty slice.
///
/// Values near `f64::MAX` can overflow the running sum even though their
/// mean is representable; in that case each value is scaled by `1/n` first
/// so every partial sum stays within range.
fn mean(records: &[EquipmentRecord], value: fn(&EquipmentRecord) -> f64) -> f64 {
    // ---
    let n = records.len() as f64;
    let sum: f64 = records.iter().map(value).sum();
    if sum.is_finite() {
        return sum / n;
    }
    records.iter().map(|r| value(r) / n).sum()
}

/// Statistics for a stored batch.
pub fn aggregate_batch(batch: &UploadBatch) -> AggregationResult {
    summarize(&batch.records)
}

/// Load a batch and compute its statistics. Read-only.
pub async fn aggregate(
    store: &dyn BatchStore,
    id: BatchId,
) -> Result<AggregationResult, StoreError> {
    // ---
    let batch = store.get(id).await?;
    Ok(aggregate_batch(&batch))
}
