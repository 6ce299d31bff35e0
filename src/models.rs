//! Data models for uploaded equipment batches.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---

/// Identity of an upload batch. Assigned by the store, never reused.
pub type BatchId = i64;

/// One validated equipment row.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct EquipmentRecord {
    // ---
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

/// An upload event together with its full, ordered record set.
#[derive(Debug, Clone, Serialize)]
pub struct UploadBatch {
    // ---
    pub id: BatchId,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub records: Vec<EquipmentRecord>,
}

/// History row as returned by `list_recent`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct BatchSummary {
    // ---
    pub id: BatchId,
    pub filename: String,
    #[serde(rename = "uploaded_at")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "equipment_count")]
    pub record_count: i64,
}

impl UploadBatch {
    // ---
    pub fn summary(&self) -> BatchSummary {
        // ---
        BatchSummary {
            id: self.id,
            filename: self.filename.clone(),
            created_at: self.created_at,
            record_count: self.records.len() as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn create_test_record(name: &str, equipment_type: &str) -> EquipmentRecord {
        // ---
        EquipmentRecord {
            name: name.to_string(),
            equipment_type: equipment_type.to_string(),
            flowrate: 10.0,
            pressure: 200.0,
            temperature: 80.0,
        }
    }

    #[test]
    fn test_summary_counts_records() {
        // ---
        let batch = UploadBatch {
            id: 7,
            filename: "plant.csv".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap(),
            records: vec![
                create_test_record("PumpA", "Pump"),
                create_test_record("ValveA", "Valve"),
            ],
        };

        let summary = batch.summary();
        assert_eq!(summary.id, 7);
        assert_eq!(summary.filename, "plant.csv");
        assert_eq!(summary.created_at, batch.created_at);
        assert_eq!(summary.record_count, 2);
    }

    #[test]
    fn test_history_field_names() {
        // ---
        let summary = BatchSummary {
            id: 1,
            filename: "a.csv".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
            record_count: 3,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["filename"], "a.csv");
        assert_eq!(json["equipment_count"], 3);
        assert!(json.get("uploaded_at").is_some());
    }

    #[test]
    fn test_record_type_serialized_as_type() {
        // ---
        let json = serde_json::to_value(create_test_record("PumpA", "Pump")).unwrap();
        assert_eq!(json["type"], "Pump");
        assert!(json.get("equipment_type").is_none());
    }
}
