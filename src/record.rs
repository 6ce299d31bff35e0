//! Equipment row schema: canonical columns and per-row validation.
//!
//! A raw row is a mapping from [`Column`] to the cell text found in the
//! uploaded file. [`validate_row`] turns it into a typed
//! [`EquipmentRecord`] or reports the first column that failed.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::EquipmentRecord;

// ---

/// Required columns of an equipment file, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Name,
    Type,
    Flowrate,
    Pressure,
    Temperature,
}

impl Column {
    // ---
    pub const ALL: [Column; 5] = [
        Column::Name,
        Column::Type,
        Column::Flowrate,
        Column::Pressure,
        Column::Temperature,
    ];

    /// Canonical field name used in error payloads.
    pub fn as_str(self) -> &'static str {
        // ---
        match self {
            Column::Name => "name",
            Column::Type => "type",
            Column::Flowrate => "flowrate",
            Column::Pressure => "pressure",
            Column::Temperature => "temperature",
        }
    }

    /// Header spellings accepted for this column (compared lowercase).
    pub fn aliases(self) -> &'static [&'static str] {
        // ---
        match self {
            Column::Name => &["name", "equipment_name"],
            Column::Type => &["type", "equipment_type"],
            Column::Flowrate => &["flowrate"],
            Column::Pressure => &["pressure"],
            Column::Temperature => &["temperature"],
        }
    }

    /// Resolve a header cell to a column, ignoring case and surrounding whitespace.
    pub fn from_header(header: &str) -> Option<Column> {
        // ---
        let header = header.trim().to_lowercase();
        Column::ALL
            .into_iter()
            .find(|c| c.aliases().contains(&header.as_str()))
    }

    fn is_numeric(self) -> bool {
        matches!(self, Column::Flowrate | Column::Pressure | Column::Temperature)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single cell was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorReason {
    Missing,
    Empty,
    NotNumeric,
}

impl FieldErrorReason {
    // ---
    pub fn as_str(self) -> &'static str {
        match self {
            FieldErrorReason::Missing => "missing",
            FieldErrorReason::Empty => "empty",
            FieldErrorReason::NotNumeric => "not_numeric",
        }
    }
}

impl fmt::Display for FieldErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failure for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("column '{field}' is {reason}")]
pub struct FieldError {
    pub field: Column,
    pub reason: FieldErrorReason,
}

/// One row of cell text keyed by column. Absent keys are missing cells.
pub type RawRow<'a> = BTreeMap<Column, &'a str>;

/// Validate one raw row into an [`EquipmentRecord`].
///
/// Columns are checked in [`Column::ALL`] order and the first failure is
/// returned. Numeric cells must parse as finite `f64`.
pub fn validate_row<'a>(row: &RawRow<'a>) -> Result<EquipmentRecord, FieldError> {
    // ---
    let text = |field: Column| -> Result<&'a str, FieldError> {
        let cell: &'a str = row.get(&field).copied().ok_or(FieldError {
            field,
            reason: FieldErrorReason::Missing,
        })?;
        let cell = cell.trim();
        if cell.is_empty() {
            return Err(FieldError {
                field,
                reason: FieldErrorReason::Empty,
            });
        }
        Ok(cell)
    };

    let name = text(Column::Name)?.to_string();
    let equipment_type = text(Column::Type)?.to_string();

    let number = |field: Column| -> Result<f64, FieldError> {
        debug_assert!(field.is_numeric());
        let cell = text(field)?;
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(FieldError {
                field,
                reason: FieldErrorReason::NotNumeric,
            }),
        }
    };

    let flowrate = number(Column::Flowrate)?;
    let pressure = number(Column::Pressure)?;
    let temperature = number(Column::Temperature)?;

    Ok(EquipmentRecord {
        name,
        equipment_type,
        flowrate,
        pressure,
        temperature,
    })
}
