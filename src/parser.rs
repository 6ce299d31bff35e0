//! Tabular parser for uploaded equipment files.
//!
//! Turns raw upload bytes into an ordered list of validated
//! [`EquipmentRecord`]s. Parsing is all-or-nothing: the first invalid row
//! fails the whole file and nothing is returned for the rows before it.
//! No I/O happens here; the caller owns the bytes.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::record::{validate_row, Column, FieldError, FieldErrorReason, RawRow};
use crate::EquipmentRecord;

// ---

/// Delimiters tried when sniffing the header line.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Successful parse of one uploaded file.
#[derive(Debug, Clone)]
pub struct ParsedBatch {
    // ---
    pub filename: String,
    pub records: Vec<EquipmentRecord>,
}

/// Category of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    InvalidEncoding,
    Malformed,
    MissingColumn,
    RowValidation,
    EmptyFile,
}

/// A whole-file parse failure with enough detail to fix the source file.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    // ---
    pub kind: ParseErrorKind,
    /// 1-based data row (header excluded) for `RowValidation`.
    pub row_index: Option<usize>,
    pub field: Option<Column>,
    pub reason: Option<FieldErrorReason>,
    pub message: String,
}

impl ParseError {
    // ---
    fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            row_index: None,
            field: None,
            reason: None,
            message: message.into(),
        }
    }

    pub fn empty_file() -> Self {
        Self::new(ParseErrorKind::EmptyFile, "file contains no equipment rows")
    }

    fn missing_columns(missing: &[Column]) -> Self {
        // ---
        let names: Vec<&str> = missing.iter().map(|c| c.as_str()).collect();
        Self {
            field: missing.first().copied(),
            reason: Some(FieldErrorReason::Missing),
            ..Self::new(
                ParseErrorKind::MissingColumn,
                format!("missing required column(s): {}", names.join(", ")),
            )
        }
    }

    fn row_validation(row_index: usize, err: FieldError) -> Self {
        // ---
        Self {
            row_index: Some(row_index),
            field: Some(err.field),
            reason: Some(err.reason),
            ..Self::new(ParseErrorKind::RowValidation, format!("row {row_index}: {err}"))
        }
    }
}

/// Parse an uploaded delimited text file.
///
/// A header-only file is a valid parse with zero records; rejecting it is
/// the ingestion layer's decision. Input with no header row at all is
/// reported as [`ParseErrorKind::EmptyFile`].
pub fn parse(bytes: &[u8], filename: &str) -> Result<ParsedBatch, ParseError> {
    // ---
    let text = std::str::from_utf8(bytes).map_err(|e| {
        ParseError::new(
            ParseErrorKind::InvalidEncoding,
            format!("file is not valid UTF-8: {e}"),
        )
    })?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    if text.trim().is_empty() {
        return Err(ParseError::empty_file());
    }

    let delimiter = detect_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ParseError::new(ParseErrorKind::Malformed, e.to_string()))?
        .clone();
    let positions = resolve_columns(&headers)?;

    let mut records = Vec::new();
    let mut row_index = 0;

    for result in reader.records() {
        let row = result.map_err(|e| ParseError::new(ParseErrorKind::Malformed, e.to_string()))?;
        // Whitespace-only line; a row of empty cells still gets validated.
        if row.len() == 1 && row[0].is_empty() {
            continue;
        }
        row_index += 1;

        let raw: RawRow<'_> = positions
            .iter()
            .filter_map(|(&column, &i)| row.get(i).map(|cell| (column, cell)))
            .collect();

        let record =
            validate_row(&raw).map_err(|e| ParseError::row_validation(row_index, e))?;
        records.push(record);
    }

    tracing::debug!(
        "Parsed {} rows from '{}' (delimiter {:?})",
        records.len(),
        filename,
        delimiter as char
    );

    Ok(ParsedBatch {
        filename: filename.to_string(),
        records,
    })
}

/// Map each required column to its header position. First matching header wins.
fn resolve_columns(headers: &csv::StringRecord) -> Result<BTreeMap<Column, usize>, ParseError> {
    // ---
    let mut positions = BTreeMap::new();
    for (i, header) in headers.iter().enumerate() {
        if let Some(column) = Column::from_header(header) {
            positions.entry(column).or_insert(i);
        }
    }

    let missing: Vec<Column> = Column::ALL
        .into_iter()
        .filter(|c| !positions.contains_key(c))
        .collect();
    if !missing.is_empty() {
        return Err(ParseError::missing_columns(&missing));
    }

    Ok(positions)
}

/// Pick the delimiter occurring most often in the header line; ties go to ','.
fn detect_delimiter(text: &str) -> u8 {
    // ---
    let header = text.lines().next().unwrap_or("");
    let mut best = b',';
    let mut best_count = 0;

    for sep in DELIMITERS {
        let count = header.bytes().filter(|&b| b == sep).count();
        if count > best_count {
            best = sep;
            best_count = count;
        }
    }

    best
}
