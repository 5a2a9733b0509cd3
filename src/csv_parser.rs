//! CSV reader producing raw equipment rows.
//!
//! Turns uploaded CSV text into [`RawRow`]s keyed by the header labels, so
//! CSV and JSON uploads share one normalization path. Values are kept as
//! JSON strings; numeric coercion is the normalizer's job.
//!
//! # Features
//!
//! - RFC 4180 compliant (quoted fields, escaped quotes, delimiters and
//!   newlines inside quotes)
//! - CRLF, LF and bare CR line endings; leading BOM stripped
//! - Null markers (empty, `NA`, `N/A`, `null`, `None`, …) become JSON `null`
//! - Configurable delimiter and null markers
//!
//! # Example
//!
//! ```
//! use equip_insight::csv_parser::CsvReader;
//!
//! let csv = "Equipment Name,Type,Flowrate,Pressure,Temperature\nP-1,Pump,120,5.2,NA\n";
//! let rows = CsvReader::new().read_str(csv).unwrap();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0]["Flowrate"], "120");
//! assert!(rows[0]["Temperature"].is_null());
//! ```

use serde_json::Value;
use tracing::debug;

use crate::error::InsightError;
use crate::record::{RawRow, NULL_MARKERS};

/// CSV reader configuration and entry point.
#[derive(Debug, Clone)]
pub struct CsvReader {
    delimiter: u8,
    null_markers: Vec<String>,
}

impl CsvReader {
    /// Creates a reader with default settings (comma delimiter, standard null markers).
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            null_markers: NULL_MARKERS.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Sets the field delimiter (default: comma).
    pub fn delimiter(mut self, delim: u8) -> Self {
        self.delimiter = delim;
        self
    }

    /// Sets custom null markers (replaces defaults).
    pub fn null_markers(mut self, markers: Vec<String>) -> Self {
        self.null_markers = markers;
        self
    }

    /// Reads CSV text with a header row into raw rows.
    ///
    /// Empty input or a header without data rows yields an empty vector.
    /// A data row whose field count differs from the header fails with
    /// [`InsightError::CsvParse`] carrying the 1-based line number.
    pub fn read_str(&self, input: &str) -> Result<Vec<RawRow>, InsightError> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);

        let records = self.parse_raw(input);
        let Some(((_, header), data)) = records.split_first() else {
            return Ok(Vec::new());
        };
        let headers: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();
        let n_cols = headers.len();

        let rows = data
            .iter()
            .map(|(line, fields)| {
                if fields.len() != n_cols {
                    return Err(InsightError::CsvParse {
                        line: *line,
                        message: format!("expected {n_cols} fields, got {}", fields.len()),
                    });
                }
                Ok(headers
                    .iter()
                    .zip(fields)
                    .map(|(h, f)| (h.clone(), self.field_value(f)))
                    .collect::<RawRow>())
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(rows = rows.len(), columns = n_cols, "CSV parsed");
        Ok(rows)
    }

    // ── Internal parsing ─────────────────────────────────────────

    fn field_value(&self, field: &str) -> Value {
        let trimmed = field.trim();
        if self.null_markers.iter().any(|m| m == trimmed) {
            Value::Null
        } else {
            Value::String(trimmed.to_string())
        }
    }

    /// Splits CSV text into records of string fields, each tagged with the
    /// line on which it starts.
    fn parse_raw(&self, input: &str) -> Vec<(usize, Vec<String>)> {
        let delim = self.delimiter as char;
        let mut rows: Vec<(usize, Vec<String>)> = Vec::new();
        let mut current_row: Vec<String> = Vec::new();
        let mut current_field = String::new();
        let mut in_quotes = false;
        let mut chars = input.chars().peekable();
        let mut line: usize = 1;
        let mut row_start: usize = 1;

        while let Some(c) = chars.next() {
            if in_quotes {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        current_field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    if c == '\n' {
                        line += 1;
                    }
                    current_field.push(c);
                }
            } else if c == '"' && current_field.is_empty() {
                in_quotes = true;
            } else if c == delim {
                current_row.push(std::mem::take(&mut current_field));
            } else if c == '\n' || c == '\r' {
                // \r\n counts as one line break
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                current_row.push(std::mem::take(&mut current_field));
                finish_row(&mut current_row, &mut rows, row_start);
                line += 1;
                row_start = line;
            } else {
                current_field.push(c);
            }
        }

        if !current_field.is_empty() || !current_row.is_empty() {
            current_row.push(current_field);
            finish_row(&mut current_row, &mut rows, row_start);
        }

        rows
    }
}

/// Moves a completed record into `rows`; blank lines are skipped.
fn finish_row(row: &mut Vec<String>, rows: &mut Vec<(usize, Vec<String>)>, start: usize) {
    if row.iter().all(|f| f.is_empty()) {
        row.clear();
    } else {
        rows.push((start, std::mem::take(row)));
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
