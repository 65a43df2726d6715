//! Solver output table (`output.txt`).
//!
//! The file is tab-delimited text:
//! - row 0: column headers such as `Time (h)` or `Temperature (K)`
//! - remaining rows: numeric values as text, one row per output time
//!
//! Every line ends with a trailing tab, so the last cell of each line is empty.
//! Headers are matched exactly (units are part of the name).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, warn};

use crate::error::AppError;

/// Conventional name of the solver output file.
pub const OUTPUT_FILE: &str = "output.txt";

#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl OutputTable {
    /// Parse tab-delimited text; the first non-blank line is the header row.
    pub fn parse(text: &str) -> Result<Self, AppError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(text.as_bytes());

        let mut records = Vec::new();
        for (i, rec) in reader.records().enumerate() {
            let rec = rec.map_err(|e| AppError::input(format!("Failed to read table line {}: {e}", i + 1)))?;
            if rec.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            records.push(rec);
        }

        let mut it = records.into_iter();
        let header_rec = it
            .next()
            .ok_or_else(|| AppError::data("Output table is empty (no header row)."))?;

        let mut headers: Vec<String> = header_rec.iter().map(str::to_string).collect();
        while headers.last().is_some_and(|h| h.is_empty()) {
            headers.pop();
        }
        if headers.is_empty() {
            return Err(AppError::data("Output table header row has no column names."));
        }

        let rows = it
            .map(|rec| {
                let mut row: Vec<String> = rec.iter().map(str::to_string).collect();
                row.truncate(headers.len());
                row
            })
            .collect();

        Ok(Self { headers, rows })
    }

    /// Read and parse a table file.
    pub fn read(path: &Path) -> Result<Self, AppError> {
        let mut file = File::open(path)
            .map_err(|e| AppError::input(format!("Failed to open output table '{}': {e}", path.display())))?;
        let mut text = String::new();
        file.read_to_string(&mut text)
            .map_err(|e| AppError::input(format!("Failed to read output table '{}': {e}", path.display())))?;

        let table = Self::parse(&text)?;
        debug!(
            "read '{}': {} columns, {} rows",
            path.display(),
            table.headers.len(),
            table.rows.len()
        );
        Ok(table)
    }

    /// Like [`OutputTable::read`], but a missing file is reported and skipped.
    pub fn read_optional(path: &Path) -> Result<Option<Self>, AppError> {
        if !path.exists() {
            warn!("File '{}' not found; skipping.", path.display());
            return Ok(None);
        }
        Self::read(path).map(Some)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Zero-based position of the column whose header equals `name`.
    pub fn column_index(&self, name: &str) -> Result<usize, AppError> {
        self.headers.iter().position(|h| h == name).ok_or_else(|| {
            AppError::input(format!(
                "Column '{name}' not found. Available columns: {}",
                self.headers.join(", ")
            ))
        })
    }

    /// Numeric value at data row `row` (zero-based) and column `col`.
    pub fn value(&self, row: usize, col: usize) -> Result<f64, AppError> {
        let header = self
            .headers
            .get(col)
            .ok_or_else(|| AppError::input(format!("Column index {col} is out of range.")))?;
        let cell = self
            .rows
            .get(row)
            .and_then(|r| r.get(col))
            .ok_or_else(|| AppError::data(format!("Row {} has no value for column '{header}'.", row + 1)))?;
        cell.trim().parse::<f64>().map_err(|e| {
            AppError::data(format!(
                "Invalid number '{cell}' in column '{header}' at row {}: {e}",
                row + 1
            ))
        })
    }

    /// The named column parsed as numbers.
    pub fn column(&self, name: &str) -> Result<Vec<f64>, AppError> {
        let col = self.column_index(name)?;
        (0..self.rows.len()).map(|row| self.value(row, col)).collect()
    }
}
