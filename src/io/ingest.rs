//! Curve-fit data ingest.
//!
//! Input is a plain two-column `x,y` text file (no header), as produced by
//! spreadsheet exports of measured correlations.
//!
//! - blank lines are skipped
//! - surrounding whitespace is trimmed
//! - a non-numeric first row is treated as a header and skipped
//! - any other malformed row is an error naming the line

use std::fs::File;
use std::path::Path;

use log::{debug, warn};

use crate::error::AppError;
use crate::math::finite_range;

/// `(x, y)` observations for a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct XyData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl XyData {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x_range(&self) -> Option<(f64, f64)> {
        finite_range(&self.x)
    }
}

/// Load two-column data from `path`.
pub fn load_xy(path: &Path) -> Result<XyData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open data file '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut x = Vec::new();
    let mut y = Vec::new();

    for (i, rec) in reader.records().enumerate() {
        let rec = rec.map_err(|e| AppError::input(format!("Failed to read record {}: {e}", i + 1)))?;
        let line = rec.position().map(|p| p.line() as usize).unwrap_or(i + 1);
        if rec.iter().all(str::is_empty) {
            continue;
        }
        if rec.len() < 2 {
            return Err(AppError::data(format!(
                "Line {line} has {} column(s); expected x,y.",
                rec.len()
            )));
        }

        match (rec[0].parse::<f64>(), rec[1].parse::<f64>()) {
            (Ok(xi), Ok(yi)) => {
                x.push(xi);
                y.push(yi);
            }
            _ if x.is_empty() && line == 1 => {
                debug!("treating line 1 as a header: {:?}", rec.iter().collect::<Vec<_>>());
            }
            _ => {
                return Err(AppError::data(format!(
                    "Line {line}: could not parse '{}' / '{}' as numbers.",
                    &rec[0], &rec[1]
                )));
            }
        }
    }

    if x.is_empty() {
        return Err(AppError::data(format!("No data rows in '{}'.", path.display())));
    }

    debug!("loaded {} points from '{}'", x.len(), path.display());
    Ok(XyData { x, y })
}

/// Like [`load_xy`], but a missing file is reported and skipped.
pub fn load_xy_optional(path: &Path) -> Result<Option<XyData>, AppError> {
    if !path.exists() {
        warn!("File '{}' not found; skipping.", path.display());
        return Ok(None);
    }
    load_xy(path).map(Some)
}
