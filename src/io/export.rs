//! Export results to CSV and JSON.
//!
//! CSV exports are long-format tables meant for spreadsheets or downstream
//! scripts; JSON exports carry the full report structs.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::domain::{FitReport, MapConfig};
use crate::error::AppError;
use crate::io::ingest::XyData;
use crate::mapping::SweepOutcome;
use crate::mms::ConvergenceStudy;
use crate::ode::CoalescenceRun;

fn csv_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    Ok(csv::Writer::from_writer(file))
}

fn csv_err(e: csv::Error) -> AppError {
    AppError::input(format!("Failed to write export CSV: {e}"))
}

fn finish(mut w: csv::Writer<File>) -> Result<(), AppError> {
    w.flush()
        .map_err(|e| AppError::input(format!("Failed to flush export CSV: {e}")))
}

/// Every grid point of every level: numerical value, reference and relative error.
pub fn write_study_csv(path: &Path, studies: &[ConvergenceStudy]) -> Result<(), AppError> {
    let mut w = csv_writer(path)?;
    w.write_record(["case", "steps", "step_size", "time", "numerical", "reference", "relative_error"])
        .map_err(csv_err)?;

    for study in studies {
        for level in &study.levels {
            let traj = &level.trajectory;
            for i in 0..traj.len() {
                w.write_record([
                    study.case.clone(),
                    level.steps.to_string(),
                    format!("{:.12e}", level.step_size),
                    format!("{:.12e}", traj.times[i]),
                    format!("{:.12e}", traj.values[i]),
                    format!("{:.12e}", level.reference[i]),
                    format!("{:.12e}", level.errors[i]),
                ])
                .map_err(csv_err)?;
            }
        }
    }
    finish(w)
}

/// Observations (when given) followed by the fitted grid.
pub fn write_fit_csv(path: &Path, report: &FitReport, data: Option<&XyData>) -> Result<(), AppError> {
    let mut w = csv_writer(path)?;
    w.write_record(["kind", "x", "y"]).map_err(csv_err)?;

    if let Some(data) = data {
        for (x, y) in data.x.iter().zip(&data.y) {
            w.write_record(["data".to_string(), format!("{x:.12e}"), format!("{y:.12e}")])
                .map_err(csv_err)?;
        }
    }
    for (x, y) in report.grid.x.iter().zip(&report.grid.y) {
        w.write_record(["fit".to_string(), format!("{x:.12e}"), format!("{y:.12e}")])
            .map_err(csv_err)?;
    }
    finish(w)
}

pub fn write_coalescence_csv(path: &Path, run: &CoalescenceRun) -> Result<(), AppError> {
    let mut w = csv_writer(path)?;
    w.write_record(["area_m2", "density_bub_m2", "coverage"]).map_err(csv_err)?;
    for s in &run.samples {
        w.write_record([
            format!("{:.12e}", s.area),
            format!("{:.12e}", s.density),
            format!("{:.12e}", s.coverage),
        ])
        .map_err(csv_err)?;
    }
    finish(w)
}

/// One row per located threshold, tagged with the variant.
pub fn write_sweep_csv(path: &Path, outcomes: &[SweepOutcome]) -> Result<(), AppError> {
    let mut w = csv_writer(path)?;
    w.write_record(["flag", "flag_value", "label", "setpoint_k", "row", "temperature_k", "burnup"])
        .map_err(csv_err)?;
    for o in outcomes {
        for p in &o.points {
            w.write_record([
                o.flag.clone(),
                o.flag_value.to_string(),
                o.label.clone(),
                p.setpoint.to_string(),
                p.row.to_string(),
                format!("{}", p.temperature),
                format!("{}", p.burnup),
            ])
            .map_err(csv_err)?;
        }
    }
    finish(w)
}

/// Pretty-printed JSON of any report.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, value).map_err(|e| AppError::input(format!("Failed to write JSON: {e}")))
}

/// Sweep results together with the mapping parameters that produced them.
#[derive(Debug, Serialize)]
pub struct MappingExport<'a> {
    pub generated: DateTime<Local>,
    pub solver: String,
    pub variable: &'a str,
    pub target: f64,
    pub tolerance: f64,
    pub fission_rate: f64,
    pub hydrostatic_stress: f64,
    pub outcomes: &'a [SweepOutcome],
}

pub fn write_mapping_json(path: &Path, cfg: &MapConfig, outcomes: &[SweepOutcome]) -> Result<(), AppError> {
    let export = MappingExport {
        generated: Local::now(),
        solver: cfg.solver.display().to_string(),
        variable: &cfg.variable,
        target: cfg.target,
        tolerance: cfg.tolerance,
        fission_rate: cfg.fission_rate,
        hydrostatic_stress: cfg.hydrostatic_stress,
        outcomes,
    };
    write_json(path, &export)
}
