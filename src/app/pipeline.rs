//! Shared "fit pipeline": resolve the data source, fit, compute residuals.
//!
//! data file or built-in dataset -> multistart LM fit -> residuals
//!
//! The CLI handler only decides what to print and export.

use log::info;

use crate::domain::{FitConfig, FitModelKind, FitReport};
use crate::error::AppError;
use crate::fit::{fit_curve, sink_strength_samples, LmOptions};
use crate::io::{load_xy_optional, XyData};
use crate::models::model_for;
use crate::report::{compute_residuals, FitResidual};

/// Points in the built-in sink-strength dataset.
pub const SINK_STRENGTH_POINTS: usize = 100;

/// All computed outputs of a single `fuelcheck fit` run.
#[derive(Debug, Clone)]
pub struct FitRun {
    /// Where the observations came from (file path or built-in dataset).
    pub source: String,
    /// Loaded file contents; `None` for the built-in dataset.
    pub data: Option<XyData>,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub report: FitReport,
    pub residuals: Vec<FitResidual>,
}

/// Execute the fit pipeline.
///
/// Returns `Ok(None)` when the input file does not exist (the diagnostic has
/// already been logged).
pub fn run_fit(config: &FitConfig) -> Result<Option<FitRun>, AppError> {
    let (source, data) = match &config.input {
        Some(path) => {
            let Some(data) = load_xy_optional(path)? else {
                return Ok(None);
            };
            (path.display().to_string(), Some(data))
        }
        None if config.model == FitModelKind::Cubic => ("built-in sink strength -2/ln(x)".to_string(), None),
        None => {
            return Err(AppError::input(format!(
                "The {} model needs measured data; pass --input.",
                config.model.display_name()
            )));
        }
    };

    let (xs, ys) = match &data {
        Some(d) => (d.x.clone(), d.y.clone()),
        None => sink_strength_samples(SINK_STRENGTH_POINTS),
    };

    let model = model_for(config.model, config.x_shift);
    let opts = LmOptions {
        max_iters: config.max_iters,
        tolerance: config.tolerance,
        ..LmOptions::default()
    };
    let report = fit_curve(model.as_ref(), &xs, &ys, &opts)?;
    let residuals = compute_residuals(model.as_ref(), &report.params, &xs, &ys)?;
    info!(
        "fitted {} to {} points from {source} (R^2 = {:.6})",
        config.model.display_name(),
        xs.len(),
        report.quality.r_squared
    );

    Ok(Some(FitRun {
        source,
        data,
        xs,
        ys,
        report,
        residuals,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(model: FitModelKind, input: Option<PathBuf>) -> FitConfig {
        FitConfig {
            model,
            input,
            x_shift: crate::models::DEFAULT_X_SHIFT,
            max_iters: 200,
            tolerance: 1e-12,
            plot: false,
            plot_width: 60,
            plot_height: 15,
            log_y: false,
            export_csv: None,
            export_json: None,
        }
    }

    #[test]
    fn cubic_defaults_to_builtin_dataset() {
        let run = run_fit(&config(FitModelKind::Cubic, None)).unwrap().unwrap();
        assert!(run.data.is_none());
        assert_eq!(run.xs.len(), SINK_STRENGTH_POINTS);
        assert_eq!(run.residuals.len(), SINK_STRENGTH_POINTS);
        assert!(run.report.quality.r_squared > 0.99);
    }

    #[test]
    fn shifted_exp_requires_input() {
        let err = run_fit(&config(FitModelKind::ShiftedExp, None)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_input_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(FitModelKind::Cubic, Some(dir.path().join("absent.csv")));
        assert!(run_fit(&cfg).unwrap().is_none());
    }

    #[test]
    fn file_input_is_fitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ar.csv");
        let x0 = crate::models::DEFAULT_X_SHIFT;
        let text: String = (0..12)
            .map(|i| {
                let x = 0.2 + 0.05 * i as f64;
                format!("{x},{}\n", 0.3 * ((2.0 * (x - x0)).exp() - 1.0))
            })
            .collect();
        std::fs::write(&path, text).unwrap();

        let run = run_fit(&config(FitModelKind::ShiftedExp, Some(path))).unwrap().unwrap();
        assert_eq!(run.data.as_ref().map(XyData::len), Some(12));
        approx::assert_relative_eq!(run.report.params[0], 0.3, max_relative = 1e-5);
        approx::assert_relative_eq!(run.report.params[1], 2.0, max_relative = 1e-5);
    }
}
