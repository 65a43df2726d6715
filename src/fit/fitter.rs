//! Multistart fitting and fit diagnostics for a single correlation model.
//!
//! Given:
//! - observations `(x_i, y_i)`
//! - a model with a handful of deterministic starting points
//!
//! we run Levenberg-Marquardt from every start (in parallel), keep the lowest
//! SSE, and derive the usual diagnostics from the Jacobian at the optimum:
//! - parameter covariance `inv(JᵀJ) · SSE / (n - p)` and standard errors
//! - RMSE and R²
//! - the fitted curve on `len(x)` evenly spaced points over `[min x, max x]`

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::domain::{FitGrid, FitQuality, FitReport};
use crate::error::AppError;
use crate::fit::lm::{jacobian, levenberg_marquardt, LmOptions, LmResult};
use crate::math::{finite_range, linspace};
use crate::models::FitModel;

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    result: LmResult,
}

/// Fit `model` to `(xs, ys)` and report parameters with diagnostics.
pub fn fit_curve(model: &dyn FitModel, xs: &[f64], ys: &[f64], opts: &LmOptions) -> Result<FitReport, AppError> {
    if xs.len() != ys.len() {
        return Err(AppError::input(format!(
            "x and y have different lengths ({} vs {}).",
            xs.len(),
            ys.len()
        )));
    }
    let n = xs.len();
    let p = model.param_len();
    if n < p {
        return Err(AppError::data(format!(
            "Need at least {p} points to fit the {} model (got {n}).",
            model.kind().display_name()
        )));
    }
    if let Some(i) = xs.iter().zip(ys).position(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(AppError::data(format!("Non-finite data at point {} (row {}).", i, i + 1)));
    }

    let starts = model.initial_guesses(xs, ys);
    let candidates: Vec<Candidate> = starts
        .par_iter()
        .enumerate()
        .filter_map(|(idx, start)| match levenberg_marquardt(model, xs, ys, start, opts) {
            Ok(result) => Some(Candidate { idx, result }),
            Err(e) => {
                debug!("start {idx} {start:?} rejected: {e}");
                None
            }
        })
        .collect();

    if candidates.is_empty() {
        return Err(AppError::numeric(format!(
            "No valid fit candidates for model {}.",
            model.kind().display_name()
        )));
    }

    // Deterministic selection: pick the minimum SSE; break ties by start index.
    let mut best = &candidates[0];
    for c in &candidates[1..] {
        if c.result.sse < best.result.sse || (c.result.sse == best.result.sse && c.idx < best.idx) {
            best = c;
        }
    }
    if !best.result.converged {
        warn!(
            "{} fit stopped after {} iterations without meeting the tolerance.",
            model.kind().display_name(),
            best.result.iterations
        );
    }
    debug!(
        "selected start {} of {} (sse={:.6e})",
        best.idx,
        starts.len(),
        best.result.sse
    );

    let params = best.result.params.clone();
    let sse = best.result.sse;
    let covariance = covariance(model, xs, &params, sse)?;
    let std_errors: Vec<f64> = (0..p).map(|k| covariance[k][k].sqrt()).collect();

    let mean = ys.iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = ys.iter().map(|y| (y - mean).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - sse / ss_tot } else { f64::NAN };

    let grid = fitted_grid(model, xs, &params);

    info!(
        "{}: sse={sse:.6e} r2={r_squared:.6} after {} iterations",
        model.kind().display_name(),
        best.result.iterations
    );

    Ok(FitReport {
        model: model.kind(),
        expression: model.expression(),
        param_names: model.param_names().iter().map(|s| s.to_string()).collect(),
        params,
        std_errors,
        covariance,
        quality: FitQuality {
            sse,
            rmse: (sse / n as f64).sqrt(),
            r_squared,
            n,
            iterations: best.result.iterations,
        },
        grid,
    })
}

/// `inv(JᵀJ) · SSE / (n - p)`; all-`NaN` when there are no residual degrees of freedom.
fn covariance(model: &dyn FitModel, xs: &[f64], params: &[f64], sse: f64) -> Result<Vec<Vec<f64>>, AppError> {
    let n = xs.len();
    let p = params.len();
    if n <= p {
        warn!("No residual degrees of freedom (n={n}, p={p}); parameter uncertainties are undefined.");
        return Ok(vec![vec![f64::NAN; p]; p]);
    }

    let j = jacobian(model, xs, params);
    let jtj = j.transpose() * &j;
    let inv = jtj.try_inverse().ok_or_else(|| {
        AppError::numeric(format!(
            "Jacobian of the {} fit is singular; parameters are not identifiable from this data.",
            model.kind().display_name()
        ))
    })?;

    let scale = sse / (n - p) as f64;
    Ok((0..p).map(|r| (0..p).map(|c| inv[(r, c)] * scale).collect()).collect())
}

/// The fitted curve on `len(xs)` evenly spaced points spanning the data.
fn fitted_grid(model: &dyn FitModel, xs: &[f64], params: &[f64]) -> FitGrid {
    let Some((lo, hi)) = finite_range(xs) else {
        return FitGrid { x: Vec::new(), y: Vec::new() };
    };
    let x = linspace(lo, hi, xs.len());
    let y = x.iter().map(|&xi| model.eval(xi, params)).collect();
    FitGrid { x, y }
}

/// Inverse sink strength `-2 / ln(x)` sampled on `n` points in `[0.01, 0.5]`.
pub fn sink_strength_samples(n: usize) -> (Vec<f64>, Vec<f64>) {
    let xs = linspace(0.01, 0.5, n);
    let ys = xs.iter().map(|&x| -2.0 / x.ln()).collect();
    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cubic, ShiftedExp};

    #[test]
    fn sink_strength_cubic_fits_well() {
        let (xs, ys) = sink_strength_samples(100);
        let report = fit_curve(&Cubic, &xs, &ys, &LmOptions::default()).unwrap();

        assert!(report.quality.r_squared > 0.99);
        assert_eq!(report.params.len(), 4);
        assert!(report.std_errors.iter().all(|s| s.is_finite() && *s > 0.0));
        assert_eq!(report.grid.x.len(), 100);
        assert_eq!(report.grid.x[0], 0.01);
        assert_eq!(report.grid.x[99], 0.5);
    }

    #[test]
    fn multistart_finds_shifted_exp_parameters() {
        let m = ShiftedExp::default();
        let xs: Vec<f64> = (0..30).map(|i| 0.1 + i as f64 * 0.3 / 29.0).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| m.eval(x, &[0.05, 8.0])).collect();

        let report = fit_curve(&m, &xs, &ys, &LmOptions::default()).unwrap();
        assert!((report.params[0] - 0.05).abs() < 1e-6);
        assert!((report.params[1] - 8.0).abs() < 1e-5);
        assert!(report.quality.r_squared > 0.999_999);

        let y0 = report.initial_value().unwrap();
        assert!((y0 - m.eval(0.1, &[0.05, 8.0])).abs() < 1e-6);
    }

    #[test]
    fn too_few_points_is_a_data_error() {
        let err = fit_curve(&Cubic, &[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0], &LmOptions::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn exactly_determined_fit_has_nan_uncertainty() {
        let m = ShiftedExp::default();
        let xs = [0.1, 0.3];
        let ys: Vec<f64> = xs.iter().map(|&x| m.eval(x, &[0.05, 8.0])).collect();

        let report = fit_curve(&m, &xs, &ys, &LmOptions::default()).unwrap();
        assert!(report.std_errors.iter().all(|s| s.is_nan()));
        assert!(report.quality.sse < 1e-10);
    }

    #[test]
    fn non_finite_data_is_rejected() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [0.0, 1.0, f64::NAN, 3.0, 4.0];
        assert_eq!(fit_curve(&Cubic, &xs, &ys, &LmOptions::default()).unwrap_err().exit_code(), 3);
    }
}
