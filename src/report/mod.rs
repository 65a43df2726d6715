//! Reporting utilities: residuals and formatted terminal output.

pub mod format;

pub use format::*;

use serde::Serialize;

use crate::error::AppError;
use crate::models::FitModel;

/// Observed vs fitted value at one data point.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FitResidual {
    pub x: f64,
    pub y_obs: f64,
    pub y_fit: f64,
    pub residual: f64,
}

/// Compute fitted values and residuals for each observation.
pub fn compute_residuals(
    model: &dyn FitModel,
    params: &[f64],
    xs: &[f64],
    ys: &[f64],
) -> Result<Vec<FitResidual>, AppError> {
    let mut out = Vec::with_capacity(xs.len());
    for (&x, &y_obs) in xs.iter().zip(ys) {
        let y_fit = model.eval(x, params);
        if !y_fit.is_finite() {
            return Err(AppError::numeric(format!(
                "Non-finite model prediction at x={x} during residual computation."
            )));
        }
        out.push(FitResidual {
            x,
            y_obs,
            y_fit,
            residual: y_obs - y_fit,
        });
    }
    Ok(out)
}

/// The `top_n` residuals with the largest magnitude, largest first.
pub fn largest_residuals(residuals: &[FitResidual], top_n: usize) -> Vec<FitResidual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| {
        b.residual
            .abs()
            .partial_cmp(&a.residual.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(top_n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cubic;

    #[test]
    fn residuals_are_observed_minus_fitted() {
        let r = compute_residuals(&Cubic, &[1.0, 0.0, 0.0, 0.0], &[0.0, 1.0, 2.0], &[1.5, 0.0, 1.0]).unwrap();
        assert_eq!(r.iter().map(|r| r.residual).collect::<Vec<_>>(), vec![0.5, -1.0, 0.0]);

        let top = largest_residuals(&r, 2);
        assert_eq!(top[0].x, 1.0);
        assert_eq!(top[1].x, 0.0);
    }
}
