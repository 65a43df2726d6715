//! Levenberg-Marquardt nonlinear least squares.
//!
//! For residuals `r = y - f(x; p)` each iteration solves the damped linear
//! problem `[J; sqrt(λ D)] δ = [r; 0]` (see `math::ols`) and accepts the step if
//! it lowers the SSE. Accepted steps shrink `λ` (towards Gauss-Newton), rejected
//! steps grow it (towards scaled gradient descent).
//!
//! The Jacobian is a forward difference; the models are cheap and have at most
//! four parameters.

use log::trace;
use nalgebra::{DMatrix, DVector};

use crate::error::AppError;
use crate::math::solve_damped;
use crate::models::FitModel;

const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e12;

#[derive(Debug, Clone)]
pub struct LmOptions {
    pub max_iters: usize,
    /// Stop once an accepted step lowers the SSE by less than this relative amount.
    pub tolerance: f64,
    pub initial_lambda: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iters: 200,
            tolerance: 1e-12,
            initial_lambda: 1e-3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LmResult {
    pub params: Vec<f64>,
    pub sse: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimize the SSE of `model` against `(xs, ys)` starting from `start`.
pub fn levenberg_marquardt(
    model: &dyn FitModel,
    xs: &[f64],
    ys: &[f64],
    start: &[f64],
    opts: &LmOptions,
) -> Result<LmResult, AppError> {
    if start.len() != model.param_len() {
        return Err(AppError::input(format!(
            "Start vector has {} parameters, model {} needs {}.",
            start.len(),
            model.kind().display_name(),
            model.param_len()
        )));
    }

    let mut params = DVector::from_column_slice(start);
    let mut r = residuals(model, xs, ys, params.as_slice()).ok_or_else(|| {
        AppError::numeric(format!("Model is not finite at the start point {start:?}."))
    })?;
    let mut sse = r.norm_squared();
    let mut lambda = opts.initial_lambda.max(LAMBDA_MIN);
    let mut iterations = 0;
    let mut converged = sse == 0.0;

    while !converged && iterations < opts.max_iters {
        iterations += 1;
        let j = jacobian(model, xs, params.as_slice());

        let mut accepted = false;
        while lambda <= LAMBDA_MAX {
            let Some(delta) = solve_damped(&j, &r, lambda) else {
                lambda *= 10.0;
                continue;
            };
            let trial = &params + &delta;

            if let Some(r_trial) = residuals(model, xs, ys, trial.as_slice()) {
                let sse_trial = r_trial.norm_squared();
                if sse_trial < sse {
                    let drop = (sse - sse_trial) / sse;
                    params = trial;
                    r = r_trial;
                    sse = sse_trial;
                    lambda = (lambda / 10.0).max(LAMBDA_MIN);
                    accepted = true;
                    converged = drop <= opts.tolerance || sse == 0.0;
                    break;
                }
            }
            lambda *= 10.0;
        }

        trace!("lm iter {iterations}: sse={sse:.6e} lambda={lambda:.1e}");

        if !accepted {
            // No damping level improves the SSE: a local minimum to working precision.
            converged = true;
        }
    }

    Ok(LmResult {
        params: params.iter().copied().collect(),
        sse,
        iterations,
        converged,
    })
}

/// `y - f(x; p)`, or `None` if any model value is not finite.
pub fn residuals(model: &dyn FitModel, xs: &[f64], ys: &[f64], params: &[f64]) -> Option<DVector<f64>> {
    let mut r = DVector::<f64>::zeros(xs.len());
    for (i, (&x, &y)) in xs.iter().zip(ys).enumerate() {
        let f = model.eval(x, params);
        if !f.is_finite() {
            return None;
        }
        r[i] = y - f;
    }
    Some(r)
}

/// Forward-difference Jacobian `∂f/∂p`, one row per observation.
pub fn jacobian(model: &dyn FitModel, xs: &[f64], params: &[f64]) -> DMatrix<f64> {
    let p = params.len();
    let mut j = DMatrix::<f64>::zeros(xs.len(), p);
    let mut shifted = params.to_vec();

    for k in 0..p {
        let h = f64::EPSILON.sqrt() * params[k].abs().max(1.0);
        shifted[k] = params[k] + h;
        for (i, &x) in xs.iter().enumerate() {
            j[(i, k)] = (model.eval(x, &shifted) - model.eval(x, params)) / h;
        }
        shifted[k] = params[k];
    }

    j
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cubic, ShiftedExp};

    #[test]
    fn recovers_cubic_from_unit_start() {
        let truth = [0.4, 5.0, -6.5, 13.0];
        let xs: Vec<f64> = (0..30).map(|i| 0.01 + i as f64 * 0.015).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| Cubic.eval(x, &truth)).collect();

        let fit = levenberg_marquardt(&Cubic, &xs, &ys, &[1.0; 4], &LmOptions::default()).unwrap();
        assert!(fit.converged);
        for (a, b) in fit.params.iter().zip(truth.iter()) {
            assert!((a - b).abs() < 1e-5, "{a} vs {b}");
        }
    }

    #[test]
    fn recovers_shifted_exp_near_truth() {
        let m = ShiftedExp::default();
        let xs: Vec<f64> = (0..30).map(|i| 0.1 + i as f64 * 0.01).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| m.eval(x, &[0.05, 8.0])).collect();

        let fit = levenberg_marquardt(&m, &xs, &ys, &[0.02, 10.0], &LmOptions::default()).unwrap();
        assert!((fit.params[0] - 0.05).abs() < 1e-6);
        assert!((fit.params[1] - 8.0).abs() < 1e-5);
        assert!(fit.sse < 1e-16);
    }

    #[test]
    fn jacobian_of_linear_model_is_design_matrix() {
        let xs = [0.0, 0.5, 2.0];
        let j = jacobian(&Cubic, &xs, &[1.0, 1.0, 1.0, 1.0]);
        assert!((j[(2, 0)] - 1.0).abs() < 1e-6);
        assert!((j[(2, 1)] - 2.0).abs() < 1e-6);
        assert!((j[(2, 2)] - 4.0).abs() < 1e-6);
        assert!((j[(2, 3)] - 8.0).abs() < 1e-6);
    }

    #[test]
    fn wrong_start_length_is_an_input_error() {
        let err = levenberg_marquardt(&Cubic, &[0.0], &[0.0], &[1.0], &LmOptions::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
