//! Correlation model evaluation.
//!
//! The fitter relies on two primitive operations:
//! - evaluate `y(x)` for a parameter vector (for residuals, Jacobians and plots)
//! - propose a few deterministic starting points for the nonlinear search
//!
//! These are implemented here for each model kind.

use nalgebra::{DMatrix, DVector};

use crate::domain::FitModelKind;
use crate::math::solve_least_squares;

/// Default shift of the aspect-ratio correlation.
pub const DEFAULT_X_SHIFT: f64 = 0.196;

/// Trial growth rates for the shifted exponential. Each is paired with the
/// amplitude that is optimal for it, so every start is already a sensible curve.
const EXP_RATE_GRID: [f64; 8] = [-10.0, -5.0, -1.0, 1.0, 2.0, 5.0, 10.0, 20.0];

/// A parametric correlation `y = f(x; p)`.
pub trait FitModel: Send + Sync {
    fn kind(&self) -> FitModelKind;

    /// Human-readable formula, e.g. `a + b*x + c*x^2 + d*x^3`.
    fn expression(&self) -> String;

    fn param_names(&self) -> &'static [&'static str];

    fn eval(&self, x: f64, params: &[f64]) -> f64;

    /// Starting points for the multistart search.
    ///
    /// The first entry is always all-ones so a fit without data-driven guesses
    /// behaves like a plain unseeded curve fit.
    fn initial_guesses(&self, xs: &[f64], ys: &[f64]) -> Vec<Vec<f64>>;

    fn param_len(&self) -> usize {
        self.param_names().len()
    }
}

/// `a + b x + c x^2 + d x^3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cubic;

impl FitModel for Cubic {
    fn kind(&self) -> FitModelKind {
        FitModelKind::Cubic
    }

    fn expression(&self) -> String {
        "a + b*x + c*x^2 + d*x^3".to_string()
    }

    fn param_names(&self) -> &'static [&'static str] {
        &["a", "b", "c", "d"]
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        // Horner form.
        params[0] + x * (params[1] + x * (params[2] + x * params[3]))
    }

    fn initial_guesses(&self, xs: &[f64], ys: &[f64]) -> Vec<Vec<f64>> {
        let mut out = vec![vec![1.0; 4]];

        // The model is linear in its parameters, so the OLS solution is the
        // answer already; LM then only has to confirm it.
        let n = xs.len().min(ys.len());
        if n >= 4 {
            let mut x = DMatrix::<f64>::zeros(n, 4);
            for (i, &xi) in xs.iter().take(n).enumerate() {
                x[(i, 0)] = 1.0;
                x[(i, 1)] = xi;
                x[(i, 2)] = xi * xi;
                x[(i, 3)] = xi * xi * xi;
            }
            let y = DVector::from_iterator(n, ys.iter().take(n).copied());
            if let Some(beta) = solve_least_squares(&x, &y) {
                out.push(beta.iter().copied().collect());
            }
        }

        out
    }
}

/// `a (exp(b (x - x0)) - 1)` with a fixed shift `x0`.
#[derive(Debug, Clone, Copy)]
pub struct ShiftedExp {
    pub x_shift: f64,
}

impl Default for ShiftedExp {
    fn default() -> Self {
        Self {
            x_shift: DEFAULT_X_SHIFT,
        }
    }
}

impl ShiftedExp {
    fn basis(&self, x: f64, rate: f64) -> f64 {
        (rate * (x - self.x_shift)).exp_m1()
    }
}

impl FitModel for ShiftedExp {
    fn kind(&self) -> FitModelKind {
        FitModelKind::ShiftedExp
    }

    fn expression(&self) -> String {
        format!("a * (exp(b * (x - {})) - 1)", self.x_shift)
    }

    fn param_names(&self) -> &'static [&'static str] {
        &["a", "b"]
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        params[0] * self.basis(x, params[1])
    }

    fn initial_guesses(&self, xs: &[f64], ys: &[f64]) -> Vec<Vec<f64>> {
        let mut out = vec![vec![1.0, 1.0]];

        // For a fixed rate the amplitude is a one-column least squares problem.
        for &rate in &EXP_RATE_GRID {
            let mut num = 0.0;
            let mut den = 0.0;
            for (&x, &y) in xs.iter().zip(ys) {
                let g = self.basis(x, rate);
                num += g * y;
                den += g * g;
            }
            if den > 0.0 && (num / den).is_finite() {
                out.push(vec![num / den, rate]);
            }
        }

        out
    }
}

/// Construct the model for a CLI selection.
pub fn model_for(kind: FitModelKind, x_shift: f64) -> Box<dyn FitModel> {
    match kind {
        FitModelKind::Cubic => Box::new(Cubic),
        FitModelKind::ShiftedExp => Box::new(ShiftedExp { x_shift }),
    }
}
