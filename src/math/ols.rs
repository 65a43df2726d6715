//! Linear least squares solver.
//!
//! Every Levenberg-Marquardt iteration solves a small damped problem:
//!
//! ```text
//! minimize |J δ - r|^2 + λ Σ d_j δ_j^2
//! ```
//!
//! which is the ordinary least squares problem for the stacked system
//! `[J; sqrt(λ D)] δ = [r; 0]`.
//!
//! Implementation choices:
//! - We use SVD so tall systems (more rows than columns) are solved directly.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Parameter counts are tiny (2-4 columns), so SVD cost is negligible.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-14, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve the damped step `[J; sqrt(λ D)] δ = [r; 0]`, with `D = diag(JᵀJ)`.
pub fn solve_damped(jacobian: &DMatrix<f64>, residuals: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let (n, p) = jacobian.shape();
    let mut a = DMatrix::<f64>::zeros(n + p, p);
    let mut b = DVector::<f64>::zeros(n + p);

    a.view_mut((0, 0), (n, p)).copy_from(jacobian);
    b.rows_mut(0, n).copy_from(residuals);

    for j in 0..p {
        // Marquardt scaling; floor keeps insensitive parameters damped.
        let d = jacobian.column(j).norm_squared().max(1e-12);
        a[(n + j, j)] = (lambda * d).sqrt();
    }

    solve_least_squares(&a, &b)
}
