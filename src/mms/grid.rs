//! Uniform time grids for convergence studies.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// `steps + 1` evenly spaced points over the closed interval `[t0, t1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    t0: f64,
    t1: f64,
    steps: usize,
}

impl Grid {
    pub fn new(t0: f64, t1: f64, steps: usize) -> Result<Self, AppError> {
        if !(t0.is_finite() && t1.is_finite() && t1 > t0) {
            return Err(AppError::input(format!(
                "Invalid interval: t0={t0}, t1={t1} (must be finite with t1 > t0)."
            )));
        }
        if steps == 0 {
            return Err(AppError::input("Step count must be >= 1."));
        }
        Ok(Self { t0, t1, steps })
    }

    pub fn t0(&self) -> f64 {
        self.t0
    }

    pub fn t1(&self) -> f64 {
        self.t1
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn step_size(&self) -> f64 {
        (self.t1 - self.t0) / self.steps as f64
    }

    /// Grid time `i` in `0..=steps`.
    ///
    /// The last point is `t1` exactly, so refined grids share both endpoints bit-for-bit.
    pub fn time(&self, i: usize) -> f64 {
        if i >= self.steps {
            self.t1
        } else {
            self.t0 + i as f64 * self.step_size()
        }
    }

    pub fn points(&self) -> Vec<f64> {
        (0..=self.steps).map(|i| self.time(i)).collect()
    }

    /// Same interval, twice the steps.
    pub fn refined(&self) -> Self {
        Self {
            t0: self.t0,
            t1: self.t1,
            steps: self.steps * 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_include_both_endpoints() {
        let grid = Grid::new(0.0, 1.0, 20).unwrap();
        let pts = grid.points();
        assert_eq!(pts.len(), 21);
        assert_eq!(pts[0], 0.0);
        assert_eq!(pts[20], 1.0);
        assert!((pts[10] - 0.5).abs() < 1e-15);
    }

    #[test]
    fn refining_keeps_endpoints_and_halves_step() {
        let coarse = Grid::new(0.25, 3.0, 7).unwrap();
        let fine = coarse.refined();
        assert_eq!(fine.steps(), 14);
        assert_eq!(fine.t0(), coarse.t0());
        assert_eq!(fine.t1(), coarse.t1());
        assert_eq!(fine.points()[0], coarse.points()[0]);
        assert_eq!(fine.points()[14], coarse.points()[7]);
        assert!((fine.step_size() - coarse.step_size() / 2.0).abs() < 1e-15);
    }

    #[test]
    fn rejects_empty_or_reversed_interval() {
        assert!(Grid::new(1.0, 1.0, 10).is_err());
        assert!(Grid::new(1.0, 0.0, 10).is_err());
        assert!(Grid::new(0.0, 1.0, 0).is_err());
        assert!(Grid::new(0.0, f64::NAN, 4).is_err());
    }
}
