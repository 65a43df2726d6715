//! Parameterized MMS convergence verification.
//!
//! A [`ManufacturedProblem`] bundles the three things that vary between solver
//! checks: the manufactured coefficient, the solver's one-step update rule, and
//! the closed-form reference. Everything else (grid construction, error
//! measurement, observed order) is shared.
//!
//! The coefficient for step `i -> i+1` is evaluated at `t[i+1]`, the right
//! endpoint of the sub-interval. This matches how the solver is driven in
//! practice and must not be moved to the left endpoint or midpoint.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::mms::grid::Grid;

/// Relative tolerance for the initial condition vs `reference(t0)` check.
const IC_REL_TOL: f64 = 1e-12;

/// A first-order ODE with a manufactured exact solution.
pub trait ManufacturedProblem {
    /// Short identifier used in reports and exports.
    fn name(&self) -> &'static str;

    /// One-line description of the ODE under test.
    fn equation(&self) -> &'static str;

    /// Seed value `y(t0)`.
    fn initial_condition(&self) -> f64;

    /// Manufactured coefficient fed to the update rule at time `t`.
    fn forcing(&self, t: f64) -> f64;

    /// The solver's update rule: `(y_i, coefficient, h) -> y_{i+1}`.
    fn step(&self, state: f64, coefficient: f64, h: f64) -> f64;

    /// Exact solution at time `t`.
    fn reference(&self, t: f64) -> f64;
}

/// A numerical solution on a grid: `values[i]` approximates `y(times[i])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last(&self) -> Option<(f64, f64)> {
        Some((*self.times.last()?, *self.values.last()?))
    }
}

/// One resolution of a convergence study.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyLevel {
    pub steps: usize,
    pub step_size: f64,
    pub final_error: f64,
    pub trajectory: Trajectory,
    /// Closed-form values at the trajectory times.
    pub reference: Vec<f64>,
    /// Pointwise relative errors.
    pub errors: Vec<f64>,
}

/// Results of running a problem on `N, 2N, 4N, ...` steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceStudy {
    pub case: String,
    pub equation: String,
    pub t0: f64,
    pub t1: f64,
    pub levels: Vec<StudyLevel>,
    /// `orders[k]` compares `levels[k]` with `levels[k + 1]`.
    pub orders: Vec<f64>,
}

impl ConvergenceStudy {
    /// Order from the two finest grids.
    pub fn observed_order(&self) -> Option<f64> {
        self.orders.last().copied()
    }
}

/// Integrate `problem` over `grid` with the solver's update rule.
pub fn simulate<P: ManufacturedProblem + ?Sized>(problem: &P, grid: &Grid) -> Result<Trajectory, AppError> {
    let ic = problem.initial_condition();
    let exact_t0 = problem.reference(grid.t0());
    if !ic.is_finite() || (ic - exact_t0).abs() > IC_REL_TOL * exact_t0.abs().max(1.0) {
        return Err(AppError::input(format!(
            "Initial condition {ic} for case '{}' does not match the reference value {exact_t0} at t0={}.",
            problem.name(),
            grid.t0(),
        )));
    }

    let h = grid.step_size();
    let times = grid.points();
    let mut values = Vec::with_capacity(times.len());
    values.push(ic);

    for i in 0..grid.steps() {
        let coefficient = problem.forcing(times[i + 1]);
        let next = problem.step(values[i], coefficient, h);
        values.push(next);
    }

    debug!(
        "{}: simulated {} steps (h={h:.6e}), y(t1)={:.6e}",
        problem.name(),
        grid.steps(),
        values[grid.steps()]
    );

    Ok(Trajectory { times, values })
}

/// Pointwise `|y_num - y_ref| / |y_ref|`.
///
/// A zero reference value makes the relative error undefined; this is reported as
/// an error naming the offending time rather than producing `inf`/`NaN`.
pub fn relative_error<P: ManufacturedProblem + ?Sized>(
    problem: &P,
    trajectory: &Trajectory,
) -> Result<Vec<f64>, AppError> {
    trajectory
        .times
        .iter()
        .zip(trajectory.values.iter())
        .map(|(&t, &y)| {
            let exact = problem.reference(t);
            if exact == 0.0 {
                return Err(AppError::numeric(format!(
                    "Reference solution of '{}' is zero at t={t}; relative error is undefined there.",
                    problem.name()
                )));
            }
            Ok((y - exact).abs() / exact.abs())
        })
        .collect()
}

/// Observed order from final errors on a grid and its 2x refinement.
///
/// Assuming `e ∝ h^p`, this returns `p`; a first-order scheme gives ~1.0.
pub fn order_of_convergence(error_coarse: f64, error_fine: f64) -> f64 {
    1.0 - (2.0 * error_fine / error_coarse).log2()
}

/// Run `problem` on `levels` successively refined grids starting from `steps`.
pub fn run_study<P: ManufacturedProblem + ?Sized>(
    problem: &P,
    t0: f64,
    t1: f64,
    steps: usize,
    levels: usize,
) -> Result<ConvergenceStudy, AppError> {
    if levels < 2 {
        return Err(AppError::input("A convergence study needs at least 2 grid levels."));
    }

    let mut grid = Grid::new(t0, t1, steps)?;
    let mut out = Vec::with_capacity(levels);
    for _ in 0..levels {
        let trajectory = simulate(problem, &grid)?;
        let errors = relative_error(problem, &trajectory)?;
        let final_error = errors.last().copied().unwrap_or(f64::NAN);
        let reference = trajectory.times.iter().map(|&t| problem.reference(t)).collect();
        out.push(StudyLevel {
            steps: grid.steps(),
            step_size: grid.step_size(),
            final_error,
            trajectory,
            reference,
            errors,
        });
        grid = grid.refined();
    }

    let orders = out
        .windows(2)
        .map(|w| order_of_convergence(w[0].final_error, w[1].final_error))
        .collect();

    Ok(ConvergenceStudy {
        case: problem.name().to_string(),
        equation: problem.equation().to_string(),
        t0,
        t1,
        levels: out,
        orders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y' = y with explicit Euler driven through the coefficient slot.
    struct Growth {
        ic: f64,
    }

    impl ManufacturedProblem for Growth {
        fn name(&self) -> &'static str {
            "growth"
        }
        fn equation(&self) -> &'static str {
            "y' = y"
        }
        fn initial_condition(&self) -> f64 {
            self.ic
        }
        fn forcing(&self, _t: f64) -> f64 {
            1.0
        }
        fn step(&self, state: f64, coefficient: f64, h: f64) -> f64 {
            state * (1.0 + coefficient * h)
        }
        fn reference(&self, t: f64) -> f64 {
            t.exp()
        }
    }

    /// Step rule that reproduces the reference exactly; records which times it was fed.
    struct Exact;

    impl ManufacturedProblem for Exact {
        fn name(&self) -> &'static str {
            "exact"
        }
        fn equation(&self) -> &'static str {
            "y = 1 + t"
        }
        fn initial_condition(&self) -> f64 {
            1.0
        }
        fn forcing(&self, t: f64) -> f64 {
            t
        }
        fn step(&self, _state: f64, coefficient: f64, _h: f64) -> f64 {
            // coefficient is the right-endpoint time
            1.0 + coefficient
        }
        fn reference(&self, t: f64) -> f64 {
            1.0 + t
        }
    }

    #[test]
    fn trajectory_has_n_plus_one_points_and_exact_seed() {
        let grid = Grid::new(0.0, 1.0, 20).unwrap();
        let traj = simulate(&Growth { ic: 1.0 }, &grid).unwrap();
        assert_eq!(traj.len(), 21);
        assert_eq!(traj.times.len(), 21);
        assert_eq!(traj.values[0], 1.0);
    }

    #[test]
    fn forcing_is_sampled_at_right_endpoint() {
        let grid = Grid::new(0.0, 2.0, 8).unwrap();
        let traj = simulate(&Exact, &grid).unwrap();
        let errors = relative_error(&Exact, &traj).unwrap();
        assert!(errors.iter().all(|&e| e == 0.0), "errors: {errors:?}");
    }

    #[test]
    fn mismatched_initial_condition_is_rejected() {
        let grid = Grid::new(0.0, 1.0, 4).unwrap();
        let err = simulate(&Growth { ic: 1.1 }, &grid).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn relative_error_is_non_negative() {
        let grid = Grid::new(0.0, 1.0, 10).unwrap();
        let traj = simulate(&Growth { ic: 1.0 }, &grid).unwrap();
        let errors = relative_error(&Growth { ic: 1.0 }, &traj).unwrap();
        assert_eq!(errors[0], 0.0);
        assert!(errors.iter().all(|&e| e >= 0.0));
        assert!(errors[10] > 0.0);
    }

    #[test]
    fn zero_reference_is_an_error() {
        struct Crossing;
        impl ManufacturedProblem for Crossing {
            fn name(&self) -> &'static str {
                "crossing"
            }
            fn equation(&self) -> &'static str {
                "y = 1 - t"
            }
            fn initial_condition(&self) -> f64 {
                1.0
            }
            fn forcing(&self, _t: f64) -> f64 {
                -1.0
            }
            fn step(&self, state: f64, coefficient: f64, h: f64) -> f64 {
                state + coefficient * h
            }
            fn reference(&self, t: f64) -> f64 {
                1.0 - t
            }
        }
        let grid = Grid::new(0.0, 1.0, 4).unwrap();
        let traj = simulate(&Crossing, &grid).unwrap();
        assert!(relative_error(&Crossing, &traj).is_err());
    }

    #[test]
    fn order_formula_matches_known_ratios() {
        assert!((order_of_convergence(0.1, 0.05) - 1.0).abs() < 1e-12);
        assert!((order_of_convergence(0.1, 0.025) - 2.0).abs() < 1e-12);
        assert!((order_of_convergence(0.1, 0.1)).abs() < 1e-12);
    }

    #[test]
    fn explicit_euler_study_is_first_order() {
        let study = run_study(&Growth { ic: 1.0 }, 0.0, 1.0, 40, 3).unwrap();
        assert_eq!(study.levels.len(), 3);
        assert_eq!(study.orders.len(), 2);
        assert_eq!(study.levels[1].steps, 80);
        assert_eq!(study.levels[2].steps, 160);
        let p = study.observed_order().unwrap();
        assert!((p - 1.0).abs() < 0.05, "order {p}");
    }

    #[test]
    fn study_needs_two_levels() {
        assert!(run_study(&Growth { ic: 1.0 }, 0.0, 1.0, 10, 1).is_err());
    }
}
