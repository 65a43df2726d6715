//! Manufactured problems for the solver's scalar update rules.
//!
//! | Case                 | ODE                  | Reference        |
//! |----------------------|----------------------|------------------|
//! | binary interaction   | `y' = -k y^2`        | `cos t · e^{-t}` |
//! | logistic             | `y' = a y (1 - b y)` | `cos t`          |
//! | decay                | `y' = S - L y`       | `cos t · e^{-t}` |
//!
//! Each case manufactures the time-dependent coefficient so that the reference is
//! the exact solution of the continuous ODE. All references are nonzero on
//! `[0, 1]`; intervals reaching `t = π/2` make the relative error undefined.

use crate::domain::MmsCase;
use crate::mms::verifier::ManufacturedProblem;

/// Solver `BinaryInteraction`: `y_{n+1} = y_n / (1 + k y_n h)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryInteraction;

impl ManufacturedProblem for BinaryInteraction {
    fn name(&self) -> &'static str {
        "binary-interaction"
    }

    fn equation(&self) -> &'static str {
        "y' = -k(t) y^2"
    }

    fn initial_condition(&self) -> f64 {
        1.0
    }

    fn forcing(&self, t: f64) -> f64 {
        (t.sin() + t.cos()) / (t.cos() * t.cos()) / (-t).exp()
    }

    fn step(&self, state: f64, coefficient: f64, h: f64) -> f64 {
        state / (1.0 + coefficient * state * h)
    }

    fn reference(&self, t: f64) -> f64 {
        t.cos() * (-t).exp()
    }
}

/// Solver `Logistic`: `y_{n+1} = y_n / (1 - a h (1 - b y_n))`.
#[derive(Debug, Clone, Copy)]
pub struct Logistic {
    /// Saturation parameter `b`.
    pub saturation: f64,
}

impl Default for Logistic {
    fn default() -> Self {
        Self { saturation: 0.1 }
    }
}

impl ManufacturedProblem for Logistic {
    fn name(&self) -> &'static str {
        "logistic"
    }

    fn equation(&self) -> &'static str {
        "y' = a(t) y (1 - b y)"
    }

    fn initial_condition(&self) -> f64 {
        1.0
    }

    fn forcing(&self, t: f64) -> f64 {
        -t.sin() / (t.cos() * (1.0 - self.saturation * t.cos()))
    }

    fn step(&self, state: f64, coefficient: f64, h: f64) -> f64 {
        state / (1.0 - coefficient * h * (1.0 - self.saturation * state))
    }

    fn reference(&self, t: f64) -> f64 {
        t.cos()
    }
}

/// Solver `Decay`: `y_{n+1} = (y_n + S h) / (1 + L h)`, with the source manufactured.
#[derive(Debug, Clone, Copy)]
pub struct Decay {
    /// Decay rate `L`.
    pub rate: f64,
}

impl Default for Decay {
    fn default() -> Self {
        Self { rate: 1.0 }
    }
}

impl ManufacturedProblem for Decay {
    fn name(&self) -> &'static str {
        "decay"
    }

    fn equation(&self) -> &'static str {
        "y' = S(t) - L y"
    }

    fn initial_condition(&self) -> f64 {
        1.0
    }

    /// `S = y' + L y` for `y = cos t · e^{-t}`.
    fn forcing(&self, t: f64) -> f64 {
        (-t).exp() * ((self.rate - 1.0) * t.cos() - t.sin())
    }

    fn step(&self, state: f64, coefficient: f64, h: f64) -> f64 {
        (state + coefficient * h) / (1.0 + self.rate * h)
    }

    fn reference(&self, t: f64) -> f64 {
        t.cos() * (-t).exp()
    }
}

/// Resolve a CLI case to its problem definition.
pub fn problem_for(case: MmsCase) -> Box<dyn ManufacturedProblem> {
    match case {
        MmsCase::BinaryInteraction => Box::new(BinaryInteraction),
        MmsCase::Logistic => Box::new(Logistic::default()),
        MmsCase::Decay => Box::new(Decay::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mms::{relative_error, run_study, simulate, Grid};

    /// Central-difference check that the forcing makes the reference an exact solution.
    fn residual_of_continuous_ode(
        rhs: impl Fn(f64, f64) -> f64,
        reference: impl Fn(f64) -> f64,
        t: f64,
    ) -> f64 {
        let d = 1e-6;
        let dydt = (reference(t + d) - reference(t - d)) / (2.0 * d);
        dydt - rhs(t, reference(t))
    }

    #[test]
    fn manufactured_forcings_are_consistent() {
        let bi = BinaryInteraction;
        let lg = Logistic::default();
        let dc = Decay { rate: 2.5 };
        for &t in &[0.1, 0.4, 0.7, 0.95] {
            let r1 = residual_of_continuous_ode(|t, y| -bi.forcing(t) * y * y, |t| bi.reference(t), t);
            let r2 = residual_of_continuous_ode(
                |t, y| lg.forcing(t) * y * (1.0 - lg.saturation * y),
                |t| lg.reference(t),
                t,
            );
            let r3 = residual_of_continuous_ode(|t, y| dc.forcing(t) - dc.rate * y, |t| dc.reference(t), t);
            assert!(r1.abs() < 1e-6, "binary interaction residual {r1} at t={t}");
            assert!(r2.abs() < 1e-6, "logistic residual {r2} at t={t}");
            assert!(r3.abs() < 1e-6, "decay residual {r3} at t={t}");
        }
    }

    #[test]
    fn decay_end_to_end_on_unit_interval() {
        let study = run_study(&Decay::default(), 0.0, 1.0, 20, 2).unwrap();
        let e_coarse = study.levels[0].final_error;
        let e_fine = study.levels[1].final_error;
        assert!(e_coarse < 0.05, "coarse error {e_coarse}");
        assert!(e_fine < 0.05, "fine error {e_fine}");
        assert!(e_fine < e_coarse);
        let p = study.observed_order().unwrap();
        assert!((p - 1.0).abs() < 0.05, "order {p}");
    }

    #[test]
    fn all_cases_converge_at_first_order() {
        for case in [MmsCase::BinaryInteraction, MmsCase::Logistic, MmsCase::Decay] {
            let problem = problem_for(case);
            let study = run_study(problem.as_ref(), 0.0, 1.0, 20, 2).unwrap();
            let p = study.observed_order().unwrap();
            assert!((p - 1.0).abs() < 0.15, "{}: order {p}", problem.name());
        }
    }

    #[test]
    fn order_tightens_with_refinement() {
        let study = run_study(&BinaryInteraction, 0.0, 1.0, 10, 5).unwrap();
        let deviations: Vec<f64> = study.orders.iter().map(|p| (p - 1.0).abs()).collect();
        for w in deviations.windows(2) {
            assert!(w[1] < w[0], "deviations should shrink: {deviations:?}");
        }
        assert!(deviations[deviations.len() - 1] < 0.01);
    }

    #[test]
    fn seed_value_is_exact_for_every_case() {
        let grid = Grid::new(0.0, 1.0, 20).unwrap();
        for case in [MmsCase::BinaryInteraction, MmsCase::Logistic, MmsCase::Decay] {
            let problem = problem_for(case);
            let traj = simulate(problem.as_ref(), &grid).unwrap();
            assert_eq!(traj.len(), 21);
            assert_eq!(traj.values[0], 1.0);
            let errors = relative_error(problem.as_ref(), &traj).unwrap();
            assert_eq!(errors[0], 0.0);
        }
    }
}
