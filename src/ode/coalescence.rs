//! Grain-boundary bubble coalescence laws.
//!
//! Each law gives `dN/dA`: the change of the bubble number density `N` (bub/m²)
//! with the projected area `A` (m²) of a single bubble. The product `A · N` is the
//! fractional coverage of the grain face.

use log::info;
use nalgebra::DVector;
use serde::Serialize;

use crate::domain::{CoalescenceModel, OdeConfig};
use crate::error::AppError;
use crate::math::linspace;
use crate::ode::dopri::{integrate, IntegratorSettings, OdeSolution};

/// Right-hand side `dN/dA`.
pub fn coalescence_rate(model: CoalescenceModel, density: f64, area: f64, n_lim: f64) -> f64 {
    let n2 = density * density;
    match model {
        CoalescenceModel::Pastore => -6.0 * n2 / (3.0 + 4.0 * density * area),
        CoalescenceModel::White => -2.0 * n2,
        CoalescenceModel::Veshchunov => -2.0 * n2 / (1.0 + 2.0 * density * area),
        CoalescenceModel::Verdolin => {
            if density < n_lim {
                n_lim
            } else {
                -2.0 * n2
            }
        }
    }
}

/// One sampled point of a coalescence curve.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CoalescenceSample {
    pub area: f64,
    pub density: f64,
    pub coverage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoalescenceRun {
    pub model: CoalescenceModel,
    pub n0: f64,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub samples: Vec<CoalescenceSample>,
}

/// Integrate the selected law over `[0, a_end]` and sample it evenly.
pub fn run_coalescence(cfg: &OdeConfig) -> Result<CoalescenceRun, AppError> {
    if cfg.samples < 2 {
        return Err(AppError::input("At least 2 samples are required."));
    }
    if !(cfg.n0.is_finite() && cfg.n0 > 0.0) {
        return Err(AppError::input(format!("Initial density must be positive (got {}).", cfg.n0)));
    }

    let settings = IntegratorSettings {
        rtol: cfg.rtol,
        atol: cfg.atol,
        max_steps: cfg.max_steps,
        first_step: None,
    };
    let model = cfg.model;
    let n_lim = cfg.n_lim;

    let sol = integrate(
        |a, y: &DVector<f64>| DVector::from_element(1, coalescence_rate(model, y[0], a, n_lim)),
        0.0,
        cfg.a_end,
        DVector::from_element(1, cfg.n0),
        &settings,
    )?;

    let samples = sample_solution(&sol, cfg.a_end, cfg.samples)?;
    info!(
        "{}: N({:.3e}) = {:.4e} ({} steps, {} rejected)",
        model.display_name(),
        cfg.a_end,
        samples.last().map(|s| s.density).unwrap_or(f64::NAN),
        sol.accepted_steps(),
        sol.rejected_steps
    );

    Ok(CoalescenceRun {
        model,
        n0: cfg.n0,
        accepted_steps: sol.accepted_steps(),
        rejected_steps: sol.rejected_steps,
        samples,
    })
}

fn sample_solution(sol: &OdeSolution, a_end: f64, n: usize) -> Result<Vec<CoalescenceSample>, AppError> {
    linspace(0.0, a_end, n)
        .into_iter()
        .map(|area| {
            let state = sol
                .sample(area)
                .ok_or_else(|| AppError::numeric(format!("No solution available at A={area:.6e}.")))?;
            Ok(CoalescenceSample {
                area,
                density: state[0],
                coverage: area * state[0],
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(model: CoalescenceModel) -> OdeConfig {
        OdeConfig {
            model,
            n0: 2e13,
            a_end: 1e-11,
            n_lim: 1e11,
            samples: 101,
            rtol: 1e-8,
            atol: 1e-6,
            max_steps: 100_000,
            plot: false,
            plot_width: 60,
            plot_height: 15,
            export_csv: None,
            export_json: None,
        }
    }

    #[test]
    fn white_matches_closed_form() {
        let run = run_coalescence(&config(CoalescenceModel::White)).unwrap();
        assert_eq!(run.samples.len(), 101);
        assert_eq!(run.samples[0].density, 2e13);

        for s in &run.samples {
            let exact = 2e13 / (1.0 + 2.0 * 2e13 * s.area);
            assert!(((s.density - exact) / exact).abs() < 1e-4, "A={}: {} vs {exact}", s.area, s.density);
            assert!((s.coverage - s.area * s.density).abs() <= 1e-12 * s.coverage.abs());
        }
    }

    #[test]
    fn verdolin_floors_at_limit() {
        let run = run_coalescence(&config(CoalescenceModel::Verdolin)).unwrap();
        let last = run.samples.last().unwrap();
        // White alone would fall to ~5e10 by the end of the span.
        assert!(last.density > 0.99e11 && last.density < 1.01e11, "{}", last.density);
    }

    #[test]
    fn slower_laws_keep_more_bubbles() {
        let white = run_coalescence(&config(CoalescenceModel::White)).unwrap();
        let vesh = run_coalescence(&config(CoalescenceModel::Veshchunov)).unwrap();
        let end_white = white.samples.last().unwrap().density;
        let end_vesh = vesh.samples.last().unwrap().density;
        assert!(end_vesh > end_white);
    }

    #[test]
    fn rates_at_origin() {
        assert_eq!(coalescence_rate(CoalescenceModel::Pastore, 2.0, 0.0, 0.0), -8.0);
        assert_eq!(coalescence_rate(CoalescenceModel::Veshchunov, 2.0, 0.0, 0.0), -8.0);
        assert_eq!(coalescence_rate(CoalescenceModel::Verdolin, 2.0, 0.0, 5.0), 5.0);
    }
}
