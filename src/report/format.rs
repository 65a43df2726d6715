//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the numerical code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::domain::FitReport;
use crate::io::OutputTable;
use crate::mapping::SweepOutcome;
use crate::mms::ConvergenceStudy;
use crate::ode::CoalescenceRun;
use crate::report::FitResidual;

/// Rows shown in the coalescence summary table.
const COALESCENCE_ROWS: usize = 11;

/// Convergence table for each verified case.
pub fn format_convergence(studies: &[ConvergenceStudy]) -> String {
    let mut out = String::new();

    for study in studies {
        out.push_str(&format!("=== MMS: {} ===\n", study.case));
        out.push_str(&format!("ODE: {}\n", study.equation));
        out.push_str(&format!("Interval: [{}, {}]\n\n", study.t0, study.t1));
        out.push_str(&format!("{:>8}  {:>12}  {:>14}  {:>8}\n", "N", "h", "rel. error", "order"));

        for (i, level) in study.levels.iter().enumerate() {
            let order = match i.checked_sub(1).and_then(|k| study.orders.get(k)) {
                Some(p) => format!("{p:.4}"),
                None => "-".to_string(),
            };
            out.push_str(&format!(
                "{:>8}  {:>12.4e}  {:>14.6e}  {:>8}\n",
                level.steps, level.step_size, level.final_error, order
            ));
        }

        if let Some(p) = study.observed_order() {
            out.push_str(&format!("\nObserved order of convergence: {p:.4}\n"));
        }
        out.push('\n');
    }

    out
}

/// Fit parameters, uncertainties and quality.
pub fn format_fit_summary(report: &FitReport, source: &str, worst: &[FitResidual]) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Fit: {} ===\n", report.model.display_name()));
    out.push_str(&format!("Data: {source} (n={})\n", report.quality.n));
    out.push_str(&format!("Model: y = {}\n\n", report.expression));

    out.push_str("Parameters:\n");
    for ((name, value), err) in report.param_names.iter().zip(&report.params).zip(&report.std_errors) {
        out.push_str(&format!("  {name} = {value:>14.6e}  ± {err:.3e}\n"));
    }

    out.push_str(&format!(
        "\nSSE={:.6e} RMSE={:.6e} R²={:.6} iterations={}\n",
        report.quality.sse, report.quality.rmse, report.quality.r_squared, report.quality.iterations
    ));
    if let Some(y0) = report.initial_value() {
        out.push_str(&format!("Initial value y(x_min) = {y0:.6e}\n"));
    }

    if !worst.is_empty() {
        out.push_str("\nLargest residuals:\n");
        out.push_str(&format!("{:>14}  {:>14}  {:>14}  {:>12}\n", "x", "y", "fit", "residual"));
        for r in worst {
            out.push_str(&format!(
                "{:>14.6e}  {:>14.6e}  {:>14.6e}  {:>12.3e}\n",
                r.x, r.y_obs, r.y_fit, r.residual
            ));
        }
    }

    out
}

/// Evenly spaced rows of a coalescence curve.
pub fn format_coalescence(run: &CoalescenceRun) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Coalescence: {} ===\n", run.model.display_name()));
    out.push_str(&format!(
        "N0={:.3e} bub/m2 | steps={} (rejected {})\n\n",
        run.n0, run.accepted_steps, run.rejected_steps
    ));
    out.push_str(&format!("{:>12}  {:>12}  {:>10}\n", "A (m2)", "N (bub/m2)", "A*N (/)"));

    let n = run.samples.len();
    if n == 0 {
        return out;
    }
    let rows = COALESCENCE_ROWS.min(n);
    let mut last = None;
    for k in 0..rows {
        let i = if rows == 1 { 0 } else { k * (n - 1) / (rows - 1) };
        if last == Some(i) {
            continue;
        }
        last = Some(i);
        let s = &run.samples[i];
        out.push_str(&format!("{:>12.4e}  {:>12.4e}  {:>10.4}\n", s.area, s.density, s.coverage));
    }

    out
}

/// Threshold points of every sweep variant.
pub fn format_sweeps(outcomes: &[SweepOutcome], variable: &str, target: f64) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Threshold map: '{variable}' = {target} ===\n"));
    for o in outcomes {
        out.push_str(&format!("\n{} ({}={})\n", o.label, o.flag, o.flag_value));
        if o.points.is_empty() {
            out.push_str("  no thresholds found\n");
        } else {
            out.push_str(&format!("{:>10}  {:>16}  {:>20}\n", "setpoint", "Temperature (K)", "Burnup (MWd/kgUO2)"));
            for p in &o.points {
                out.push_str(&format!("{:>10}  {:>16.3}  {:>20.6}\n", p.setpoint, p.temperature, p.burnup));
            }
        }
        if !o.not_found.is_empty() {
            out.push_str(&format!("  not reached at: {}\n", fmt_setpoints(&o.not_found)));
        }
        if !o.missing_output.is_empty() {
            out.push_str(&format!("  no output at: {}\n", fmt_setpoints(&o.missing_output)));
        }
    }

    out
}

/// Zero-based column positions of an output table.
pub fn format_columns(table: &OutputTable) -> String {
    let mut out = String::new();
    for (i, h) in table.headers().iter().enumerate() {
        out.push_str(&format!("{i:>4}  {h}\n"));
    }
    out.push_str(&format!("({} columns, {} rows)\n", table.headers().len(), table.len()));
    out
}

fn fmt_setpoints(values: &[i64]) -> String {
    values.iter().map(|v| format!("{v} K")).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MmsCase;
    use crate::mapping::ThresholdPoint;
    use crate::mms::{problem_for, run_study};

    #[test]
    fn convergence_table_lists_levels_and_order() {
        let study = run_study(problem_for(MmsCase::Decay).as_ref(), 0.0, 1.0, 20, 2).unwrap();
        let txt = format_convergence(&[study]);
        assert!(txt.starts_with("=== MMS: decay ===\n"));
        assert!(txt.contains("Observed order of convergence: 0.99"));
        let data_rows = txt.lines().filter(|l| l.trim_start().starts_with("20 ") || l.trim_start().starts_with("40 ")).count();
        assert_eq!(data_rows, 2);
    }

    #[test]
    fn columns_are_numbered_from_zero() {
        let t = OutputTable::parse("Time (h)\tTemperature (K)\t\n0\t600\t\n").unwrap();
        assert_eq!(format_columns(&t), "   0  Time (h)\n   1  Temperature (K)\n(2 columns, 1 rows)\n");
    }

    #[test]
    fn sweep_report_mentions_misses() {
        let o = SweepOutcome {
            flag: "iGrainBoundaryVenting".to_string(),
            flag_value: 0,
            label: "w/o athermal release".to_string(),
            points: vec![ThresholdPoint {
                setpoint: 650,
                row: 3,
                temperature: 650.0,
                burnup: 12.5,
            }],
            not_found: vec![675, 700],
            missing_output: Vec::new(),
        };
        let txt = format_sweeps(&[o], "Intergranular fractional coverage (/)", 0.5);
        assert!(txt.contains("w/o athermal release (iGrainBoundaryVenting=0)"));
        assert!(txt.contains("not reached at: 675 K, 700 K"));
        assert!(!txt.contains("no output at"));
    }
}
