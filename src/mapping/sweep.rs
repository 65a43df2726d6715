//! Threshold maps over a temperature sweep.
//!
//! For each temperature setpoint the solver is run under constant conditions
//! and the first output row where the mapped variable reaches the target value
//! is located. The temperature and burnup at that row form one map point.
//!
//! The solver communicates through fixed file names in its working directory,
//! so runs are strictly sequential.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::Serialize;

use crate::domain::MapConfig;
use crate::error::AppError;
use crate::io::{
    constant_history, write_history, OutputTable, SolverSettings, HISTORY_FILE, OUTPUT_FILE, SETTINGS_FILE,
    VENTING_FLAG,
};
use crate::mapping::runner::SolverRunner;

/// One located threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdPoint {
    /// Imposed temperature of the run (K).
    pub setpoint: i64,
    /// Zero-based data row where the threshold was first reached.
    pub row: usize,
    pub temperature: f64,
    pub burnup: f64,
}

/// Results of one temperature sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepOutcome {
    pub flag: String,
    pub flag_value: i32,
    pub label: String,
    pub points: Vec<ThresholdPoint>,
    /// Setpoints whose output never reached the target.
    pub not_found: Vec<i64>,
    /// Setpoints for which no output file was produced.
    pub missing_output: Vec<i64>,
}

/// Temperature setpoints `start, start + step, ...` below `end`.
pub fn setpoints(start: i64, end: i64, step: i64) -> Result<Vec<i64>, AppError> {
    if step <= 0 {
        return Err(AppError::input(format!("Temperature step must be positive (got {step}).")));
    }
    let mut out = Vec::new();
    let mut t = start;
    while t < end {
        out.push(t);
        t += step;
    }
    Ok(out)
}

/// Legend label for a venting option.
pub fn variant_label(flag: &str, value: i32) -> String {
    if flag == VENTING_FLAG {
        match value {
            0 => return "w/o athermal release".to_string(),
            1 => return "w/ vented fraction".to_string(),
            2 => return "w/ athermal release - Claisse".to_string(),
            3 => return "w/ athermal release - ann".to_string(),
            _ => {}
        }
    }
    format!("{flag}={value}")
}

/// First data row whose `variable` value is within `tolerance` of `target`.
pub fn find_threshold_row(
    table: &OutputTable,
    variable: &str,
    target: f64,
    tolerance: f64,
) -> Result<Option<usize>, AppError> {
    let values = table.column(variable)?;
    Ok(values.iter().position(|v| (v - target).abs() <= tolerance))
}

/// Run the temperature sweep once with the current settings file.
pub fn run_sweep(
    runner: &mut dyn SolverRunner,
    cfg: &MapConfig,
    flag_value: i32,
) -> Result<SweepOutcome, AppError> {
    let workdir = cfg.workdir.as_path();
    let mut outcome = SweepOutcome {
        flag: cfg.flag.clone(),
        flag_value,
        label: variant_label(&cfg.flag, flag_value),
        points: Vec::new(),
        not_found: Vec::new(),
        missing_output: Vec::new(),
    };

    for setpoint in setpoints(cfg.temperature_start, cfg.temperature_end, cfg.temperature_step)? {
        info!("{}: temperature {setpoint} K", outcome.label);

        let history = constant_history(
            cfg.time_start,
            cfg.time_end,
            setpoint as f64,
            cfg.fission_rate,
            cfg.hydrostatic_stress,
        );
        write_history(&workdir.join(HISTORY_FILE), &history)?;

        let output = workdir.join(OUTPUT_FILE);
        remove_stale(&output)?;
        runner.run(workdir)?;

        let Some(table) = OutputTable::read_optional(&output)? else {
            outcome.missing_output.push(setpoint);
            continue;
        };

        match find_threshold_row(&table, &cfg.variable, cfg.target, cfg.tolerance)? {
            Some(row) => {
                let temperature = table.value(row, table.column_index(&cfg.temperature_column)?)?;
                let burnup = table.value(row, table.column_index(&cfg.burnup_column)?)?;
                info!("threshold found at row {row}: T={temperature} K, burnup={burnup}");
                outcome.points.push(ThresholdPoint {
                    setpoint,
                    row,
                    temperature,
                    burnup,
                });
            }
            None => {
                warn!(
                    "Threshold not found at {setpoint} K: '{}' never equals {}.",
                    cfg.variable, cfg.target
                );
                outcome.not_found.push(setpoint);
            }
        }
    }

    info!(
        "{}: {} threshold(s), {} miss(es), {} missing output(s)",
        outcome.label,
        outcome.points.len(),
        outcome.not_found.len(),
        outcome.missing_output.len()
    );
    Ok(outcome)
}

/// One sweep per value of `cfg.flag`, rewriting the settings file before each.
pub fn run_variants(runner: &mut dyn SolverRunner, cfg: &MapConfig) -> Result<Vec<SweepOutcome>, AppError> {
    if cfg.flag_values.is_empty() {
        return Err(AppError::input(format!("No values given for flag '{}'.", cfg.flag)));
    }

    let mut outcomes = Vec::with_capacity(cfg.flag_values.len());
    for &value in &cfg.flag_values {
        let mut settings = SolverSettings::default();
        settings.set(&cfg.flag, value)?;
        settings.write(&cfg.workdir.join(SETTINGS_FILE))?;

        outcomes.push(run_sweep(runner, cfg, value)?);
    }
    Ok(outcomes)
}

fn remove_stale(path: &Path) -> Result<(), AppError> {
    if path.exists() {
        fs::remove_file(path)
            .map_err(|e| AppError::input(format!("Failed to remove stale '{}': {e}", path.display())))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const COVERAGE: &str = "Intergranular fractional coverage (/)";

    /// Writes an output table whose coverage reaches 0.5 at row `T / 100 - 5`,
    /// except at setpoints listed in `never` (no threshold) or `silent` (no file).
    struct FakeSolver {
        runs: usize,
        never: Vec<i64>,
        silent: Vec<i64>,
        seen_settings: Vec<Option<i32>>,
    }

    impl FakeSolver {
        fn new() -> Self {
            Self {
                runs: 0,
                never: Vec::new(),
                silent: Vec::new(),
                seen_settings: Vec::new(),
            }
        }
    }

    impl SolverRunner for FakeSolver {
        fn run(&mut self, workdir: &Path) -> Result<(), AppError> {
            self.runs += 1;
            let settings = SolverSettings::read(&workdir.join(SETTINGS_FILE)).ok();
            self.seen_settings.push(settings.and_then(|s| s.get(VENTING_FLAG)));

            let history = fs::read_to_string(workdir.join(HISTORY_FILE)).unwrap();
            let temperature: i64 = history.split('\t').nth(1).unwrap().parse().unwrap();
            if self.silent.contains(&temperature) {
                return Ok(());
            }

            let hit = if self.never.contains(&temperature) {
                usize::MAX
            } else {
                (temperature / 100 - 5) as usize
            };
            let mut text = format!("Time (h)\tTemperature (K)\tBurnup (MWd/kgUO2)\t{COVERAGE}\t\n");
            for row in 0..10 {
                let coverage = if row >= hit { 0.5 } else { 0.1 * row as f64 / 10.0 };
                text.push_str(&format!(
                    "{}\t{temperature}\t{}\t{coverage}\t\n",
                    row * 100,
                    row as f64 * 0.5
                ));
            }
            fs::write(workdir.join(OUTPUT_FILE), text).unwrap();
            Ok(())
        }
    }

    fn config(workdir: PathBuf) -> MapConfig {
        MapConfig {
            solver: workdir.join("sciantix.x"),
            workdir,
            time_start: 0.0,
            time_end: 30000.0,
            temperature_start: 600,
            temperature_end: 1000,
            temperature_step: 100,
            fission_rate: 3e18,
            hydrostatic_stress: 0.0,
            variable: COVERAGE.to_string(),
            target: 0.5,
            tolerance: 0.0,
            flag: VENTING_FLAG.to_string(),
            flag_values: vec![0, 1],
            temperature_column: "Temperature (K)".to_string(),
            burnup_column: "Burnup (MWd/kgUO2)".to_string(),
            plot: false,
            plot_width: 60,
            plot_height: 15,
            export_csv: None,
            export_json: None,
        }
    }

    #[test]
    fn setpoints_exclude_end() {
        assert_eq!(setpoints(650, 750, 25).unwrap(), vec![650, 675, 700, 725]);
        assert!(setpoints(650, 650, 25).unwrap().is_empty());
        assert_eq!(setpoints(0, 10, 0).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn sweep_finds_first_matching_row() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path().to_path_buf());
        let mut solver = FakeSolver::new();

        let out = run_sweep(&mut solver, &cfg, 0).unwrap();
        assert_eq!(solver.runs, 4);
        assert_eq!(out.points.len(), 4);
        // 600 K -> row 1, 900 K -> row 4.
        assert_eq!(out.points[0].row, 1);
        assert_eq!(out.points[0].burnup, 0.5);
        assert_eq!(out.points[3].row, 4);
        assert_eq!(out.points[3].temperature, 900.0);
        assert_eq!(out.points[3].burnup, 2.0);
    }

    #[test]
    fn sweep_skips_misses_and_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path().to_path_buf());
        let mut solver = FakeSolver::new();
        solver.never = vec![700];
        solver.silent = vec![800];

        let out = run_sweep(&mut solver, &cfg, 0).unwrap();
        assert_eq!(out.points.iter().map(|p| p.setpoint).collect::<Vec<_>>(), vec![600, 900]);
        assert_eq!(out.not_found, vec![700]);
        assert_eq!(out.missing_output, vec![800]);
    }

    #[test]
    fn sweep_writes_constant_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path().to_path_buf());
        cfg.temperature_start = 650;
        cfg.temperature_end = 651;
        let mut solver = FakeSolver::new();
        solver.silent = vec![650];

        run_sweep(&mut solver, &cfg, 0).unwrap();
        let history = fs::read_to_string(dir.path().join(HISTORY_FILE)).unwrap();
        assert_eq!(history, "0\t650\t3e18\t0\n30000\t650\t3e18\t0");
    }

    #[test]
    fn variants_rewrite_settings_before_each_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path().to_path_buf());
        let mut solver = FakeSolver::new();

        let outcomes = run_variants(&mut solver, &cfg).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].label, "w/o athermal release");
        assert_eq!(outcomes[1].label, "w/ vented fraction");
        assert_eq!(solver.seen_settings, vec![Some(0); 4].into_iter().chain(vec![Some(1); 4]).collect::<Vec<_>>());
    }

    #[test]
    fn unknown_flag_is_rejected_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path().to_path_buf());
        cfg.flag = "iNotAFlag".to_string();
        let mut solver = FakeSolver::new();

        assert_eq!(run_variants(&mut solver, &cfg).unwrap_err().exit_code(), 2);
        assert_eq!(solver.runs, 0);
    }

    #[test]
    fn tolerance_widens_the_match() {
        let table = OutputTable::parse("v\t\n0.1\t\n0.4999\t\n0.5\t\n").unwrap();
        assert_eq!(find_threshold_row(&table, "v", 0.5, 0.0).unwrap(), Some(2));
        assert_eq!(find_threshold_row(&table, "v", 0.5, 1e-3).unwrap(), Some(1));
        assert_eq!(find_threshold_row(&table, "v", 0.9, 0.0).unwrap(), None);
    }
}
