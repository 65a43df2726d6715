//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs the logger
//! - loads environment configuration
//! - runs the selected workflow
//! - prints reports/plots
//! - writes optional exports

use std::path::{Path, PathBuf};

use clap::Parser;
use log::{info, warn};

use crate::cli::{Cli, Command, FitArgs, MapArgs, OdeArgs, PresetArgs, VerifyArgs};
use crate::config::EnvConfig;
use crate::domain::{FitConfig, MapConfig, MmsCase, OdeConfig, VerifyConfig, ViewPreset};
use crate::error::AppError;
use crate::io::{OutputTable, OUTPUT_FILE};
use crate::mapping::{run_variants, ProcessRunner, SweepOutcome};
use crate::mms::{problem_for, run_study, ConvergenceStudy};
use crate::ode::{run_coalescence, CoalescenceRun};
use crate::plot::{render_plot, render_stacked, PlotOptions, Series, SeriesStyle, MARKERS};

pub mod pipeline;

/// Residuals listed in the fit summary.
const WORST_RESIDUALS: usize = 5;

/// Entry point for the `fuelcheck` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose, cli.quiet)?;
    let env = EnvConfig::load();

    match cli.command {
        Command::Verify(args) => handle_verify(&verify_config_from_args(&args)),
        Command::Fit(args) => handle_fit(&fit_config_from_args(&args)),
        Command::Ode(args) => handle_ode(&ode_config_from_args(&args)),
        Command::Map(args) => handle_map(&map_config_from_args(&args, &env)),
        Command::View(args) => crate::tui::run(&output_path(&args.path)),
        Command::Columns(args) => handle_columns(&output_path(&args.path)),
        Command::Plot(args) => handle_preset(&args),
    }
}

fn handle_verify(config: &VerifyConfig) -> Result<(), AppError> {
    let studies = config
        .cases
        .iter()
        .map(|&case| {
            info!("verifying {case:?}");
            run_study(problem_for(case).as_ref(), config.t0, config.t1, config.steps, config.levels)
        })
        .collect::<Result<Vec<_>, _>>()?;

    println!("{}", crate::report::format_convergence(&studies));

    if config.plot {
        for study in &studies {
            println!("{}", verify_plot(study, config.plot_width, config.plot_height));
        }
    }

    if let Some(path) = &config.export_csv {
        crate::io::write_study_csv(path, &studies)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::write_json(path, &studies)?;
    }
    Ok(())
}

/// Finest-grid solution over the closed-form reference.
fn verify_plot(study: &ConvergenceStudy, width: usize, height: usize) -> String {
    let Some(level) = study.levels.last() else {
        return String::new();
    };
    let times = &level.trajectory.times;
    let series = [
        Series::from_columns("reference", times, &level.reference, MARKERS[1], SeriesStyle::Line),
        Series::from_columns(
            format!("numerical (N={})", level.steps),
            times,
            &level.trajectory.values,
            MARKERS[0],
            SeriesStyle::Points,
        ),
    ];
    let opts = PlotOptions::new(width, height).labels("t", format!("y [{}]", study.case));
    render_plot(&series, &opts)
}

fn handle_fit(config: &FitConfig) -> Result<(), AppError> {
    let Some(run) = pipeline::run_fit(config)? else {
        return Ok(());
    };

    let worst = crate::report::largest_residuals(&run.residuals, WORST_RESIDUALS);
    println!("{}", crate::report::format_fit_summary(&run.report, &run.source, &worst));

    if config.plot {
        let series = [
            Series::from_columns("fit", &run.report.grid.x, &run.report.grid.y, MARKERS[1], SeriesStyle::Line),
            Series::from_columns("data", &run.xs, &run.ys, MARKERS[0], SeriesStyle::Points),
        ];
        let opts = PlotOptions::new(config.plot_width, config.plot_height)
            .labels("x", "y")
            .log_y(config.log_y);
        println!("{}", render_plot(&series, &opts));
    }

    if let Some(path) = &config.export_csv {
        crate::io::write_fit_csv(path, &run.report, run.data.as_ref())?;
    }
    if let Some(path) = &config.export_json {
        crate::io::write_json(path, &run.report)?;
    }
    Ok(())
}

fn handle_ode(config: &OdeConfig) -> Result<(), AppError> {
    let run = run_coalescence(config)?;
    println!("{}", crate::report::format_coalescence(&run));

    if config.plot {
        println!("{}", coalescence_plot(&run, config.plot_width, config.plot_height));
    }

    if let Some(path) = &config.export_csv {
        crate::io::write_coalescence_csv(path, &run)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::write_json(path, &run)?;
    }
    Ok(())
}

/// Density on a log axis, coverage `A * N` below it.
fn coalescence_plot(run: &CoalescenceRun, width: usize, height: usize) -> String {
    let area: Vec<f64> = run.samples.iter().map(|s| s.area).collect();
    let density: Vec<f64> = run.samples.iter().map(|s| s.density).collect();
    let coverage: Vec<f64> = run.samples.iter().map(|s| s.coverage).collect();

    let density_opts = PlotOptions::new(width, height)
        .labels("A (m2)", "N (bub/m2)")
        .log_y(true);
    let coverage_opts = PlotOptions::new(width, height).labels("A (m2)", "A*N (/)");

    let mut out = render_plot(
        &[Series::from_columns(run.model.display_name(), &area, &density, MARKERS[0], SeriesStyle::Line)],
        &density_opts,
    );
    out.push('\n');
    out.push_str(&render_plot(
        &[Series::from_columns("coverage", &area, &coverage, MARKERS[1], SeriesStyle::Line)],
        &coverage_opts,
    ));
    out
}

fn handle_map(config: &MapConfig) -> Result<(), AppError> {
    let mut runner = ProcessRunner::new(&config.solver)?;
    info!(
        "mapping '{}' = {} with {} in '{}'",
        config.variable,
        config.target,
        runner.executable().display(),
        config.workdir.display()
    );

    let outcomes = run_variants(&mut runner, config)?;
    println!("{}", crate::report::format_sweeps(&outcomes, &config.variable, config.target));

    if config.plot {
        println!("{}", map_plot(&outcomes, config));
    }

    if let Some(path) = &config.export_csv {
        crate::io::write_sweep_csv(path, &outcomes)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::write_mapping_json(path, config, &outcomes)?;
    }
    Ok(())
}

/// Threshold temperature vs burnup, one marker per variant.
fn map_plot(outcomes: &[SweepOutcome], config: &MapConfig) -> String {
    let series: Vec<Series> = outcomes
        .iter()
        .enumerate()
        .map(|(i, o)| {
            let points = o.points.iter().map(|p| (p.burnup, p.temperature)).collect();
            Series::points(o.label.clone(), points, MARKERS[i % MARKERS.len()])
        })
        .collect();
    let opts = PlotOptions::new(config.plot_width, config.plot_height)
        .labels(config.burnup_column.clone(), config.temperature_column.clone());
    render_plot(&series, &opts)
}

fn handle_columns(path: &Path) -> Result<(), AppError> {
    let Some(table) = OutputTable::read_optional(path)? else {
        return Ok(());
    };
    println!("{}", crate::report::format_columns(&table));
    Ok(())
}

fn handle_preset(args: &PresetArgs) -> Result<(), AppError> {
    let path = output_path(&args.path);
    let Some(table) = OutputTable::read_optional(&path)? else {
        return Ok(());
    };

    let (x_label, y_labels) = preset_columns(args.preset);
    let x = table.column(x_label)?;

    let mut panels = Vec::with_capacity(y_labels.len());
    for &label in y_labels {
        if !table.headers().iter().any(|h| h == label) {
            warn!("Column '{label}' not found in '{}'; skipping.", path.display());
            continue;
        }
        panels.push((label.to_string(), table.column(label)?));
    }
    if panels.is_empty() {
        warn!("No {:?} columns found in '{}'.", args.preset, path.display());
        return Ok(());
    }

    println!("{}", render_stacked(x_label, &x, &panels, args.width, args.height));
    Ok(())
}

const HISTORY_COLUMNS: &[&str] = &["Temperature (K)", "Fission rate (fiss / m3 s)", "Hydrostatic stress (MPa)"];

const FISSION_GAS_COLUMNS: &[&str] = &[
    "Xe produced (at/m3)",
    "Xe in grain (at/m3)",
    "Xe in intragranular solution (at/m3)",
    "Xe in intragranular bubbles (at/m3)",
    "Xe at grain boundary (at/m3)",
    "Xe released (at/m3)",
];

const INTERGRANULAR_COLUMNS: &[&str] = &[
    "Intergranular bubble concentration (bub/m2)",
    "Intergranular atoms per bubble (at/bub)",
    "Intergranular vacancies per bubble (vac/bub)",
    "Intergranular fractional coverage (/)",
    "Intergranular fractional intactness (/)",
    "Intergranular vented fraction (/)",
    "Intergranular venting probability (/)",
    "Intergranular gas swelling (/)",
];

/// Fixed column groups: `(x column, y columns)`.
pub fn preset_columns(preset: ViewPreset) -> (&'static str, &'static [&'static str]) {
    match preset {
        ViewPreset::History => ("Time (h)", HISTORY_COLUMNS),
        ViewPreset::FissionGas => ("Temperature (K)", FISSION_GAS_COLUMNS),
        ViewPreset::Intergranular => ("Temperature (K)", INTERGRANULAR_COLUMNS),
    }
}

/// A directory argument means `output.txt` inside it.
pub fn output_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(OUTPUT_FILE)
    } else {
        path.to_path_buf()
    }
}

pub fn verify_config_from_args(args: &VerifyArgs) -> VerifyConfig {
    VerifyConfig {
        cases: if args.case.is_empty() {
            MmsCase::ALL.to_vec()
        } else {
            args.case.clone()
        },
        t0: args.t0,
        t1: args.t1,
        steps: args.steps,
        levels: args.levels,
        plot: args.plot.enabled(),
        plot_width: args.plot.width,
        plot_height: args.plot.height,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
    }
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        model: args.model,
        input: args.input.clone(),
        x_shift: args.x_shift,
        max_iters: args.max_iters,
        tolerance: args.tolerance,
        plot: args.plot.enabled(),
        plot_width: args.plot.width,
        plot_height: args.plot.height,
        log_y: args.log_y,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
    }
}

pub fn ode_config_from_args(args: &OdeArgs) -> OdeConfig {
    OdeConfig {
        model: args.model,
        n0: args.n0,
        a_end: args.a_end,
        n_lim: args.n_lim,
        samples: args.samples,
        rtol: args.rtol,
        atol: args.atol,
        max_steps: args.max_steps,
        plot: args.plot.enabled(),
        plot_width: args.plot.width,
        plot_height: args.plot.height,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
    }
}

pub fn map_config_from_args(args: &MapArgs, env: &EnvConfig) -> MapConfig {
    let workdir = env.resolve_workdir(args.workdir.clone());
    let solver = env.resolve_solver(args.solver.clone(), &workdir);
    MapConfig {
        solver,
        workdir,
        time_start: args.time_start,
        time_end: args.time_end,
        temperature_start: args.t_start,
        temperature_end: args.t_end,
        temperature_step: args.t_step,
        fission_rate: args.fission_rate,
        hydrostatic_stress: args.stress,
        variable: args.variable.clone(),
        target: args.target,
        tolerance: args.tolerance,
        flag: args.flag.clone(),
        flag_values: args.values.clone(),
        temperature_column: args.temperature_column.clone(),
        burnup_column: args.burnup_column.clone(),
        plot: args.plot.enabled(),
        plot_width: args.plot.width,
        plot_height: args.plot.height,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
    }
}
