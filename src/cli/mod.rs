//! Command-line parsing for the fuel-performance verification toolkit.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! numerical code: each subcommand's arguments are converted into a plain
//! config struct from `crate::domain` before anything runs.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::{CoalescenceModel, FitModelKind, MmsCase, ViewPreset};
use crate::io::{OUTPUT_FILE, VENTING_FLAG};
use crate::models::DEFAULT_X_SHIFT;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "fuelcheck",
    version,
    about = "Verification and analysis toolkit for a fission-gas behavior solver"
)]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check the observed order of convergence of the solver's update rules (MMS).
    Verify(VerifyArgs),
    /// Fit an empirical correlation with Levenberg-Marquardt.
    Fit(FitArgs),
    /// Integrate a grain-boundary bubble coalescence law.
    Ode(OdeArgs),
    /// Map the temperature/burnup at which an output variable reaches a target.
    Map(MapArgs),
    /// Browse the solver output interactively.
    View(ViewArgs),
    /// List the columns of a solver output file with their positions.
    Columns(ColumnsArgs),
    /// Plot a fixed group of output columns in the terminal.
    Plot(PresetArgs),
}

/// Terminal plot options shared by the batch commands.
#[derive(Debug, Parser, Clone)]
pub struct PlotArgs {
    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

impl PlotArgs {
    pub fn enabled(&self) -> bool {
        self.plot && !self.no_plot
    }
}

#[derive(Debug, Parser, Clone)]
pub struct VerifyArgs {
    /// Case(s) to verify; all cases when omitted.
    #[arg(short, long, value_enum)]
    pub case: Vec<MmsCase>,

    /// Start of the time interval.
    #[arg(long, default_value_t = 0.0)]
    pub t0: f64,

    /// End of the time interval.
    #[arg(long, default_value_t = 1.0)]
    pub t1: f64,

    /// Steps on the coarsest grid.
    #[arg(short = 'n', long, default_value_t = 20)]
    pub steps: usize,

    /// Number of grids (each doubles the step count of the previous one).
    #[arg(long, default_value_t = 2)]
    pub levels: usize,

    #[command(flatten)]
    pub plot: PlotArgs,

    /// Export trajectories and errors to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the convergence studies to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Correlation to fit.
    #[arg(short, long, value_enum, default_value_t = FitModelKind::Cubic)]
    pub model: FitModelKind,

    /// Two-column x,y data file. The cubic model defaults to the built-in sink-strength data.
    #[arg(short = 'f', long)]
    pub input: Option<PathBuf>,

    /// Shift x0 of the shifted-exponential model.
    #[arg(long, default_value_t = DEFAULT_X_SHIFT)]
    pub x_shift: f64,

    /// Maximum Levenberg-Marquardt iterations per start.
    #[arg(long, default_value_t = 200)]
    pub max_iters: usize,

    /// Relative convergence tolerance on SSE and parameter steps.
    #[arg(long, default_value_t = 1e-12)]
    pub tolerance: f64,

    /// Logarithmic y axis in the terminal plot.
    #[arg(long)]
    pub log_y: bool,

    #[command(flatten)]
    pub plot: PlotArgs,

    /// Export data and fitted curve to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the fit report to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct OdeArgs {
    /// Coalescence law dN/dA.
    #[arg(short, long, value_enum, default_value_t = CoalescenceModel::Verdolin)]
    pub model: CoalescenceModel,

    /// Initial bubble number density N0 (bub/m2).
    #[arg(long, default_value_t = 2e13)]
    pub n0: f64,

    /// End of the projected-area span (m2).
    #[arg(long, default_value_t = 1e-11)]
    pub a_end: f64,

    /// Density floor of the limited White law (bub/m2).
    #[arg(long, default_value_t = 1e11)]
    pub n_lim: f64,

    /// Evenly spaced output samples over the span.
    #[arg(long, default_value_t = 10_000)]
    pub samples: usize,

    /// Relative tolerance.
    #[arg(long, default_value_t = 1e-3)]
    pub rtol: f64,

    /// Absolute tolerance.
    #[arg(long, default_value_t = 1e-6)]
    pub atol: f64,

    /// Maximum accepted + rejected steps.
    #[arg(long, default_value_t = 100_000)]
    pub max_steps: usize,

    #[command(flatten)]
    pub plot: PlotArgs,

    /// Export the sampled curve to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the run to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct MapArgs {
    /// Solver executable (default: $FUELCHECK_SOLVER, then sciantix.x in the working directory).
    #[arg(long)]
    pub solver: Option<PathBuf>,

    /// Working directory for input files and output.txt (default: $FUELCHECK_WORKDIR, then .).
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Start time of the irradiation history (h).
    #[arg(long, default_value_t = 0.0)]
    pub time_start: f64,

    /// End time of the irradiation history (h).
    #[arg(long, default_value_t = 30_000.0)]
    pub time_end: f64,

    /// First temperature setpoint (K).
    #[arg(long, default_value_t = 650)]
    pub t_start: i64,

    /// Temperature setpoints stop below this value (K).
    #[arg(long, default_value_t = 1800)]
    pub t_end: i64,

    /// Temperature increment between runs (K).
    #[arg(long, default_value_t = 25)]
    pub t_step: i64,

    /// Fission rate (fiss/m3 s).
    #[arg(long, default_value_t = 3e18)]
    pub fission_rate: f64,

    /// Hydrostatic stress (MPa).
    #[arg(long, default_value_t = 0.0)]
    pub stress: f64,

    /// Output column whose target value is searched.
    #[arg(long, default_value = "Intergranular fractional coverage (/)")]
    pub variable: String,

    /// Target value of the mapped variable.
    #[arg(long, default_value_t = 0.5)]
    pub target: f64,

    /// Absolute tolerance on the target (0 means exact equality).
    #[arg(long, default_value_t = 0.0)]
    pub tolerance: f64,

    /// Settings flag varied between sweeps.
    #[arg(long, default_value = VENTING_FLAG)]
    pub flag: String,

    /// Values of the flag, one sweep each.
    #[arg(long, value_delimiter = ',', default_value = "0,1,2,3")]
    pub values: Vec<i32>,

    /// Temperature column of the output file.
    #[arg(long, default_value = "Temperature (K)")]
    pub temperature_column: String,

    /// Burnup column of the output file.
    #[arg(long, default_value = "Burnup (MWd/kgUO2)")]
    pub burnup_column: String,

    #[command(flatten)]
    pub plot: PlotArgs,

    /// Export threshold points to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export sweep results and parameters to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ViewArgs {
    /// Solver output file, or a directory containing output.txt.
    #[arg(default_value = OUTPUT_FILE)]
    pub path: PathBuf,
}

#[derive(Debug, Parser, Clone)]
pub struct ColumnsArgs {
    /// Solver output file, or a directory containing output.txt.
    #[arg(default_value = OUTPUT_FILE)]
    pub path: PathBuf,
}

#[derive(Debug, Parser, Clone)]
pub struct PresetArgs {
    /// Column group to plot.
    #[arg(value_enum)]
    pub preset: ViewPreset,

    /// Solver output file, or a directory containing output.txt.
    #[arg(default_value = OUTPUT_FILE)]
    pub path: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Panel height (rows).
    #[arg(long, default_value_t = 12)]
    pub height: usize,
}
