//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - selected from the command line (`ValueEnum`)
//! - exported to JSON/CSV
//! - passed between the CLI and TUI front-ends

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which solver update rule to verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MmsCase {
    /// `y' = -k y^2`, reference `cos t · e^{-t}`.
    BinaryInteraction,
    /// `y' = a y (1 - b y)`, reference `cos t`.
    Logistic,
    /// `y' = S - L y`, reference `cos t · e^{-t}`.
    Decay,
}

impl MmsCase {
    pub const ALL: [MmsCase; 3] = [MmsCase::BinaryInteraction, MmsCase::Logistic, MmsCase::Decay];
}

/// Empirical correlation to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FitModelKind {
    /// `a + b x + c x^2 + d x^3` (inverse sink strength vs fractional coverage).
    Cubic,
    /// `a (exp(b (x - x0)) - 1)` (bubble aspect ratio).
    ShiftedExp,
}

impl FitModelKind {
    pub fn display_name(self) -> &'static str {
        match self {
            FitModelKind::Cubic => "cubic polynomial",
            FitModelKind::ShiftedExp => "shifted exponential",
        }
    }
}

/// Grain-boundary bubble coalescence law `dN/dA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CoalescenceModel {
    /// `-6 N^2 / (3 + 4 N A)` (Pastore et al. 2013).
    Pastore,
    /// `-2 N^2` (White 2004).
    White,
    /// `-2 N^2 / (1 + 2 N A)` (Veshchunov 2008).
    Veshchunov,
    /// White's law with a floor: below `N_lim` the density grows at rate `N_lim`.
    Verdolin,
}

impl CoalescenceModel {
    pub fn display_name(self) -> &'static str {
        match self {
            CoalescenceModel::Pastore => "Pastore et al. (2013)",
            CoalescenceModel::White => "White (2004)",
            CoalescenceModel::Veshchunov => "Veshchunov (2008)",
            CoalescenceModel::Verdolin => "Verdolin (limited White)",
        }
    }
}

/// Fixed column groups of the solver output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ViewPreset {
    /// Temperature, fission rate and hydrostatic stress vs time.
    History,
    /// Xenon inventories vs temperature.
    FissionGas,
    /// Intergranular bubble quantities vs temperature.
    Intergranular,
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub r_squared: f64,
    pub n: usize,
    pub iterations: usize,
}

/// A fitted correlation: parameters, uncertainties, and a plotting grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    pub model: FitModelKind,
    pub expression: String,
    pub param_names: Vec<String>,
    pub params: Vec<f64>,
    /// One-sigma standard errors (`sqrt(diag(cov))`); `NaN` when `n <= p`.
    pub std_errors: Vec<f64>,
    /// Row-major `p x p` parameter covariance.
    pub covariance: Vec<Vec<f64>>,
    pub quality: FitQuality,
    pub grid: FitGrid,
}

impl FitReport {
    /// First value of the fitted grid (the curve at the smallest x).
    pub fn initial_value(&self) -> Option<f64> {
        self.grid.y.first().copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Settings for `fuelcheck verify`.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    pub cases: Vec<MmsCase>,
    pub t0: f64,
    pub t1: f64,
    pub steps: usize,
    pub levels: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// Settings for `fuelcheck fit`.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub model: FitModelKind,
    /// Two-column `x,y` text file; `None` uses the built-in sink-strength dataset.
    pub input: Option<PathBuf>,
    /// Shift `x0` of the shifted-exponential model.
    pub x_shift: f64,
    pub max_iters: usize,
    pub tolerance: f64,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub log_y: bool,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// Settings for `fuelcheck ode`.
#[derive(Debug, Clone)]
pub struct OdeConfig {
    pub model: CoalescenceModel,
    pub n0: f64,
    pub a_end: f64,
    pub n_lim: f64,
    pub samples: usize,
    pub rtol: f64,
    pub atol: f64,
    pub max_steps: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// Settings for `fuelcheck map`.
#[derive(Debug, Clone)]
pub struct MapConfig {
    pub solver: PathBuf,
    pub workdir: PathBuf,
    pub time_start: f64,
    pub time_end: f64,
    pub temperature_start: i64,
    pub temperature_end: i64,
    pub temperature_step: i64,
    pub fission_rate: f64,
    pub hydrostatic_stress: f64,
    pub variable: String,
    pub target: f64,
    pub tolerance: f64,
    /// Settings flag varied between sweeps (one sweep per value).
    pub flag: String,
    pub flag_values: Vec<i32>,
    pub temperature_column: String,
    pub burnup_column: String,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}
