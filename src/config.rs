//! Environment configuration.
//!
//! An optional `.env` file in the current directory is loaded first; real
//! environment variables take precedence over it, and CLI flags over both.
//!
//! - `FUELCHECK_SOLVER`: path of the solver executable
//! - `FUELCHECK_WORKDIR`: directory the solver runs in (input files, `output.txt`)

use std::path::PathBuf;

use log::debug;

use crate::mapping::SOLVER_EXECUTABLE;

pub const SOLVER_ENV: &str = "FUELCHECK_SOLVER";
pub const WORKDIR_ENV: &str = "FUELCHECK_WORKDIR";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub solver: Option<PathBuf>,
    pub workdir: Option<PathBuf>,
}

impl EnvConfig {
    /// Read `.env` (if present) and the process environment.
    pub fn load() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("loaded environment from '{}'", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);
        Self {
            solver: path(SOLVER_ENV),
            workdir: path(WORKDIR_ENV),
        }
    }

    /// Working directory: CLI flag, then environment, then `.`.
    pub fn resolve_workdir(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| self.workdir.clone()).unwrap_or_else(|| PathBuf::from("."))
    }

    /// Solver executable: CLI flag, then environment, then `sciantix.x` in the working directory.
    pub fn resolve_solver(&self, cli: Option<PathBuf>, workdir: &std::path::Path) -> PathBuf {
        cli.or_else(|| self.solver.clone())
            .unwrap_or_else(|| workdir.join(SOLVER_EXECUTABLE))
    }
}
