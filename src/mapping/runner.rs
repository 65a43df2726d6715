//! Solver subprocess execution.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::error::AppError;

/// Default solver executable name inside the working directory.
pub const SOLVER_EXECUTABLE: &str = "sciantix.x";

/// Runs the solver once in a working directory.
///
/// The solver takes no arguments: it reads the input files from, and writes
/// `output.txt` into, its working directory.
pub trait SolverRunner {
    fn run(&mut self, workdir: &Path) -> Result<(), AppError>;
}

/// Spawns the solver executable and blocks until it exits.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    executable: PathBuf,
}

impl ProcessRunner {
    /// Relative paths are resolved against the current directory, since the
    /// child runs with a different one.
    pub fn new(executable: impl Into<PathBuf>) -> Result<Self, AppError> {
        let executable = executable.into();
        let executable = if executable.is_absolute() {
            executable
        } else {
            std::env::current_dir()
                .map_err(|e| AppError::input(format!("Failed to resolve current directory: {e}")))?
                .join(executable)
        };
        if !executable.is_file() {
            return Err(AppError::input(format!(
                "Solver executable '{}' not found.",
                executable.display()
            )));
        }
        Ok(Self { executable })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl SolverRunner for ProcessRunner {
    fn run(&mut self, workdir: &Path) -> Result<(), AppError> {
        debug!("running '{}' in '{}'", self.executable.display(), workdir.display());
        let status = Command::new(&self.executable)
            .current_dir(workdir)
            .status()
            .map_err(|e| AppError::solver(format!("Failed to start '{}': {e}", self.executable.display())))?;

        if !status.success() {
            return Err(AppError::solver(format!(
                "Solver '{}' exited with {status}.",
                self.executable.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_executable_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProcessRunner::new(dir.path().join(SOLVER_EXECUTABLE)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_a_solver_error() {
        let exe = Path::new("/bin/false");
        if !exe.is_file() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let mut runner = ProcessRunner::new(exe).unwrap();
        let err = runner.run(dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }
}
