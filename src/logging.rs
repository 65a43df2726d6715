//! Terminal logging.
//!
//! Library code only uses the `log` macros; the binary installs a
//! `simplelog::TermLogger` on stderr so reports on stdout stay clean.
//!
//! Verbosity:
//! - `-q`: errors only
//! - default: warnings (missing files, thresholds not found)
//! - `-v`: progress, `-vv`: debug, `-vvv`: trace

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use crate::error::AppError;

pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init(verbose: u8, quiet: bool) -> Result<(), AppError> {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();

    TermLogger::init(level_for(verbose, quiet), config, TerminalMode::Stderr, ColorChoice::Auto)
        .map_err(|e| AppError::numeric(format!("Failed to initialize logging: {e}")))
}
