//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent
//! formatting and a single non-zero exit path.

use std::fmt;
use std::path::PathBuf;
use std::process;

use cubeatlas::atlas::AtlasError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// `--size` below the minimum (the atlas holds four faces per side)
    SizeTooSmall(u32),
    /// A path argument does not exist
    PathNotFound { flag: &'static str, path: PathBuf },
    /// `--out` missing for the selected mode
    MissingOutput { mode: &'static str, expects: &'static str },
    /// Single-panorama conversion failed
    Convert(AtlasError),
    /// Batch setup failed (unreadable root, uncreatable output directory)
    Batch(AtlasError),
    /// Every panorama in the batch failed
    BatchAllFailed { failed: usize },
}

impl CliError {
    /// Exit the process with an error message and a non-zero code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "failed to initialize logging: {}", msg),
            CliError::SizeTooSmall(size) => {
                write!(f, "--size {} is too small, must be at least 4", size)
            }
            CliError::PathNotFound { flag, path } => {
                write!(f, "{} argument '{}' does not exist", flag, path.display())
            }
            CliError::MissingOutput { mode, expects } => {
                write!(
                    f,
                    "when {} is specified, the {} must be specified with --out",
                    mode, expects
                )
            }
            CliError::Convert(e) => write!(f, "{}", e),
            CliError::Batch(e) => write!(f, "{}", e),
            CliError::BatchAllFailed { failed } => {
                write!(f, "all {} panoramas in the batch failed", failed)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Convert(e) | CliError::Batch(e) => Some(e),
            _ => None,
        }
    }
}
