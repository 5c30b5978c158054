//! Error types for building and running applications.

use std::process::ExitCode;
use thiserror::Error;

/// Exit code for failures raised by hooks or actions.
pub const UNCAUGHT_ERROR_CODE: i32 = 2;

/// Error returned when an application cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// Two siblings share a primary name.
    #[error("duplicate command: {0}")]
    DuplicateCommand(String),
    /// A non-root command has an empty name.
    #[error("unnamed command under '{0}'")]
    UnnamedCommand(String),
}

/// Error that ended a run before a command produced an exit code.
#[derive(Debug, Error)]
pub enum AppError {
    /// clap rejected the arguments, or handled `--help`/`--version`.
    #[error(transparent)]
    Parse(#[from] clap::Error),
    /// A hook or action failed.
    #[error(transparent)]
    Command(#[from] anyhow::Error),
}

impl AppError {
    /// The process exit code this error maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Parse(err) => err.exit_code(),
            AppError::Command(_) => UNCAUGHT_ERROR_CODE,
        }
    }
}

/// Converts a run's integer result into a process exit code.
///
/// Codes outside `0..=255` wrap the way POSIX shells report them, so the
/// no-action sentinel `-1` exits with 255.
pub fn to_exit_code(code: i32) -> ExitCode {
    ExitCode::from(exit_status(code))
}

/// The 8-bit status a shell observes for `code`.
pub fn exit_status(code: i32) -> u8 {
    code.rem_euclid(256) as u8
}
