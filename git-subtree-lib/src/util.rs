//! Utility types shared across the engine and the driver commands.

use std::error::Error;
use std::fmt::Display;

/// Represents the code to exit the process with.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct ExitCode(pub isize);

impl ExitCode {
    /// `0` success.
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// `1` runtime failure (includes "no new revisions" and assertion failure).
    pub const RUNTIME_FAILURE: ExitCode = ExitCode(1);

    /// `126` environment misconfiguration (host version-control system not
    /// discoverable).
    pub const ENVIRONMENT: ExitCode = ExitCode(126);

    /// Determine whether or not this exit code represents a successful
    /// termination.
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode(0))
    }

    /// Convert the exit code into an `i32`, or use the default failure exit
    /// code if conversion fails.
    pub fn into_i32_or_default(self) -> i32 {
        let Self(exit_code) = self;
        exit_code.try_into().unwrap_or(1)
    }
}

impl Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self(exit_code) = self;
        write!(f, "exit code {exit_code}")
    }
}

impl Error for ExitCode {}

/// Helper type to wrap situations where we might return any normal error
/// (wrapped by `eyre::Result`) or an `ExitCode`.
pub type EyreExitOr<T> = eyre::Result<Result<T, ExitCode>>;
