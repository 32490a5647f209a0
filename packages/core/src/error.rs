//! Configuration errors and the strategy that decides how fatal they are.

use thiserror::Error;

/// Errors in caller-supplied job identity.
///
/// These are programming or configuration mistakes, not runtime conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown job spec type: {0}")]
    UnknownJobType(String),
    #[error("presubmit job {job} requires a repo")]
    MissingRepo { job: String },
    #[error("job name must not be empty")]
    EmptyJobName,
    #[error("not a build path: {0}")]
    InvalidBuildId(String),
}

/// Receives configuration errors before they are returned to the caller.
///
/// Injected into [`crate::JobFactory`] so binaries can abort while tests
/// observe the error instead.
pub trait ConfigErrorReporter: Send + Sync {
    fn report(&self, err: &ConfigError);
}

/// Logs the error and terminates the process with status 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExitOnConfigError;

impl ConfigErrorReporter for ExitOnConfigError {
    fn report(&self, err: &ConfigError) {
        tracing::error!(error = %err, "fatal configuration error");
        std::process::exit(1);
    }
}

/// Logs the error and leaves handling of the returned `Err` to the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogConfigError;

impl ConfigErrorReporter for LogConfigError {
    fn report(&self, err: &ConfigError) {
        tracing::error!(error = %err, "configuration error");
    }
}
