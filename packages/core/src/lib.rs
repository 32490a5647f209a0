//! Core domain types for the CI build-log layout.
//!
//! This crate contains the pure, I/O-free part of the system:
//! - Job and JobType, and the rules deriving a job's storage prefix
//! - Build and the paths of its well-known objects
//! - Started and Finished marker records
//! - Configuration and the configuration-error reporting strategy

mod build;
mod config;
mod error;
mod job;
mod metadata;
pub mod paths;

pub use build::{Build, parse_build_id};
pub use config::{DEFAULT_BUCKET, DEFAULT_ORG, ProwConfig, local_artifacts_dir};
pub use error::{ConfigError, ConfigErrorReporter, ExitOnConfigError, LogConfigError};
pub use job::{Job, JobFactory, JobType};
pub use metadata::{BuildResult, Finished, Metadata, Started};

/// Timestamp reported for a build whose marker could not be read.
///
/// Never a legitimate build time.
pub const UNKNOWN_TIMESTAMP: i64 = -1;
