//! Deployment-wide settings for locating job data.

use crate::paths::ARTIFACTS_DIR;

/// Bucket holding all builds of the knative CI.
pub const DEFAULT_BUCKET: &str = "knative-prow";
/// Organization prefixed to repo names in presubmit paths.
pub const DEFAULT_ORG: &str = "knative";

/// Where jobs live and how presubmit paths are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProwConfig {
    /// Bucket every job and build is read from.
    pub bucket: String,
    /// Organization used in `pr-logs/pull/<org>_<repo>/...`.
    pub org: String,
}

impl Default for ProwConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            org: DEFAULT_ORG.to_string(),
        }
    }
}

impl ProwConfig {
    /// Set the bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Set the organization.
    pub fn with_org(mut self, org: impl Into<String>) -> Self {
        self.org = org.into();
        self
    }

    /// Build a config from environment variables.
    ///
    /// - `PROW_BUCKET` (default: `knative-prow`)
    /// - `PROW_ORG` (default: `knative`)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`ProwConfig::from_env`], reading variables through `lookup`.
    /// Empty or whitespace-only values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bucket: non_empty(lookup("PROW_BUCKET")).unwrap_or(defaults.bucket),
            org: non_empty(lookup("PROW_ORG")).unwrap_or(defaults.org),
        }
    }
}

/// Directory where a running job writes artifacts for upload.
///
/// Reads `ARTIFACTS`, falling back to `artifacts` when unset.
pub fn local_artifacts_dir() -> String {
    artifacts_dir_from(std::env::var("ARTIFACTS").ok())
}

fn artifacts_dir_from(value: Option<String>) -> String {
    match non_empty(value) {
        Some(dir) => dir,
        None => {
            tracing::info!("Env variable ARTIFACTS not set. Using {} instead.", ARTIFACTS_DIR);
            ARTIFACTS_DIR.to_string()
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
