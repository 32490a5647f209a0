//! A single execution of a job and the paths of its objects.

use serde::Serialize;

use crate::paths::{self, ARTIFACTS_DIR, BUILD_LOG, FINISHED_JSON, STARTED_JSON};
use crate::{ConfigError, Job};

/// One build stored under `<job prefix>/<build_id>`.
///
/// `build_id` is always the final segment of `storage_path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Build {
    job_name: String,
    build_id: u64,
    storage_path: String,
    bucket: String,
}

impl Build {
    pub(crate) fn for_job(job: &Job, build_id: u64) -> Self {
        Self {
            job_name: job.name().to_string(),
            build_id,
            storage_path: paths::join(&[job.storage_path(), build_id.to_string().as_str()]),
            bucket: job.bucket().to_string(),
        }
    }

    /// Create a build from an explicit build prefix.
    ///
    /// The id is parsed from the last segment of `storage_path`, which must be
    /// a non-negative integer.
    pub fn new(
        job_name: impl Into<String>,
        storage_path: &str,
        bucket: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let build_id = parse_build_id(storage_path)
            .ok_or_else(|| ConfigError::InvalidBuildId(storage_path.to_string()))?;
        let parent = storage_path
            .trim_end_matches([' ', '/'])
            .rsplit_once('/')
            .map(|(parent, _)| parent)
            .unwrap_or("");
        Ok(Self {
            job_name: job_name.into(),
            build_id,
            storage_path: paths::join(&[parent, build_id.to_string().as_str()]),
            bucket: bucket.into(),
        })
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn build_id(&self) -> u64 {
        self.build_id
    }

    pub fn storage_path(&self) -> &str {
        &self.storage_path
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Prefix holding the artifacts uploaded by this build.
    pub fn artifacts_dir(&self) -> String {
        self.child(ARTIFACTS_DIR)
    }

    /// Path of `build-log.txt`.
    pub fn build_log_path(&self) -> String {
        self.child(BUILD_LOG)
    }

    /// Path of `started.json`.
    pub fn started_path(&self) -> String {
        self.child(STARTED_JSON)
    }

    /// Path of `finished.json`.
    pub fn finished_path(&self) -> String {
        self.child(FINISHED_JSON)
    }

    fn child(&self, name: &str) -> String {
        paths::join(&[self.storage_path.as_str(), name])
    }
}

impl std::fmt::Display for Build {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.job_name, self.build_id)
    }
}

/// Build id encoded in the last segment of a listed path.
///
/// Returns `None` for anything that is not a decimal non-negative integer,
/// including `-1` and `+1`, so stray objects under a job prefix are skipped.
pub fn parse_build_id(path: &str) -> Option<u64> {
    let segment = paths::last_segment(path);
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JobType, ProwConfig};

    #[test]
    fn parse_build_id_accepts_only_digits() {
        assert_eq!(parse_build_id("logs/ci-x/3/"), Some(3));
        assert_eq!(parse_build_id("logs/ci-x/07"), Some(7));
        assert_eq!(parse_build_id("10"), Some(10));
        assert_eq!(parse_build_id("logs/ci-x/abc/"), None);
        assert_eq!(parse_build_id("logs/ci-x/-1/"), None);
        assert_eq!(parse_build_id("+1"), None);
        assert_eq!(parse_build_id("logs/ci-x/latest-build.txt"), None);
        assert_eq!(parse_build_id(""), None);
        assert_eq!(parse_build_id("99999999999999999999999"), None);
    }

    #[test]
    fn new_build_round_trips_id_for_every_job_type() {
        let config = ProwConfig::default();
        for job_type in [JobType::Presubmit, JobType::Postsubmit, JobType::Periodic, JobType::Batch] {
            let job = Job::new(&config, "some-job", job_type, Some("serving"), 12).unwrap();
            for id in [0, 7, 1_234_567_890_123] {
                let build = job.new_build(id);
                assert_eq!(build.build_id(), id);
                assert!(build.storage_path().ends_with(&format!("/{id}")));
                assert_eq!(build.storage_path(), format!("{}/{id}", job.storage_path()));
                assert_eq!(build.job_name(), "some-job");
                assert_eq!(build.bucket(), config.bucket);
            }
        }
    }

    #[test]
    fn object_paths_hang_off_build_prefix() {
        let job = Job::new(&ProwConfig::default(), "ci-x", JobType::Periodic, None, 0).unwrap();
        let build = job.new_build(42);
        assert_eq!(build.artifacts_dir(), "logs/ci-x/42/artifacts");
        assert_eq!(build.build_log_path(), "logs/ci-x/42/build-log.txt");
        assert_eq!(build.started_path(), "logs/ci-x/42/started.json");
        assert_eq!(build.finished_path(), "logs/ci-x/42/finished.json");
    }

    #[test]
    fn build_from_explicit_path_normalizes_id() {
        let build = Build::new("ci-x", "logs/ci-x/007/", "knative-prow").unwrap();
        assert_eq!(build.build_id(), 7);
        assert_eq!(build.storage_path(), "logs/ci-x/7");

        let err = Build::new("ci-x", "logs/ci-x/latest", "knative-prow").unwrap_err();
        assert_eq!(err, ConfigError::InvalidBuildId("logs/ci-x/latest".to_string()));
    }
}
