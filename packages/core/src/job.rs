//! Job identity and the rules mapping it to a storage prefix.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::paths::{self, BATCH_SEGMENT, LATEST_BUILD, LOGS_ROOT, PR_LOGS_ROOT};
use crate::{Build, ConfigError, ConfigErrorReporter, ProwConfig};

/// How a job is triggered, which decides where its builds are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    /// Runs on unmerged pull requests.
    Presubmit,
    /// Runs on each new commit.
    Postsubmit,
    /// Runs on a schedule, unrelated to git changes.
    Periodic,
    /// Tests multiple unmerged pull requests at the same time.
    Batch,
}

impl JobType {
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::Presubmit => "presubmit",
            JobType::Postsubmit => "postsubmit",
            JobType::Periodic => "periodic",
            JobType::Batch => "batch",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "presubmit" => Ok(JobType::Presubmit),
            "postsubmit" => Ok(JobType::Postsubmit),
            "periodic" => Ok(JobType::Periodic),
            "batch" => Ok(JobType::Batch),
            other => Err(ConfigError::UnknownJobType(other.to_string())),
        }
    }
}

/// A named, typed CI job and the prefix its builds live under.
///
/// Fields are fixed at construction; `storage_path` is derived from
/// `(job_type, name, repo, pull_id)` and never set directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    name: String,
    job_type: JobType,
    bucket: String,
    repo: Option<String>,
    pull_id: Option<u64>,
    storage_path: String,
}

impl Job {
    /// Create a job, deriving its storage prefix.
    ///
    /// `repo` and `pull_id` are only used by presubmit jobs; presubmit
    /// without a repo is rejected.
    pub fn new(
        config: &ProwConfig,
        name: impl Into<String>,
        job_type: JobType,
        repo: Option<&str>,
        pull_id: u64,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyJobName);
        }
        let repo = repo.map(str::trim).filter(|r| !r.is_empty());

        let (storage_path, pull_id) = match job_type {
            JobType::Periodic | JobType::Postsubmit => (paths::join(&[LOGS_ROOT, name.as_str()]), None),
            JobType::Presubmit => {
                let repo = repo.ok_or_else(|| ConfigError::MissingRepo { job: name.clone() })?;
                let org_repo = format!("{}_{}", config.org, repo);
                let path = paths::join(&[
                    PR_LOGS_ROOT,
                    org_repo.as_str(),
                    pull_id.to_string().as_str(),
                    name.as_str(),
                ]);
                (path, Some(pull_id))
            }
            JobType::Batch => (paths::join(&[PR_LOGS_ROOT, BATCH_SEGMENT, name.as_str()]), None),
        };

        Ok(Self {
            name,
            job_type,
            bucket: config.bucket.clone(),
            repo: repo.map(str::to_string),
            pull_id,
            storage_path,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref()
    }

    /// Pull request number; only set for presubmit jobs.
    pub fn pull_id(&self) -> Option<u64> {
        self.pull_id
    }

    /// Prefix under which this job's builds live.
    pub fn storage_path(&self) -> &str {
        &self.storage_path
    }

    /// Path of the object holding the latest build number.
    pub fn latest_build_path(&self) -> String {
        paths::join(&[self.storage_path.as_str(), LATEST_BUILD])
    }

    /// Build of this job with the given id. No storage is touched.
    pub fn new_build(&self, build_id: u64) -> Build {
        Build::for_job(self, build_id)
    }
}

/// Creates jobs from loosely typed input, routing configuration errors
/// through an injected reporter.
#[derive(Clone)]
pub struct JobFactory {
    config: ProwConfig,
    reporter: Arc<dyn ConfigErrorReporter>,
}

impl JobFactory {
    pub fn new(config: ProwConfig, reporter: Arc<dyn ConfigErrorReporter>) -> Self {
        Self { config, reporter }
    }

    pub fn config(&self) -> &ProwConfig {
        &self.config
    }

    /// Create a job from a type name such as `"periodic"`.
    ///
    /// Unknown types and invalid identities are reported, then returned as
    /// `Err`; no job is produced for them.
    pub fn new_job(
        &self,
        name: &str,
        job_type: &str,
        repo: Option<&str>,
        pull_id: u64,
    ) -> Result<Job, ConfigError> {
        job_type
            .parse::<JobType>()
            .and_then(|job_type| Job::new(&self.config, name, job_type, repo, pull_id))
            .inspect_err(|err| self.reporter.report(err))
    }
}

impl std::fmt::Debug for JobFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::LogConfigError;

    fn cfg() -> ProwConfig {
        ProwConfig::default()
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<ConfigError>>);

    impl ConfigErrorReporter for Recording {
        fn report(&self, err: &ConfigError) {
            self.0.lock().unwrap().push(err.clone());
        }
    }

    #[test]
    fn periodic_and_postsubmit_ignore_repo_and_pull() {
        for job_type in [JobType::Periodic, JobType::Postsubmit] {
            let bare = Job::new(&cfg(), "ci-serving", job_type, None, 0).unwrap();
            let full = Job::new(&cfg(), "ci-serving", job_type, Some("serving"), 99).unwrap();
            assert_eq!(bare.storage_path(), "logs/ci-serving");
            assert_eq!(full.storage_path(), "logs/ci-serving");
            assert_eq!(full.pull_id(), None);
        }
    }

    #[test]
    fn presubmit_includes_org_repo_and_pull() {
        let job = Job::new(&cfg(), "pull-serving-unit", JobType::Presubmit, Some("serving"), 1234).unwrap();
        assert_eq!(
            job.storage_path(),
            "pr-logs/pull/knative_serving/1234/pull-serving-unit"
        );
        assert_eq!(job.pull_id(), Some(1234));

        let other = Job::new(&cfg(), "pull-serving-unit", JobType::Presubmit, Some("serving"), 1235).unwrap();
        assert_eq!(
            other.storage_path(),
            "pr-logs/pull/knative_serving/1235/pull-serving-unit"
        );
    }

    #[test]
    fn presubmit_uses_configured_org() {
        let config = cfg().with_org("acme");
        let job = Job::new(&config, "pull-x", JobType::Presubmit, Some("widgets"), 7).unwrap();
        assert_eq!(job.storage_path(), "pr-logs/pull/acme_widgets/7/pull-x");
    }

    #[test]
    fn presubmit_without_repo_is_rejected() {
        let err = Job::new(&cfg(), "pull-x", JobType::Presubmit, None, 7).unwrap_err();
        assert_eq!(err, ConfigError::MissingRepo { job: "pull-x".to_string() });
        let err = Job::new(&cfg(), "pull-x", JobType::Presubmit, Some("  "), 7).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRepo { .. }));
    }

    #[test]
    fn batch_never_includes_repo_or_pull() {
        let job = Job::new(&cfg(), "batch-unit", JobType::Batch, Some("serving"), 55).unwrap();
        assert_eq!(job.storage_path(), "pr-logs/pull/batch/batch-unit");
        assert!(!job.storage_path().contains("serving"));
        assert!(!job.storage_path().contains("55"));
    }

    #[test]
    fn repeated_separators_in_name_collapse() {
        let job = Job::new(&cfg(), "a//b", JobType::Periodic, None, 0).unwrap();
        assert_eq!(job.storage_path(), "logs/a/b");
        assert_eq!(job.new_build(4).storage_path(), "logs/a/b/4");
    }

    #[test]
    fn empty_name_is_rejected() {
        assert_eq!(
            Job::new(&cfg(), " ", JobType::Periodic, None, 0),
            Err(ConfigError::EmptyJobName)
        );
    }

    #[test]
    fn bucket_comes_from_config() {
        let job = Job::new(&cfg().with_bucket("mirror"), "ci-x", JobType::Periodic, None, 0).unwrap();
        assert_eq!(job.bucket(), "mirror");
        assert_eq!(job.latest_build_path(), "logs/ci-x/latest-build.txt");
    }

    #[test]
    fn job_type_names_round_trip() {
        for job_type in [JobType::Presubmit, JobType::Postsubmit, JobType::Periodic, JobType::Batch] {
            assert_eq!(job_type.to_string().parse::<JobType>(), Ok(job_type));
        }
        assert!("Periodic".parse::<JobType>().is_err());
    }

    #[test]
    fn factory_reports_unknown_type_and_returns_no_job() {
        let recording = Arc::new(Recording::default());
        let factory = JobFactory::new(cfg(), recording.clone());

        let result = factory.new_job("ci-x", "nightly", None, 0);

        assert_eq!(result, Err(ConfigError::UnknownJobType("nightly".to_string())));
        let reported = recording.0.lock().unwrap();
        assert_eq!(reported.as_slice(), &[ConfigError::UnknownJobType("nightly".to_string())]);
    }

    #[test]
    fn logging_reporter_leaves_the_error_to_the_caller() {
        let factory = JobFactory::new(cfg(), Arc::new(LogConfigError));
        assert!(matches!(
            factory.new_job("pull-x", "presubmit", None, 1),
            Err(ConfigError::MissingRepo { .. })
        ));
    }

    #[test]
    fn factory_builds_known_types_without_reporting() {
        let recording = Arc::new(Recording::default());
        let factory = JobFactory::new(cfg(), recording.clone());

        let job = factory.new_job("pull-x", "presubmit", Some("serving"), 3).unwrap();

        assert_eq!(job.job_type(), JobType::Presubmit);
        assert_eq!(job.storage_path(), "pr-logs/pull/knative_serving/3/pull-x");
        assert!(recording.0.lock().unwrap().is_empty());
    }
}
