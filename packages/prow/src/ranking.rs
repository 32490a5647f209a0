//! Ordering finished builds by start time.
//!
//! Directory timestamps in the bucket are not usable, so recency comes from
//! each build's `started.json`, which may be missing or unreadable.

use std::cmp::Ordering;

use prow_core::{Build, Job};
use storage::BlobStore;

use crate::{Prow, ProwError};

impl<S: BlobStore> Prow<S> {
    /// Builds of the job that have a `finished.json`, passed or not.
    pub fn finished_builds(&self, job: &Job) -> Result<Vec<Build>, ProwError> {
        let builds = self.builds(job)?;
        Ok(builds
            .into_iter()
            .filter(|build| self.is_finished(build))
            .collect())
    }

    /// Up to `count` finished builds, most recently started first.
    ///
    /// Builds whose start time cannot be read go after every build with a
    /// known start time, keeping ascending build id order among themselves.
    pub fn latest_builds(&self, job: &Job, count: usize) -> Result<Vec<Build>, ProwError> {
        let timed = self
            .finished_builds(job)?
            .into_iter()
            .map(|build| {
                let started = self
                    .started_time(&build)
                    .inspect_err(|err| {
                        tracing::warn!(build = %build, error = %err, "start time unknown");
                    })
                    .ok();
                (build, started)
            })
            .collect();
        Ok(rank_latest(timed, count))
    }
}

/// Sort newest-first and keep `count`.
///
/// Equal start times fall back to the higher build id first.
fn rank_latest(mut builds: Vec<(Build, Option<i64>)>, count: usize) -> Vec<Build> {
    builds.sort_by(|(left, left_started), (right, right_started)| {
        match (left_started, right_started) {
            (Some(l), Some(r)) => r
                .cmp(l)
                .then_with(|| right.build_id().cmp(&left.build_id())),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    builds.truncate(count);
    builds.into_iter().map(|(build, _)| build).collect()
}
