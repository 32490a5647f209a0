//! Build lifecycle state from the `started.json` and `finished.json` markers.

use prow_core::{Build, Finished, Started, UNKNOWN_TIMESTAMP};
use serde::de::DeserializeOwned;
use storage::BlobStore;

use crate::{Prow, ProwError};

impl<S: BlobStore> Prow<S> {
    /// Whether `started.json` exists. Storage errors count as "not started".
    pub fn is_started(&self, build: &Build) -> bool {
        self.marker_exists(build, &build.started_path())
    }

    /// Whether `finished.json` exists. Storage errors count as "not finished".
    pub fn is_finished(&self, build: &Build) -> bool {
        self.marker_exists(build, &build.finished_path())
    }

    /// Decoded `started.json`.
    pub fn started(&self, build: &Build) -> Result<Started, ProwError> {
        self.read_json(build, &build.started_path())
    }

    /// Decoded `finished.json`.
    pub fn finished(&self, build: &Build) -> Result<Finished, ProwError> {
        self.read_json(build, &build.finished_path())
    }

    /// Start time in epoch seconds, from `started.json`.
    pub fn started_time(&self, build: &Build) -> Result<i64, ProwError> {
        self.started(build).map(|started| started.timestamp)
    }

    /// Finish time in epoch seconds, from `finished.json`.
    pub fn finished_time(&self, build: &Build) -> Result<i64, ProwError> {
        self.finished(build).map(|finished| finished.timestamp)
    }

    /// Start time, or [`UNKNOWN_TIMESTAMP`] when it cannot be read.
    pub fn started_time_or_unknown(&self, build: &Build) -> i64 {
        self.started_time(build).unwrap_or(UNKNOWN_TIMESTAMP)
    }

    /// Finish time, or [`UNKNOWN_TIMESTAMP`] when it cannot be read.
    pub fn finished_time_or_unknown(&self, build: &Build) -> i64 {
        self.finished_time(build).unwrap_or(UNKNOWN_TIMESTAMP)
    }

    fn marker_exists(&self, build: &Build, path: &str) -> bool {
        match self.store.exists(build.bucket(), path) {
            Ok(exists) => exists,
            Err(err) => {
                tracing::warn!(build = %build, path, error = %err, "marker check failed");
                false
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, build: &Build, path: &str) -> Result<T, ProwError> {
        let contents = self.store.read_bytes(build.bucket(), path)?;
        serde_json::from_slice(&contents).map_err(|source| ProwError::Decode {
            path: path.to_string(),
            source,
        })
    }
}
