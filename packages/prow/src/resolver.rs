//! Enumerating the builds stored under a job.

use prow_core::{Build, Job, parse_build_id};
use storage::BlobStore;

use crate::{Prow, ProwError};

impl<S: BlobStore> Prow<S> {
    /// All builds under the job's prefix, in ascending build id order.
    ///
    /// Children whose last segment is not a non-negative integer (stray files
    /// such as `latest-build.txt`) are skipped. Listing failures propagate.
    pub fn builds(&self, job: &Job) -> Result<Vec<Build>, ProwError> {
        let children = self
            .store
            .list_direct_children(job.bucket(), job.storage_path())?;

        let mut ids: Vec<u64> = children
            .iter()
            .filter_map(|child| {
                let id = parse_build_id(child);
                if id.is_none() {
                    tracing::debug!(job = job.name(), child = child.as_str(), "skipping non-build child");
                }
                id
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();

        Ok(ids.into_iter().map(|id| job.new_build(id)).collect())
    }

    /// Build number stored in the job's `latest-build.txt`.
    pub fn latest_build_number(&self, job: &Job) -> Result<u64, ProwError> {
        let path = job.latest_build_path();
        let contents = self.store.read_bytes(job.bucket(), &path)?;
        parse_latest_build(&path, &contents)
    }
}

fn parse_latest_build(path: &str, contents: &[u8]) -> Result<u64, ProwError> {
    let invalid = || ProwError::LatestBuild {
        path: path.to_string(),
        value: String::from_utf8_lossy(contents).into_owned(),
    };
    let text = std::str::from_utf8(contents).map_err(|_| invalid())?;
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.parse().map_err(|_| invalid())
}
