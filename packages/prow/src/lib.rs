//! Build discovery over the CI blob-store layout.
//!
//! [`Prow`] wraps a [`BlobStore`] and answers:
//! - which builds exist for a job, and the latest build number
//! - whether a build started or finished, and when
//! - which finished builds are the most recent
//! - which lines of a build log match a caller-supplied check
//!
//! # Usage
//!
//! ```ignore
//! use prow::{Prow, prow_core::{Job, JobType, ProwConfig}};
//! use storage::{Storage, StorageConfig};
//!
//! let storage = Storage::connect(StorageConfig::gcs_service_account("sa.json"))?;
//! let prow = Prow::new(storage);
//! let job = Job::new(&ProwConfig::default(), "ci-knative-serving-continuous", JobType::Periodic, None, 0)?;
//! for build in prow.latest_builds(&job, 5)? {
//!     let errors = prow.parse_log(&build, |words| {
//!         (words.first() == Some(&"ERROR")).then(|| words.join(" "))
//!     })?;
//! }
//! ```

mod error;
mod ranking;
mod resolver;
mod scanner;
mod status;

pub use error::{ProwError, ScanError};
pub use prow_core;
pub use storage::{BlobStore, StorageError};

/// Read-only view of CI jobs and builds in a blob store.
///
/// Holds no state besides the store; every call goes to storage.
#[derive(Debug, Clone)]
pub struct Prow<S> {
    store: S,
}

impl<S: BlobStore> Prow<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
