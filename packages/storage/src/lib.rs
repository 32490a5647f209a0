//! Read access to the blob store holding CI job and build data.
//!
//! [`BlobStore`] is the synchronous seam the build-discovery code is written
//! against. [`Storage`] implements it on top of `object_store`, which already
//! provides GCS, S3, local filesystem, and in-memory backends.
//!
//! Every call blocks until the backend answers. Do not use [`Storage`] from
//! inside an async runtime.

mod config;
mod reader;
mod store;

use std::io::Read;

use bytes::Bytes;

pub use config::{GcsConfig, S3Config, StorageBackendConfig, StorageConfig, StorageKind};
pub use reader::BlobReader;
pub use store::Storage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage config: {0}")]
    InvalidConfig(String),

    #[error("object not found: {bucket}/{path}")]
    NotFound { bucket: String, path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object_store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Blob-store operations needed to discover builds and read their data.
///
/// Paths are keys relative to `bucket`, without a leading slash.
pub trait BlobStore {
    /// Streaming reader over one object; released when dropped.
    type Reader: Read;

    /// Whether an object exists at `path`.
    fn exists(&self, bucket: &str, path: &str) -> Result<bool, StorageError>;

    /// Whole contents of a small object.
    fn read_bytes(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError>;

    /// Immediate children of `prefix`, both objects and sub-prefixes, as paths
    /// relative to the bucket. Order is unspecified.
    fn list_direct_children(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Open a streaming reader over the object at `path`.
    fn open_reader(&self, bucket: &str, path: &str) -> Result<Self::Reader, StorageError>;
}

impl<T: BlobStore + ?Sized> BlobStore for &T {
    type Reader = T::Reader;

    fn exists(&self, bucket: &str, path: &str) -> Result<bool, StorageError> {
        (**self).exists(bucket, path)
    }

    fn read_bytes(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError> {
        (**self).read_bytes(bucket, path)
    }

    fn list_direct_children(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        (**self).list_direct_children(bucket, prefix)
    }

    fn open_reader(&self, bucket: &str, path: &str) -> Result<Self::Reader, StorageError> {
        (**self).open_reader(bucket, path)
    }
}
