use storage::StorageError;
use thiserror::Error;

/// Recoverable failures reading job and build data.
///
/// Callers should treat these as "unknown", not as corruption.
#[derive(Debug, Error)]
pub enum ProwError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid latest build number in {path}: {value:?}")]
    LatestBuild { path: String, value: String },
}

/// A log scan that stopped early.
///
/// `collected` holds the fragments matched before the failure; it is empty
/// when the log could not be opened.
#[derive(Debug, Error)]
#[error("failed to scan {path}: {source}")]
pub struct ScanError {
    pub path: String,
    pub collected: Vec<String>,
    #[source]
    pub source: ProwError,
}
