//! Backend selection for the blob store.

use std::path::PathBuf;

use crate::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Gcs,
    S3,
    Filesystem,
    Memory,
}

impl StorageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKind::Gcs => "gcs",
            StorageKind::S3 => "s3",
            StorageKind::Filesystem => "filesystem",
            StorageKind::Memory => "memory",
        }
    }
}

/// Credentials for Google Cloud Storage.
#[derive(Debug, Clone, Default)]
pub struct GcsConfig {
    /// Service account key file. When unset, credentials are taken from the
    /// ambient environment (`GOOGLE_*` variables, metadata server).
    pub service_account_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub region: String,
    pub endpoint: Option<String>,
    pub allow_http: bool,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub virtual_hosted_style: bool,
}

#[derive(Debug, Clone)]
pub enum StorageBackendConfig {
    Gcs(GcsConfig),
    S3(S3Config),
    /// Buckets are directories under `root`.
    Filesystem { root: PathBuf },
    /// Buckets are key prefixes in one in-memory store.
    Memory,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackendConfig,
}

impl StorageConfig {
    pub fn memory() -> Self {
        Self {
            backend: StorageBackendConfig::Memory,
        }
    }

    pub fn filesystem(root: impl Into<PathBuf>) -> Self {
        Self {
            backend: StorageBackendConfig::Filesystem { root: root.into() },
        }
    }

    pub fn gcs(cfg: GcsConfig) -> Self {
        Self {
            backend: StorageBackendConfig::Gcs(cfg),
        }
    }

    /// GCS authenticated with a service account key file.
    pub fn gcs_service_account(path: impl Into<PathBuf>) -> Self {
        Self::gcs(GcsConfig {
            service_account_path: Some(path.into()),
        })
    }

    pub fn s3(cfg: S3Config) -> Self {
        Self {
            backend: StorageBackendConfig::S3(cfg),
        }
    }

    pub fn kind(&self) -> StorageKind {
        match self.backend {
            StorageBackendConfig::Gcs(_) => StorageKind::Gcs,
            StorageBackendConfig::S3(_) => StorageKind::S3,
            StorageBackendConfig::Filesystem { .. } => StorageKind::Filesystem,
            StorageBackendConfig::Memory => StorageKind::Memory,
        }
    }

    /// Build a config from environment variables.
    ///
    /// Selection rules:
    /// - If `STORAGE_BACKEND` is set: use it (`gcs`, `s3`, `filesystem`, `memory`)
    /// - Otherwise: default to `gcs`, where the CI system writes its logs
    ///
    /// GCS env vars:
    /// - `GOOGLE_APPLICATION_CREDENTIALS` (optional service account key file)
    ///
    /// S3 env vars (S3-compatible):
    /// - `AWS_REGION` (default: `us-east-1`)
    /// - `S3_ENDPOINT` (optional, e.g. `http://localhost:9000`)
    /// - `S3_ALLOW_HTTP` (`true`/`false`, default: auto true if endpoint is http://)
    /// - `S3_VIRTUAL_HOSTED_STYLE` (`true`/`false`, default: false)
    /// - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN` (optional)
    ///
    /// Filesystem env vars:
    /// - `STORAGE_FS_ROOT` (default: `./data/object_store`)
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`StorageConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StorageError> {
        let var = |name: &str| lookup(name).and_then(non_empty);

        match var("STORAGE_BACKEND").as_deref() {
            Some("gcs") | Some("gcp") | None => Ok(Self::gcs(GcsConfig {
                service_account_path: var("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
            })),
            Some("s3") => Ok(Self::s3(read_s3_config(&var)?)),
            Some("filesystem") | Some("fs") => {
                let root = var("STORAGE_FS_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./data/object_store"));
                Ok(Self::filesystem(root))
            }
            Some("memory") | Some("mem") => Ok(Self::memory()),
            Some(other) => Err(StorageError::InvalidConfig(format!(
                "unsupported STORAGE_BACKEND={other} (expected gcs|s3|filesystem|memory)"
            ))),
        }
    }
}

pub(crate) fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_bool_var(
    var: &impl Fn(&str) -> Option<String>,
    var_name: &str,
) -> Result<Option<bool>, StorageError> {
    let Some(v) = var(var_name) else {
        return Ok(None);
    };

    parse_bool(&v)
        .map(Some)
        .ok_or_else(|| {
            StorageError::InvalidConfig(format!(
                "invalid boolean for {var_name}={v} (expected true/false)"
            ))
        })
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn read_s3_config(var: &impl Fn(&str) -> Option<String>) -> Result<S3Config, StorageError> {
    let region = var("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string());

    let endpoint = var("S3_ENDPOINT");
    let allow_http = match parse_bool_var(var, "S3_ALLOW_HTTP")? {
        Some(v) => v,
        None => endpoint
            .as_deref()
            .is_some_and(|e| e.trim_start().to_ascii_lowercase().starts_with("http://")),
    };

    let virtual_hosted_style = parse_bool_var(var, "S3_VIRTUAL_HOSTED_STYLE")?.unwrap_or(false);

    Ok(S3Config {
        region,
        endpoint,
        allow_http,
        access_key_id: var("AWS_ACCESS_KEY_ID"),
        secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
        session_token: var("AWS_SESSION_TOKEN"),
        virtual_hosted_style,
    })
}
