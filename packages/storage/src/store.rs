//! `object_store`-backed implementation of [`BlobStore`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use object_store::ObjectStore;
use object_store::ObjectStoreExt;
use object_store::path::Path;
use tokio::runtime::Runtime;

use crate::config::{GcsConfig, S3Config, StorageBackendConfig, StorageConfig, StorageKind};
use crate::{BlobReader, BlobStore, StorageError};

/// Authenticated handle to the blob store.
///
/// Created once with [`Storage::connect`] and cloned wherever storage access
/// is needed. Clones share the runtime and backend clients.
#[derive(Clone)]
pub struct Storage {
    kind: StorageKind,
    backend: Arc<Backend>,
    runtime: Arc<Runtime>,
}

enum Backend {
    /// One store for every bucket; keys are `<bucket>/<path>`.
    Shared(Arc<dyn ObjectStore>),
    /// One client per bucket, built on first use.
    PerBucket {
        remote: Remote,
        clients: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
    },
}

enum Remote {
    Gcs(GcsConfig),
    S3(S3Config),
}

impl Storage {
    /// Validate credentials and build the configured backend.
    ///
    /// This is the one-time authentication step; there is no teardown.
    pub fn connect(cfg: StorageConfig) -> Result<Self, StorageError> {
        let kind = cfg.kind();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let backend = match cfg.backend {
            StorageBackendConfig::Gcs(gcs) => {
                if let Some(path) = &gcs.service_account_path {
                    std::fs::metadata(path).map_err(|e| {
                        StorageError::InvalidConfig(format!(
                            "service account file {}: {e}",
                            path.display()
                        ))
                    })?;
                }
                Backend::per_bucket(Remote::Gcs(gcs))
            }
            StorageBackendConfig::S3(s3) => Backend::per_bucket(Remote::S3(s3)),
            StorageBackendConfig::Filesystem { root } => {
                std::fs::create_dir_all(&root)?;
                let fs = object_store::local::LocalFileSystem::new_with_prefix(&root)?;
                Backend::Shared(Arc::new(fs))
            }
            StorageBackendConfig::Memory => {
                Backend::Shared(Arc::new(object_store::memory::InMemory::new()))
            }
        };

        tracing::info!(backend = kind.as_str(), "connected to blob storage");
        Ok(Self {
            kind,
            backend: Arc::new(backend),
            runtime: Arc::new(runtime),
        })
    }

    /// Connect using [`StorageConfig::from_env`].
    pub fn from_env() -> Result<Self, StorageError> {
        Self::connect(StorageConfig::from_env()?)
    }

    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    pub fn kind_str(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Write an object. Used to seed local and in-memory stores.
    pub fn put_bytes(&self, bucket: &str, path: &str, bytes: Bytes) -> Result<(), StorageError> {
        let (store, location) = self.locate(bucket, path)?;
        self.runtime.block_on(async {
            store
                .put(&location, object_store::PutPayload::from(bytes))
                .await
                .map_err(|e| not_found(e, bucket, path))
        })?;
        Ok(())
    }

    fn locate(&self, bucket: &str, path: &str) -> Result<(Arc<dyn ObjectStore>, Path), StorageError> {
        let key = path.trim_matches('/');
        if bucket.trim().is_empty() {
            return Err(StorageError::InvalidConfig(
                "bucket must not be empty".to_string(),
            ));
        }
        match self.backend.as_ref() {
            Backend::Shared(store) => {
                let joined = if key.is_empty() {
                    bucket.to_string()
                } else {
                    format!("{bucket}/{key}")
                };
                Ok((store.clone(), Path::from(joined)))
            }
            Backend::PerBucket { remote, clients } => {
                let mut clients = clients.lock().unwrap_or_else(PoisonError::into_inner);
                let store = match clients.get(bucket) {
                    Some(store) => store.clone(),
                    None => {
                        let store = remote.build(bucket)?;
                        clients.insert(bucket.to_string(), store.clone());
                        store
                    }
                };
                Ok((store, Path::from(key)))
            }
        }
    }

    /// Strip the bucket segment a shared backend adds to every key.
    fn relative(&self, bucket: &str, location: &Path) -> String {
        let location = location.as_ref();
        match self.backend.as_ref() {
            Backend::Shared(_) => location
                .strip_prefix(bucket)
                .map(|rest| rest.trim_start_matches('/'))
                .unwrap_or(location)
                .to_string(),
            Backend::PerBucket { .. } => location.to_string(),
        }
    }
}

impl BlobStore for Storage {
    type Reader = BlobReader;

    fn exists(&self, bucket: &str, path: &str) -> Result<bool, StorageError> {
        tracing::debug!(bucket, path, "exists");
        let (store, location) = self.locate(bucket, path)?;
        self.runtime.block_on(async {
            match store.head(&location).await {
                Ok(_) => Ok(true),
                Err(object_store::Error::NotFound { .. }) => Ok(false),
                Err(e) => Err(StorageError::from(e)),
            }
        })
    }

    fn read_bytes(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError> {
        tracing::debug!(bucket, path, "read");
        let (store, location) = self.locate(bucket, path)?;
        self.runtime.block_on(async {
            let res = store
                .get(&location)
                .await
                .map_err(|e| not_found(e, bucket, path))?;
            let bytes = res.bytes().await?;
            Ok::<_, StorageError>(bytes)
        })
    }

    fn list_direct_children(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        tracing::debug!(bucket, prefix, "list");
        let (store, location) = self.locate(bucket, prefix)?;
        let scope = (!location.as_ref().is_empty()).then_some(&location);
        let listing = self
            .runtime
            .block_on(async { store.list_with_delimiter(scope).await })?;

        let children = listing
            .common_prefixes
            .iter()
            .chain(listing.objects.iter().map(|meta| &meta.location))
            .map(|child| self.relative(bucket, child))
            .collect();
        Ok(children)
    }

    fn open_reader(&self, bucket: &str, path: &str) -> Result<BlobReader, StorageError> {
        tracing::debug!(bucket, path, "open reader");
        let (store, location) = self.locate(bucket, path)?;
        let stream = self.runtime.block_on(async {
            store
                .get(&location)
                .await
                .map(|res| res.into_stream())
                .map_err(|e| not_found(e, bucket, path))
        })?;
        Ok(BlobReader::new(self.runtime.clone(), stream))
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Backend {
    fn per_bucket(remote: Remote) -> Self {
        Backend::PerBucket {
            remote,
            clients: Mutex::new(HashMap::new()),
        }
    }
}

impl Remote {
    fn build(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        match self {
            Remote::Gcs(cfg) => Ok(Arc::new(build_gcs(bucket, cfg)?)),
            Remote::S3(cfg) => Ok(Arc::new(build_s3(bucket, cfg)?)),
        }
    }
}

fn not_found(err: object_store::Error, bucket: &str, path: &str) -> StorageError {
    match err {
        object_store::Error::NotFound { .. } => StorageError::NotFound {
            bucket: bucket.to_string(),
            path: path.to_string(),
        },
        other => StorageError::ObjectStore(other),
    }
}

fn build_gcs(
    bucket: &str,
    cfg: &GcsConfig,
) -> Result<object_store::gcp::GoogleCloudStorage, StorageError> {
    let mut builder = object_store::gcp::GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);

    if let Some(path) = &cfg.service_account_path {
        builder = builder.with_service_account_path(path.to_string_lossy());
    }

    Ok(builder.build()?)
}

fn build_s3(bucket: &str, cfg: &S3Config) -> Result<object_store::aws::AmazonS3, StorageError> {
    let mut builder = object_store::aws::AmazonS3Builder::new()
        .with_bucket_name(bucket)
        .with_region(cfg.region.clone())
        .with_virtual_hosted_style_request(cfg.virtual_hosted_style);

    if let Some(endpoint) = &cfg.endpoint {
        builder = builder.with_endpoint(endpoint.clone());
    }
    if cfg.allow_http {
        builder = builder.with_allow_http(true);
    }
    if let Some(access_key_id) = &cfg.access_key_id {
        builder = builder.with_access_key_id(access_key_id.clone());
    }
    if let Some(secret_access_key) = &cfg.secret_access_key {
        builder = builder.with_secret_access_key(secret_access_key.clone());
    }
    if let Some(session_token) = &cfg.session_token {
        builder = builder.with_token(session_token.clone());
    }

    Ok(builder.build()?)
}
