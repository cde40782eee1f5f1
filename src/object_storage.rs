//! The storage collaborator. The relay only ever reads, writes and deletes whole objects, so that
//! is all the [`ObjectStorage`] seam exposes. [`BucketStores`] implements it on top of
//! `object_store`, holding one store per bucket.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{
    aws::{AmazonS3, AmazonS3Builder},
    local::LocalFileSystem,
    path::Path,
    ObjectStore, RetryConfig,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    env::EnvConfig,
    error::{TransferError, TransferOperation},
};

/// Parsing a key yielded a different path, e.g. with its leading delimiter stripped.
#[derive(Debug, Error)]
#[error("key {0:?} has no exact object store path")]
pub struct UnrepresentableKey(pub String);

/// Keys come from notifications and must address exactly that object. `Path::from` would escape
/// characters and drop empty segments, silently pointing at another object.
fn object_path(key: &str) -> object_store::Result<Path> {
    let path = Path::parse(key).map_err(|source| object_store::Error::InvalidPath { source })?;

    let parsed: &str = path.as_ref();
    if parsed != key {
        return Err(object_store::Error::Generic {
            store: "BucketStores",
            source: Box::new(UnrepresentableKey(key.to_string())),
        });
    }

    Ok(path)
}

/// Whole-object reads, writes and deletes, addressed by bucket and key.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn read_object(&self, bucket: &str, key: &str) -> Result<Bytes, TransferError>;
    async fn write_object(&self, bucket: &str, key: &str, bytes: Bytes)
        -> Result<(), TransferError>;
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), TransferError>;
}

/// Where the stores for each bucket live.
#[derive(Clone, Debug)]
pub enum StoreBackend {
    /// Buckets on S3, or an S3 compatible endpoint when one is given.
    S3 { endpoint: Option<String> },
    /// Buckets as directories under `root`.
    LocalFileSystem { root: PathBuf },
}

fn build_s3_store(bucket: &str, endpoint: Option<&str>) -> object_store::Result<AmazonS3> {
    let mut builder = AmazonS3Builder::from_env()
        .with_bucket_name(bucket)
        .with_retry(RetryConfig {
            retry_timeout: Duration::from_secs(16),
            ..RetryConfig::default()
        });

    if let Some(endpoint) = endpoint {
        builder = builder.with_endpoint(endpoint);
    }

    builder.build()
}

fn build_local_file_store(
    root: &std::path::Path,
    bucket: &str,
) -> object_store::Result<LocalFileSystem> {
    let bucket_root = root.join(bucket);
    std::fs::create_dir_all(&bucket_root).map_err(|e| object_store::Error::Generic {
        store: "LocalFileSystem",
        source: Box::new(e),
    })?;
    LocalFileSystem::new_with_prefix(bucket_root)
}

impl StoreBackend {
    pub fn from_env_config(env_config: &EnvConfig) -> Self {
        if env_config.use_local_store {
            StoreBackend::LocalFileSystem {
                root: env_config.local_store_root.clone(),
            }
        } else {
            StoreBackend::S3 {
                endpoint: env_config.aws_endpoint.clone(),
            }
        }
    }

    fn build_store(&self, bucket: &str) -> object_store::Result<Arc<dyn ObjectStore>> {
        match self {
            StoreBackend::S3 { endpoint } => {
                info!(bucket, endpoint = endpoint.as_deref(), "using S3 store");
                Ok(Arc::new(build_s3_store(bucket, endpoint.as_deref())?))
            }
            StoreBackend::LocalFileSystem { root } => {
                info!(bucket, root = %root.display(), "using local file store");
                Ok(Arc::new(build_local_file_store(root, bucket)?))
            }
        }
    }
}

/// One `ObjectStore` per bucket. Notifications may name buckets we did not configure, their
/// stores get built the first time we see them and are reused after that.
pub struct BucketStores {
    backend: StoreBackend,
    stores: RwLock<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl BucketStores {
    pub fn new(backend: StoreBackend) -> Self {
        Self {
            backend,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Use `store` for `bucket` instead of building one from the backend.
    pub fn with_store(self, bucket: &str, store: Arc<dyn ObjectStore>) -> Self {
        self.stores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(bucket.to_string(), store);
        self
    }

    /// Build the stores for the configured bucket right away so bad credentials or endpoints
    /// fail at startup.
    pub fn from_env_config(env_config: &EnvConfig) -> object_store::Result<Self> {
        let bucket_stores = Self::new(StoreBackend::from_env_config(env_config));
        bucket_stores.store(&env_config.bucket_name)?;
        Ok(bucket_stores)
    }

    fn store(&self, bucket: &str) -> object_store::Result<Arc<dyn ObjectStore>> {
        if let Some(store) = self
            .stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(bucket)
        {
            return Ok(store.clone());
        }

        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }
        let store = self.backend.build_store(bucket)?;
        stores.insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

fn transfer_error<'a>(
    operation: TransferOperation,
    bucket: &'a str,
    key: &'a str,
) -> impl Fn(object_store::Error) -> TransferError + Copy + 'a {
    move |e| TransferError::new(operation, bucket, key, e)
}

#[async_trait]
impl ObjectStorage for BucketStores {
    async fn read_object(&self, bucket: &str, key: &str) -> Result<Bytes, TransferError> {
        let to_transfer_error = transfer_error(TransferOperation::Read, bucket, key);
        let path = object_path(key).map_err(to_transfer_error)?;
        let store = self.store(bucket).map_err(to_transfer_error)?;

        let bytes = store
            .get(&path)
            .await
            .map_err(to_transfer_error)?
            .bytes()
            .await
            .map_err(to_transfer_error)?;

        debug!(bucket, key, size = bytes.len(), "read object");
        Ok(bytes)
    }

    async fn write_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
    ) -> Result<(), TransferError> {
        let to_transfer_error = transfer_error(TransferOperation::Write, bucket, key);
        let path = object_path(key).map_err(to_transfer_error)?;
        let store = self.store(bucket).map_err(to_transfer_error)?;

        let size = bytes.len();
        store
            .put(&path, bytes)
            .await
            .map_err(to_transfer_error)?;

        debug!(bucket, key, size, "wrote object");
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), TransferError> {
        let to_transfer_error = transfer_error(TransferOperation::Delete, bucket, key);
        let path = object_path(key).map_err(to_transfer_error)?;
        let store = self.store(bucket).map_err(to_transfer_error)?;

        store
            .delete(&path)
            .await
            .map_err(to_transfer_error)?;

        debug!(bucket, key, "deleted object");
        Ok(())
    }
}
