use std::path::{Path, PathBuf};
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use tracing::info;

use statusfeed_core::config::{FingerprintBackendKind, FingerprintConfig};

use crate::error::StorageError;

/// Unified storage backend wrapping object_store.
pub enum StorageBackend {
    Gcs(BucketBackend),
    S3(BucketBackend),
    Local(LocalBackend),
    Memory(Arc<dyn ObjectStore>),
}

impl StorageBackend {
    /// Select and build the backend named by `FINGERPRINT_BACKEND`.
    pub fn from_config(cfg: &FingerprintConfig, project_id: &str) -> Result<Self, StorageError> {
        let bucket = cfg.bucket_name(project_id);
        match cfg.backend_kind()? {
            FingerprintBackendKind::Gcs => Ok(Self::Gcs(BucketBackend::gcs(&bucket)?)),
            FingerprintBackendKind::S3 => Ok(Self::S3(BucketBackend::s3(&bucket, cfg)?)),
            FingerprintBackendKind::Local => Ok(Self::Local(LocalBackend::new(&cfg.local_dir)?)),
        }
    }

    /// Volatile backend for tests and dry runs.
    pub fn memory() -> Self {
        Self::Memory(Arc::new(InMemory::new()))
    }

    /// Get an Arc-wrapped ObjectStore.
    pub fn store_arc(&self) -> Arc<dyn ObjectStore> {
        match self {
            StorageBackend::Gcs(b) | StorageBackend::S3(b) => b.store.clone(),
            StorageBackend::Local(b) => b.store.clone(),
            StorageBackend::Memory(store) => store.clone(),
        }
    }

    /// URL-ish label for logs, e.g. `gs://acme-status-hash`.
    pub fn describe(&self) -> String {
        match self {
            StorageBackend::Gcs(b) => format!("gs://{}", b.bucket),
            StorageBackend::S3(b) => format!("s3://{}", b.bucket),
            StorageBackend::Local(b) => format!("file://{}", b.data_dir.display()),
            StorageBackend::Memory(_) => "memory://".to_string(),
        }
    }
}

/// Bucket in a cloud object store (GCS or S3).
pub struct BucketBackend {
    pub store: Arc<dyn ObjectStore>,
    pub bucket: String,
}

impl BucketBackend {
    /// Credentials come from the environment: `GOOGLE_APPLICATION_CREDENTIALS`,
    /// `GOOGLE_SERVICE_ACCOUNT*`, or the metadata server on GCP runtimes.
    pub fn gcs(bucket: &str) -> Result<Self, StorageError> {
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()?;
        info!("Storage: GCS backend gs://{}", bucket);
        Ok(Self {
            store: Arc::new(store),
            bucket: bucket.to_string(),
        })
    }

    pub fn s3(bucket: &str, cfg: &FingerprintConfig) -> Result<Self, StorageError> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(&cfg.aws_region)
            .with_bucket_name(bucket);

        if let Some(ref endpoint) = cfg.aws_endpoint_url {
            // object_store requires absolute URLs
            let endpoint_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                endpoint.clone()
            } else {
                format!("https://{}", endpoint)
            };
            builder = builder
                .with_endpoint(&endpoint_url)
                .with_allow_http(endpoint_url.starts_with("http://"));
        }

        let store = builder.build()?;
        info!("Storage: S3 backend s3://{} (region: {})", bucket, cfg.aws_region);
        Ok(Self {
            store: Arc::new(store),
            bucket: bucket.to_string(),
        })
    }
}

/// Local filesystem backend.
pub struct LocalBackend {
    pub store: Arc<dyn ObjectStore>,
    pub data_dir: PathBuf,
}

impl LocalBackend {
    pub fn new(data_dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(data_dir)?;
        let canonical = std::fs::canonicalize(data_dir).unwrap_or_else(|_| data_dir.to_path_buf());
        let store = LocalFileSystem::new_with_prefix(&canonical)?;
        info!("Storage: local backend at {}", canonical.display());
        Ok(Self {
            store: Arc::new(store),
            data_dir: canonical,
        })
    }
}
