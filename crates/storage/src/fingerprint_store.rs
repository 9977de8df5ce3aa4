//! Persistence of the last ingested feed fingerprint.
//!
//! The fingerprint lives in a single small UTF-8 object. A missing object
//! means nothing has been ingested yet.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path;
use object_store::ObjectStore;
use tracing::debug;

use statusfeed_core::Fingerprint;

use crate::backend::StorageBackend;
use crate::error::StorageError;

/// Read/overwrite access to the persisted fingerprint.
#[async_trait]
pub trait FingerprintStore: Send + Sync {
    /// The stored fingerprint, or `None` on first run.
    async fn read(&self) -> Result<Option<Fingerprint>, StorageError>;

    /// Replace the stored fingerprint.
    async fn write(&self, fingerprint: &Fingerprint) -> Result<(), StorageError>;

    /// Where the fingerprint lives, for logs.
    fn location(&self) -> String;
}

/// [`FingerprintStore`] backed by one object in an [`ObjectStore`].
pub struct ObjectFingerprintStore {
    store: Arc<dyn ObjectStore>,
    path: Path,
    label: String,
}

impl ObjectFingerprintStore {
    pub fn new(backend: &StorageBackend, object: &str) -> Self {
        Self {
            store: backend.store_arc(),
            path: Path::from(object),
            label: format!("{}/{}", backend.describe(), object),
        }
    }
}

#[async_trait]
impl FingerprintStore for ObjectFingerprintStore {
    async fn read(&self) -> Result<Option<Fingerprint>, StorageError> {
        let result = match self.store.get(&self.path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                debug!(location = %self.label, "no stored fingerprint");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let raw = result.bytes().await?;
        let text = String::from_utf8(raw.to_vec())?;
        Ok(Fingerprint::from_stored(&text))
    }

    async fn write(&self, fingerprint: &Fingerprint) -> Result<(), StorageError> {
        let payload = Bytes::from(fingerprint.as_str().to_owned());
        self.store.put(&self.path, payload.into()).await?;
        debug!(location = %self.label, fingerprint = %fingerprint, "fingerprint stored");
        Ok(())
    }

    fn location(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_missing_object_is_none() {
        let backend = StorageBackend::memory();
        let store = ObjectFingerprintStore::new(&backend, "hash.txt");
        assert!(store.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_then_read_back() {
        let backend = StorageBackend::memory();
        let store = ObjectFingerprintStore::new(&backend, "hash.txt");
        let fp = Fingerprint::of(b"[]");

        store.write(&fp).await.unwrap();
        assert_eq!(store.read().await.unwrap(), Some(fp));
    }

    #[tokio::test]
    async fn write_replaces_previous_value() {
        let backend = StorageBackend::memory();
        let store = ObjectFingerprintStore::new(&backend, "hash.txt");

        store.write(&Fingerprint::of(b"first")).await.unwrap();
        store.write(&Fingerprint::of(b"second")).await.unwrap();

        assert_eq!(store.read().await.unwrap(), Some(Fingerprint::of(b"second")));
    }

    #[tokio::test]
    async fn blank_object_reads_as_none() {
        let backend = StorageBackend::memory();
        backend
            .store_arc()
            .put(&Path::from("hash.txt"), Bytes::from_static(b"\n").into())
            .await
            .unwrap();

        let store = ObjectFingerprintStore::new(&backend, "hash.txt");
        assert!(store.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn local_backend_persists_plain_text() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = StorageBackend::Local(crate::LocalBackend::new(tmp.path()).unwrap());
        let store = ObjectFingerprintStore::new(&backend, "hash.txt");
        let fp = Fingerprint::of(b"payload");

        store.write(&fp).await.unwrap();

        let on_disk = std::fs::read_to_string(tmp.path().join("hash.txt")).unwrap();
        assert_eq!(on_disk, fp.as_str());
        assert!(store.location().ends_with("/hash.txt"));
    }
}
