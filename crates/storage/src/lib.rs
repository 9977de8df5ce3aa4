//! Fingerprint persistence over `object_store` (GCS, S3, local or memory).

pub mod backend;
pub mod error;
pub mod fingerprint_store;

pub use backend::{BucketBackend, LocalBackend, StorageBackend};
pub use error::StorageError;
pub use fingerprint_store::{FingerprintStore, ObjectFingerprintStore};
