//! In-process collaborators for router tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use statusfeed_core::NdjsonBatch;
use statusfeed_ingest::{FeedError, FeedSource, Pipeline};
use statusfeed_storage::{FingerprintStore, ObjectFingerprintStore, StorageBackend};
use statusfeed_warehouse::{LoadReport, Warehouse, WarehouseError};

use crate::state::AppState;

pub struct StaticFeed(Result<Bytes, reqwest::StatusCode>);

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch(&self) -> Result<Bytes, FeedError> {
        self.0.clone().map_err(|status| FeedError::Status { status })
    }

    fn url(&self) -> &str {
        "test://feed"
    }
}

pub fn ok_feed(body: &'static [u8]) -> StaticFeed {
    StaticFeed(Ok(Bytes::from_static(body)))
}

pub fn failing_feed(status: reqwest::StatusCode) -> StaticFeed {
    StaticFeed(Err(status))
}

#[derive(Default)]
pub struct RecordingWarehouse {
    pub batches: Mutex<Vec<NdjsonBatch>>,
    pub fail: bool,
}

#[async_trait]
impl Warehouse for RecordingWarehouse {
    async fn load(&self, batch: &NdjsonBatch) -> Result<LoadReport, WarehouseError> {
        self.batches.lock().unwrap().push(batch.clone());
        if self.fail {
            return Err(WarehouseError::JobFailed {
                job_id: "job-x".into(),
                reason: "stopped: table not found".into(),
            });
        }
        Ok(LoadReport {
            job_id: "job-1".into(),
            location: Some("US".into()),
            output_rows: Some(batch.rows() as u64),
        })
    }

    fn destination(&self) -> String {
        "acme.status_dataset.status".into()
    }
}

/// State over an in-memory fingerprint store. Returns the store and
/// warehouse so tests can inspect side effects.
pub fn state(
    feed: StaticFeed,
    fail_load: bool,
) -> (Arc<AppState>, Arc<ObjectFingerprintStore>, Arc<RecordingWarehouse>) {
    let store = Arc::new(ObjectFingerprintStore::new(&StorageBackend::memory(), "hash.txt"));
    let warehouse = Arc::new(RecordingWarehouse {
        fail: fail_load,
        ..Default::default()
    });
    let state = Arc::new(AppState {
        destination: warehouse.destination(),
        fingerprint_location: store.location(),
        pipeline: Pipeline::new(Arc::new(feed), store.clone(), warehouse.clone()),
    });
    (state, store, warehouse)
}
