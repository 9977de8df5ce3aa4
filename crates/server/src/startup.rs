//! Server startup: wire the collaborators from config into `AppState`.

use std::sync::Arc;

use tracing::info;

use statusfeed_core::Config;
use statusfeed_ingest::{FeedSource, HttpFeed, Pipeline};
use statusfeed_storage::{FingerprintStore, ObjectFingerprintStore, StorageBackend};
use statusfeed_warehouse::{BigQueryClient, Warehouse};

use crate::state::AppState;

/// Build the production collaborators. Nothing here touches the network;
/// the first request does.
pub fn build_app_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let backend = StorageBackend::from_config(&config.fingerprint, &config.warehouse.project_id)?;
    info!(backend = %backend.describe(), "fingerprint store ready");
    let store: Arc<dyn FingerprintStore> =
        Arc::new(ObjectFingerprintStore::new(&backend, &config.fingerprint.object));

    let feed: Arc<dyn FeedSource> = Arc::new(HttpFeed::new(&config.feed)?);
    let warehouse: Arc<dyn Warehouse> = Arc::new(BigQueryClient::new(config.warehouse.clone())?);

    Ok(Arc::new(AppState {
        destination: warehouse.destination(),
        fingerprint_location: store.location(),
        pipeline: Pipeline::new(feed, store, warehouse),
    }))
}
