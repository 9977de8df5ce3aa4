//! Change-gated ingestion: one invocation, one deterministic attempt.
//!
//! ```text
//! FetchFingerprint → FetchFeed → Compare ─┬─ unchanged → done
//!                                         └─ changed → Transform → Load → PersistFingerprint → done
//! ```
//!
//! Any failure ends the invocation immediately. The fingerprint is written
//! only after the warehouse has confirmed the load, so an aborted run leaves
//! nothing to clean up and the next trigger starts over.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use statusfeed_core::Fingerprint;
use statusfeed_storage::FingerprintStore;
use statusfeed_warehouse::Warehouse;

use crate::error::IngestError;
use crate::feed::FeedSource;
use crate::transform::{build_batch, decode_feed};

/// Result of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Feed digest matched the stored fingerprint; nothing was written.
    Unchanged { fingerprint: Fingerprint },
    /// A new snapshot was loaded and its fingerprint stored.
    Ingested {
        fingerprint: Fingerprint,
        rows: usize,
        job_id: String,
    },
}

/// Wires the feed, fingerprint store and warehouse together. Cheap to clone;
/// holds no per-invocation state.
#[derive(Clone)]
pub struct Pipeline {
    feed: Arc<dyn FeedSource>,
    store: Arc<dyn FingerprintStore>,
    warehouse: Arc<dyn Warehouse>,
}

impl Pipeline {
    pub fn new(
        feed: Arc<dyn FeedSource>,
        store: Arc<dyn FingerprintStore>,
        warehouse: Arc<dyn Warehouse>,
    ) -> Self {
        Self { feed, store, warehouse }
    }

    /// Run one invocation stamped with the current time.
    pub async fn run(&self) -> Result<Outcome, IngestError> {
        self.run_at(Utc::now()).await
    }

    /// Run one invocation; `started_at` becomes every record's `insert_timestamp`.
    pub async fn run_at(&self, started_at: DateTime<Utc>) -> Result<Outcome, IngestError> {
        let stored = self
            .store
            .read()
            .await
            .map_err(IngestError::FingerprintRead)?;
        debug!(
            location = %self.store.location(),
            stored = stored.as_ref().map(|f| f.as_str()).unwrap_or("(none)"),
            "stored fingerprint"
        );

        let payload = self.feed.fetch().await?;
        let fingerprint = Fingerprint::of(&payload);
        debug!(url = %self.feed.url(), bytes = payload.len(), fingerprint = %fingerprint, "feed fingerprint");

        if fingerprint.matches(stored.as_ref()) {
            info!(fingerprint = %fingerprint, "no new events");
            return Ok(Outcome::Unchanged { fingerprint });
        }
        info!(
            previous = stored.as_ref().map(|f| f.as_str()).unwrap_or("(none)"),
            current = %fingerprint,
            "new event set detected"
        );

        let records = decode_feed(&payload)?;
        let batch = build_batch(records, started_at, &fingerprint)?;
        let rows = batch.rows();

        let report = self.warehouse.load(&batch).await?;
        info!(
            destination = %self.warehouse.destination(),
            job_id = %report.job_id,
            rows,
            "snapshot loaded"
        );
        if let Some(written) = report.output_rows {
            if written != rows as u64 {
                warn!(job_id = %report.job_id, submitted = rows, written, "row count mismatch");
            }
        }

        self.store
            .write(&fingerprint)
            .await
            .map_err(IngestError::Persist)?;
        info!(location = %self.store.location(), fingerprint = %fingerprint, "fingerprint stored");

        Ok(Outcome::Ingested {
            fingerprint,
            rows,
            job_id: report.job_id,
        })
    }
}
