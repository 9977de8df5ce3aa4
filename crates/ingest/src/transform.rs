//! Feed payload → stamped NDJSON batch.

use chrono::{DateTime, Utc};

use statusfeed_core::{Fingerprint, IncidentRecord, NdjsonBatch};

/// Decode the payload as one top-level array. Any malformed record fails
/// the whole decode.
pub fn decode_feed(payload: &[u8]) -> Result<Vec<IncidentRecord>, serde_json::Error> {
    serde_json::from_slice(payload)
}

/// Stamp every record with the fetch time and payload fingerprint, then
/// serialize one JSON object per line.
pub fn build_batch(
    mut records: Vec<IncidentRecord>,
    fetched_at: DateTime<Utc>,
    fingerprint: &Fingerprint,
) -> Result<NdjsonBatch, serde_json::Error> {
    for record in &mut records {
        record.stamp(fetched_at, fingerprint);
    }
    NdjsonBatch::from_rows(&records)
}
