use async_trait::async_trait;

use statusfeed_core::NdjsonBatch;

use crate::client::WarehouseError;

/// Outcome of a load job that finished without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub job_id: String,
    pub location: Option<String>,
    /// Rows the warehouse reports as written, when it says.
    pub output_rows: Option<u64>,
}

/// Append-only batch sink.
///
/// `load` returns only once the job is terminal: `Ok` means the rows are
/// committed, any `Err` means they must be treated as not written.
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn load(&self, batch: &NdjsonBatch) -> Result<LoadReport, WarehouseError>;

    /// Destination table, for logs.
    fn destination(&self) -> String;
}
