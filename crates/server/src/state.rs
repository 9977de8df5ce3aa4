use statusfeed_ingest::Pipeline;

/// Shared, read-only state handed to every request.
pub struct AppState {
    pub pipeline: Pipeline,
    /// `project.dataset.table` receiving the loads.
    pub destination: String,
    /// Where the fingerprint object lives, for `/health`.
    pub fingerprint_location: String,
}
