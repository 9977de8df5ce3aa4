use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use statusfeed_ingest::Outcome;

use crate::state::AppState;

/// Run one change-gated ingestion. `200 ok` on success (changed or not);
/// `500` with the error text otherwise.
pub async fn invoke(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, (StatusCode, String)> {
    let invocation_id = Uuid::new_v4();
    let span = info_span!("invocation", %invocation_id);

    async move {
        match state.pipeline.run().await {
            Ok(Outcome::Unchanged { .. }) => Ok("ok"),
            Ok(Outcome::Ingested { rows, job_id, .. }) => {
                info!(rows, job_id = %job_id, "invocation ingested new snapshot");
                Ok("ok")
            }
            Err(e) => {
                error!(kind = e.kind().as_str(), error = %e, "invocation failed");
                Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
            }
        }
    }
    .instrument(span)
    .await
}
