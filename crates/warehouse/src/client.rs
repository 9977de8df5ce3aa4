//! BigQuery load-job client.
//!
//! Provides [`BigQueryClient`] for appending newline-delimited JSON to an
//! existing table through the REST v2 API, with exponential-backoff polling,
//! timeout enforcement and embedded-error detection.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use statusfeed_core::config::WarehouseConfig;
use statusfeed_core::NdjsonBatch;

use crate::auth::TokenSource;
use crate::job::{
    ApiErrorBody, Job, JobConfiguration, JobReference, JobRequest, JobState, LoadConfiguration,
    TableReference,
};
use crate::loader::{LoadReport, Warehouse};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors that can occur while loading into the warehouse.
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    /// Transport-level failure talking to the REST API.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// No access token could be obtained.
    #[error("access token unavailable: {0}")]
    Auth(String),

    /// The API refused the job submission or a status request.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The job reached DONE carrying an error result.
    #[error("load job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },

    /// The job did not finish within the configured wait.
    #[error("load job {job_id} timed out after {seconds}s")]
    Timeout { job_id: String, seconds: u64 },

    /// Failed to parse an API response.
    #[error("parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Polling policy
// ---------------------------------------------------------------------------

/// Backoff schedule for `jobs.get` polling.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 500,
            max_delay_ms: 5000,
            backoff_factor: 1.5,
        }
    }
}

impl PollPolicy {
    fn next_delay(&self, delay_ms: u64) -> u64 {
        ((delay_ms as f64 * self.backoff_factor) as u64).min(self.max_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for BigQuery load jobs.
///
/// Wraps the REST v2 API and adds:
/// - Multipart upload of the NDJSON payload together with the job config
/// - Exponential-backoff polling with jitter
/// - Timeout enforcement with best-effort cancellation
/// - Treating an `errorResult` on a DONE job as failure
pub struct BigQueryClient {
    config: WarehouseConfig,
    http: reqwest::Client,
    tokens: TokenSource,
    poll: PollPolicy,
}

impl BigQueryClient {
    /// Create a new [`BigQueryClient`] from the given configuration.
    pub fn new(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let tokens = TokenSource::from_config(&config);

        info!(
            table = %config.table_path(),
            api_base = %config.api_base,
            "BigQueryClient initialised"
        );

        Ok(Self {
            config,
            http,
            tokens,
            poll: PollPolicy::default(),
        })
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    // -----------------------------------------------------------------------
    // Public API
    // -----------------------------------------------------------------------

    /// Append `batch` to the destination table and wait for the job.
    ///
    /// This performs the full lifecycle:
    /// 1. Submit the load job (config + data in one multipart upload)
    /// 2. Poll until DONE (with exponential backoff)
    /// 3. Fail if the finished job carries an error result
    pub async fn load_ndjson(&self, batch: &NdjsonBatch) -> Result<LoadReport, WarehouseError> {
        let token = self.tokens.token().await?;

        let job = self.submit(&token, batch).await?;
        let job_id = job.job_reference.job_id.clone();
        info!(
            job_id = %job_id,
            rows = batch.rows(),
            bytes = batch.len_bytes(),
            "Load job submitted"
        );

        let job = if *job.state() == JobState::Done {
            job
        } else {
            self.poll_until_done(&token, &job.job_reference).await?
        };

        Self::check_result(&job)?;

        let report = LoadReport {
            job_id,
            location: job.job_reference.location.clone(),
            output_rows: job.output_rows(),
        };
        info!(
            job_id = %report.job_id,
            output_rows = ?report.output_rows,
            "Load job complete"
        );
        Ok(report)
    }

    /// Request cancellation of a running job.
    pub async fn cancel_job(&self, token: &str, job: &JobReference) -> Result<(), WarehouseError> {
        info!(job_id = %job.job_id, "Cancelling load job");

        let response = self
            .http
            .post(format!("{}/cancel", self.job_url(job)))
            .query(&self.location_query(job))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    fn destination_table(&self) -> TableReference {
        TableReference {
            project_id: self.config.project_id.clone(),
            dataset_id: self.config.dataset.clone(),
            table_id: self.config.table.clone(),
        }
    }

    fn job_url(&self, job: &JobReference) -> String {
        format!(
            "{}/bigquery/v2/projects/{}/jobs/{}",
            self.config.api_base, job.project_id, job.job_id
        )
    }

    fn location_query(&self, job: &JobReference) -> Vec<(&'static str, String)> {
        job.location
            .clone()
            .or_else(|| self.config.location.clone())
            .map(|loc| vec![("location", loc)])
            .unwrap_or_default()
    }

    async fn submit(&self, token: &str, batch: &NdjsonBatch) -> Result<Job, WarehouseError> {
        let request = JobRequest {
            job_reference: JobReference {
                project_id: self.config.project_id.clone(),
                job_id: format!("statusfeed_{}", uuid::Uuid::new_v4().simple()),
                location: self.config.location.clone(),
            },
            configuration: JobConfiguration {
                load: LoadConfiguration::append_ndjson(self.destination_table()),
            },
        };
        let metadata = serde_json::to_string(&request)
            .map_err(|e| WarehouseError::ParseError(e.to_string()))?;

        let boundary = format!("statusfeed-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_related(&boundary, &metadata, batch.as_str());

        let url = format!(
            "{}/upload/bigquery/v2/projects/{}/jobs",
            self.config.api_base, self.config.project_id
        );
        let response = self
            .http
            .post(url)
            .query(&[("uploadType", "multipart")])
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::rejected(response).await;
            error!(job_id = %request.job_reference.job_id, error = %err, "Load job submission rejected");
            return Err(err);
        }

        response
            .json::<Job>()
            .await
            .map_err(|e| WarehouseError::ParseError(e.to_string()))
    }

    async fn get_job(&self, token: &str, job: &JobReference) -> Result<Job, WarehouseError> {
        let response = self
            .http
            .get(self.job_url(job))
            .query(&self.location_query(job))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        response
            .json::<Job>()
            .await
            .map_err(|e| WarehouseError::ParseError(e.to_string()))
    }

    /// Poll `jobs.get` with exponential backoff until the job is DONE or the
    /// configured timeout is exceeded.
    async fn poll_until_done(&self, token: &str, job: &JobReference) -> Result<Job, WarehouseError> {
        let start = Instant::now();
        let timeout = Duration::from_secs(self.config.load_timeout_seconds);
        let mut delay_ms = self.poll.initial_delay_ms;

        loop {
            // Compute jitter without rand: use nanosecond fraction of current time
            let jitter_ms = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos()
                % 100;
            tokio::time::sleep(Duration::from_millis(delay_ms + jitter_ms as u64)).await;

            let current = self.get_job(token, job).await?;

            debug!(
                job_id = %job.job_id,
                state = ?current.state(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Polling load job status"
            );

            if *current.state() == JobState::Done {
                return Ok(current);
            }

            if start.elapsed() > timeout {
                warn!(
                    job_id = %job.job_id,
                    timeout_seconds = self.config.load_timeout_seconds,
                    "Load job timed out, cancelling"
                );
                // Best-effort cancel; errors from the cancel itself are ignored
                let _ = self.cancel_job(token, job).await;
                return Err(WarehouseError::Timeout {
                    job_id: job.job_id.clone(),
                    seconds: self.config.load_timeout_seconds,
                });
            }

            delay_ms = self.poll.next_delay(delay_ms);
        }
    }

    fn check_result(job: &Job) -> Result<(), WarehouseError> {
        let Some(ref err) = job.status.error_result else {
            return Ok(());
        };
        let mut reason = err.describe();
        let extra = job.status.errors.len().saturating_sub(1);
        if extra > 0 {
            reason.push_str(&format!(" (+{extra} more)"));
        }
        error!(job_id = %job.job_reference.job_id, reason = %reason, "Load job failed");
        Err(WarehouseError::JobFailed {
            job_id: job.job_reference.job_id.clone(),
            reason,
        })
    }

    async fn rejected(response: reqwest::Response) -> WarehouseError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|b| b.error.message)
            .unwrap_or(text);
        WarehouseError::Rejected { status, message }
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    async fn load(&self, batch: &NdjsonBatch) -> Result<LoadReport, WarehouseError> {
        self.load_ndjson(batch).await
    }

    fn destination(&self) -> String {
        self.config.table_path()
    }
}

/// Build a `multipart/related` body: JSON metadata part, then the data part.
fn multipart_related(boundary: &str, metadata: &str, data: &str) -> String {
    format!(
        "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
         --{b}\r\nContent-Type: application/octet-stream\r\n\r\n{data}\r\n\
         --{b}--\r\n",
        b = boundary
    )
}

// ---------------------------------------------------------------------------
// Tests: in-process mock of the REST API
// ---------------------------------------------------------------------------
