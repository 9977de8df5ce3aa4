//! BigQuery v2 job resources, limited to the fields a load job needs.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub job_reference: JobReference,
    pub configuration: JobConfiguration,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobConfiguration {
    pub load: LoadConfiguration,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadConfiguration {
    pub destination_table: TableReference,
    pub source_format: &'static str,
    pub create_disposition: &'static str,
    pub write_disposition: &'static str,
}

impl LoadConfiguration {
    /// Append NDJSON rows to an existing table. The job fails instead of
    /// creating the table when it is missing.
    pub fn append_ndjson(destination_table: TableReference) -> Self {
        Self {
            destination_table,
            source_format: "NEWLINE_DELIMITED_JSON",
            create_disposition: "CREATE_NEVER",
            write_disposition: "WRITE_APPEND",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_reference: JobReference,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub statistics: Option<JobStatistics>,
}

impl Job {
    pub fn state(&self) -> &JobState {
        &self.status.state
    }

    /// Rows written by a finished load job, when reported.
    pub fn output_rows(&self) -> Option<u64> {
        self.statistics
            .as_ref()
            .and_then(|s| s.load.as_ref())
            .and_then(|l| l.output_rows.as_deref())
            .and_then(|v| v.parse().ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(default)]
    pub state: JobState,
    /// Set when a DONE job failed.
    #[serde(default)]
    pub error_result: Option<ErrorProto>,
    /// All errors encountered, including non-fatal ones.
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    #[default]
    Pending,
    Running,
    Done,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorProto {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorProto {
    /// `reason: message (location)`, skipping absent parts.
    pub fn describe(&self) -> String {
        let mut out = self.reason.clone().unwrap_or_else(|| "unknown".to_string());
        if let Some(ref message) = self.message {
            out.push_str(": ");
            out.push_str(message);
        }
        if let Some(ref location) = self.location {
            out.push_str(&format!(" ({location})"));
        }
        out
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobStatistics {
    #[serde(default)]
    pub load: Option<LoadStatistics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStatistics {
    /// int64 values are encoded as strings.
    #[serde(default)]
    pub output_rows: Option<String>,
}

/// Error envelope returned by the REST API on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_rest_field_names() {
        let req = JobRequest {
            job_reference: JobReference {
                project_id: "acme".into(),
                job_id: "statusfeed_1".into(),
                location: None,
            },
            configuration: JobConfiguration {
                load: LoadConfiguration::append_ndjson(TableReference {
                    project_id: "acme".into(),
                    dataset_id: "status_dataset".into(),
                    table_id: "status".into(),
                }),
            },
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["jobReference"]["jobId"], "statusfeed_1");
        assert!(v["jobReference"].get("location").is_none());
        let load = &v["configuration"]["load"];
        assert_eq!(load["destinationTable"]["tableId"], "status");
        assert_eq!(load["sourceFormat"], "NEWLINE_DELIMITED_JSON");
        assert_eq!(load["createDisposition"], "CREATE_NEVER");
        assert_eq!(load["writeDisposition"], "WRITE_APPEND");
    }

    #[test]
    fn parses_done_job_with_error() {
        let raw = r#"{
            "jobReference": {"projectId": "acme", "jobId": "j1", "location": "US"},
            "status": {
                "state": "DONE",
                "errorResult": {"reason": "notFound", "message": "Not found: Table acme:status_dataset.status"},
                "errors": [{"reason": "notFound", "message": "Not found"}]
            }
        }"#;
        let job: Job = serde_json::from_str(raw).unwrap();
        assert_eq!(job.state(), &JobState::Done);
        let err = job.status.error_result.unwrap();
        assert!(err.describe().starts_with("notFound: Not found: Table"));
    }

    #[test]
    fn parses_output_rows_and_unknown_state() {
        let raw = r#"{
            "jobReference": {"projectId": "acme", "jobId": "j2"},
            "status": {"state": "SOMETHING_NEW"},
            "statistics": {"load": {"outputRows": "42"}}
        }"#;
        let job: Job = serde_json::from_str(raw).unwrap();
        assert_eq!(job.state(), &JobState::Unknown);
        assert_eq!(job.output_rows(), Some(42));
    }
}
