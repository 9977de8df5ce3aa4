use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Public incidents feed polled by default.
pub const DEFAULT_FEED_URL: &str = "https://status.cloud.google.com/incidents.json";

/// Default BigQuery REST endpoint.
pub const DEFAULT_BQ_API_BASE: &str = "https://bigquery.googleapis.com";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

/// Immutable process configuration, built once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub feed: FeedConfig,
    pub warehouse: WarehouseConfig,
    pub fingerprint: FingerprintConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `STATUSFEED_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("STATUSFEED_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            feed: FeedConfig::from_env_profiled(p),
            warehouse: WarehouseConfig::from_env_profiled(p),
            fingerprint: FingerprintConfig::from_env_profiled(p),
        }
    }

    /// Check the settings that have no usable default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.warehouse.project_id.trim().is_empty() {
            return Err(ConfigError::Missing("BQ_PROJECTID"));
        }
        if self.warehouse.dataset.trim().is_empty() {
            return Err(ConfigError::Missing("BQ_DATASET"));
        }
        if self.warehouse.table.trim().is_empty() {
            return Err(ConfigError::Missing("BQ_TABLE"));
        }
        if self.fingerprint.object.trim().is_empty() {
            return Err(ConfigError::Missing("FINGERPRINT_OBJECT"));
        }
        FingerprintBackendKind::parse(&self.fingerprint.backend)?;
        Ok(())
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        tracing::info!("  feed:        url={}, timeout={}ms", self.feed.url, self.feed.timeout_ms);
        tracing::info!(
            "  warehouse:   table={}, api={}, token={}",
            self.warehouse.table_path(),
            self.warehouse.api_base,
            if self.warehouse.access_token.is_some() { "static" } else { "adc" }
        );
        tracing::info!(
            "  fingerprint: backend={}, bucket={}, object={}",
            self.fingerprint.backend,
            self.fingerprint.bucket_name(&self.warehouse.project_id),
            self.fingerprint.object
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 8080),
        }
    }
}

// ── Feed ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl FeedConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "FEED_URL", DEFAULT_FEED_URL),
            timeout_ms: profiled_env_u64(p, "FEED_TIMEOUT_MS", 2000),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ── Warehouse (BigQuery) ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    pub project_id: String,
    pub dataset: String,
    pub table: String,
    /// Job location (e.g. "US"); BigQuery infers it when unset.
    pub location: Option<String>,
    pub api_base: String,
    /// Static bearer token. When unset, Application Default Credentials are used.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Upper bound on waiting for a load job to finish.
    pub load_timeout_seconds: u64,
}

impl WarehouseConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            project_id: profiled_env_or(p, "BQ_PROJECTID", ""),
            dataset: profiled_env_or(p, "BQ_DATASET", "status_dataset"),
            table: profiled_env_or(p, "BQ_TABLE", "status"),
            location: profiled_env_opt(p, "BQ_LOCATION"),
            api_base: profiled_env_or(p, "BQ_API_BASE", DEFAULT_BQ_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            access_token: profiled_env_opt(p, "BQ_ACCESS_TOKEN"),
            load_timeout_seconds: profiled_env_u64(p, "BQ_LOAD_TIMEOUT_SECONDS", 600),
        }
    }

    /// `project.dataset.table`, for logs.
    pub fn table_path(&self) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset, self.table)
    }
}

// ── Fingerprint store ─────────────────────────────────────────

/// Object-store flavour backing the fingerprint object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintBackendKind {
    Gcs,
    S3,
    Local,
}

impl FingerprintBackendKind {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "gcs" | "gs" => Ok(Self::Gcs),
            "s3" => Ok(Self::S3),
            "local" | "file" => Ok(Self::Local),
            other => Err(ConfigError::Invalid {
                key: "FINGERPRINT_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// "gcs", "s3" or "local".
    pub backend: String,
    /// Bucket override; defaults to `{project}-status-hash`.
    pub bucket: Option<String>,
    pub object: String,
    pub local_dir: PathBuf,
    pub aws_region: String,
    pub aws_endpoint_url: Option<String>,
}

impl FingerprintConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            backend: profiled_env_or(p, "FINGERPRINT_BACKEND", "gcs"),
            bucket: profiled_env_opt(p, "FINGERPRINT_BUCKET"),
            object: profiled_env_or(p, "FINGERPRINT_OBJECT", "hash.txt"),
            local_dir: PathBuf::from(profiled_env_or(p, "FINGERPRINT_LOCAL_DIR", "data")),
            aws_region: profiled_env_or(p, "AWS_REGION", "us-east-1"),
            aws_endpoint_url: profiled_env_opt(p, "AWS_ENDPOINT_URL"),
        }
    }

    pub fn bucket_name(&self, project_id: &str) -> String {
        self.bucket
            .clone()
            .unwrap_or_else(|| format!("{}-status-hash", project_id))
    }

    pub fn backend_kind(&self) -> Result<FingerprintBackendKind, ConfigError> {
        FingerprintBackendKind::parse(&self.backend)
    }
}

// ── Tests ─────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env-based tests must run serially to avoid interfering with each other.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        let keys = [
            "STATUSFEED_PROFILE",
            "PORT",
            "FEED_URL",
            "FEED_TIMEOUT_MS",
            "BQ_PROJECTID",
            "BQ_DATASET",
            "BQ_TABLE",
            "BQ_API_BASE",
            "BQ_ACCESS_TOKEN",
            "FINGERPRINT_BACKEND",
            "FINGERPRINT_BUCKET",
            "PROD_BQ_TABLE",
        ];
        for k in keys {
            env::remove_var(k);
        }
    }

    #[test]
    fn defaults_when_no_env_vars() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        let cfg = Config::for_profile("");

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.feed.url, DEFAULT_FEED_URL);
        assert_eq!(cfg.feed.timeout(), Duration::from_secs(2));
        assert_eq!(cfg.warehouse.dataset, "status_dataset");
        assert_eq!(cfg.warehouse.table, "status");
        assert_eq!(cfg.warehouse.api_base, DEFAULT_BQ_API_BASE);
        assert_eq!(cfg.fingerprint.object, "hash.txt");
        assert_eq!(cfg.fingerprint.backend_kind().unwrap(), FingerprintBackendKind::Gcs);
    }

    #[test]
    fn missing_project_fails_validation() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        let cfg = Config::for_profile("");
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("BQ_PROJECTID"));

        env::set_var("BQ_PROJECTID", "acme");
        assert!(Config::for_profile("").validate().is_ok());

        clear_env();
    }

    #[test]
    fn profiled_env_takes_precedence() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        env::set_var("BQ_TABLE", "status");
        env::set_var("PROD_BQ_TABLE", "status_prod");

        let cfg = Config::for_profile("prod");
        assert_eq!(cfg.profile, "PROD");
        assert_eq!(cfg.warehouse.table, "status_prod");

        clear_env();
    }

    #[test]
    fn bucket_defaults_to_project_suffix() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        let cfg = Config::for_profile("");
        assert_eq!(cfg.fingerprint.bucket_name("acme"), "acme-status-hash");

        env::set_var("FINGERPRINT_BUCKET", "custom-bucket");
        let cfg = Config::for_profile("");
        assert_eq!(cfg.fingerprint.bucket_name("acme"), "custom-bucket");

        clear_env();
    }

    #[test]
    fn api_base_trailing_slash_is_trimmed() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        env::set_var("BQ_API_BASE", "http://localhost:9050/");
        let cfg = Config::for_profile("");
        assert_eq!(cfg.warehouse.api_base, "http://localhost:9050");

        clear_env();
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(FingerprintBackendKind::parse("S3").is_ok());
        assert!(FingerprintBackendKind::parse("azure").is_err());
    }

    #[test]
    fn invalid_number_falls_back_to_default() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        env::set_var("FEED_TIMEOUT_MS", "soon");
        let cfg = Config::for_profile("");
        assert_eq!(cfg.feed.timeout_ms, 2000);

        clear_env();
    }
}
