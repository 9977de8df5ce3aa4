//! OAuth2 bearer tokens for the BigQuery REST API.

use std::sync::Arc;

use gcp_auth::TokenProvider;
use tokio::sync::OnceCell;
use tracing::debug;

use statusfeed_core::config::WarehouseConfig;

use crate::client::WarehouseError;

/// Scope requested for load jobs.
pub const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";

/// Where access tokens come from.
#[derive(Clone)]
pub enum TokenSource {
    /// Fixed token supplied through configuration.
    Static(String),
    /// Application Default Credentials: `GOOGLE_APPLICATION_CREDENTIALS`,
    /// gcloud user credentials, then the metadata server. The provider is
    /// resolved on first use and caches/refreshes tokens itself.
    Adc(Arc<OnceCell<Arc<dyn TokenProvider>>>),
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Static(_) => f.write_str("TokenSource::Static(..)"),
            TokenSource::Adc(_) => f.write_str("TokenSource::Adc"),
        }
    }
}

impl TokenSource {
    pub fn from_config(config: &WarehouseConfig) -> Self {
        match config.access_token {
            Some(ref token) => TokenSource::Static(token.clone()),
            None => TokenSource::Adc(Arc::new(OnceCell::new())),
        }
    }

    pub async fn token(&self) -> Result<String, WarehouseError> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Adc(cell) => {
                let provider = cell
                    .get_or_try_init(gcp_auth::provider)
                    .await
                    .map_err(|e| WarehouseError::Auth(e.to_string()))?;
                let token = provider
                    .token(&[BIGQUERY_SCOPE])
                    .await
                    .map_err(|e| WarehouseError::Auth(e.to_string()))?;
                debug!("fetched access token from application default credentials");
                Ok(token.as_str().to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(access_token: Option<&str>) -> WarehouseConfig {
        WarehouseConfig {
            project_id: "acme".into(),
            dataset: "status_dataset".into(),
            table: "status".into(),
            location: None,
            api_base: "http://localhost".into(),
            access_token: access_token.map(str::to_string),
            load_timeout_seconds: 600,
        }
    }

    #[tokio::test]
    async fn static_token_is_returned_verbatim() {
        let source = TokenSource::from_config(&config(Some("ya29.test")));
        assert!(matches!(source, TokenSource::Static(_)));
        assert_eq!(source.token().await.unwrap(), "ya29.test");
    }

    #[test]
    fn no_static_token_falls_back_to_adc() {
        let source = TokenSource::from_config(&config(None));
        match source {
            TokenSource::Adc(cell) => assert!(!cell.initialized()),
            other => panic!("expected Adc, got: {other:?}"),
        }
    }

    #[test]
    fn debug_never_prints_the_token() {
        let source = TokenSource::Static("ya29.secret".into());
        assert!(!format!("{source:?}").contains("secret"));
    }
}
