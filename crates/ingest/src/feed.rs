use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use statusfeed_core::config::FeedConfig;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned {status}")]
    Status { status: reqwest::StatusCode },
}

/// Source of the raw feed payload.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the complete body. The exact bytes are what gets fingerprinted.
    async fn fetch(&self) -> Result<Bytes, FeedError>;

    fn url(&self) -> &str;
}

/// Single-attempt GET with a hard timeout.
pub struct HttpFeed {
    client: Client,
    url: String,
}

impl HttpFeed {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Result<Bytes, FeedError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status { status });
        }

        let body = response.bytes().await?;
        debug!(url = %self.url, bytes = body.len(), "feed fetched");
        Ok(body)
    }

    fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn feed(url: String, timeout_ms: u64) -> HttpFeed {
        HttpFeed::new(&FeedConfig { url, timeout_ms }).unwrap()
    }

    #[tokio::test]
    async fn returns_exact_body_bytes() {
        let base = spawn(Router::new().route("/incidents.json", get(|| async { "[ ]\n" }))).await;

        let body = feed(format!("{base}/incidents.json"), 2000).fetch().await.unwrap();
        assert_eq!(&body[..], b"[ ]\n");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let base = spawn(Router::new().route(
            "/incidents.json",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        ))
        .await;

        let err = feed(format!("{base}/incidents.json"), 2000).fetch().await.unwrap_err();
        match err {
            FeedError::Status { status } => assert_eq!(status.as_u16(), 503),
            other => panic!("expected Status error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_feed_hits_timeout() {
        let base = spawn(Router::new().route(
            "/incidents.json",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                "[]"
            }),
        ))
        .await;

        let err = feed(format!("{base}/incidents.json"), 50).fetch().await.unwrap_err();
        match err {
            FeedError::Http(e) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got: {other:?}"),
        }
    }
}
