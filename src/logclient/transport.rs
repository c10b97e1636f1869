// Network transport collaborator for the CT log client
//
// The verification core never opens a socket itself; it consumes this trait.
// The bundled reqwest implementation applies a per-request timeout and a
// bounded exponential backoff, because retry policy belongs to the
// transport, not to the log client or the verifier.

use crate::error::CtError;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum number of retries for retryable failures
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration (doubled with each retry)
const INITIAL_BACKOFF_MS: u64 = 100;

/// Maximum backoff duration
const MAX_BACKOFF_MS: u64 = 5000;

/// Fetches raw bytes from a CT log endpoint
#[async_trait]
pub trait LogTransport: Send + Sync {
    /// GET the URL and return the response body
    async fn get(&self, url: &str) -> Result<Vec<u8>>;

    /// POST a JSON body to the URL and return the response body
    async fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>>;
}

/// reqwest-backed transport with timeout and bounded retry/backoff
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }

    async fn execute_with_retry<F, Fut>(&self, url: &str, request_fn: F) -> Result<Vec<u8>>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<reqwest::Response, reqwest::Error>>,
    {
        let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match request_fn().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.bytes().await?.to_vec());
                    }
                    if status.as_u16() == 429 || status.is_server_error() {
                        warn!(
                            "Log returned {}, retrying after {:?} (attempt {}/{})",
                            status,
                            backoff,
                            attempt + 1,
                            MAX_RETRIES
                        );
                        tokio::time::sleep(backoff).await;
                        backoff = std::cmp::min(backoff * 2, Duration::from_millis(MAX_BACKOFF_MS));
                        last_error = Some(format!("HTTP status {}", status));
                        continue;
                    }
                    // client error, not retryable
                    return Err(CtError::internal(format!(
                        "Log request to {} failed with status {}",
                        url, status
                    )));
                }
                Err(e) => {
                    if attempt < MAX_RETRIES - 1 {
                        debug!(
                            "Network error: {}, retrying after {:?} (attempt {}/{})",
                            e,
                            backoff,
                            attempt + 1,
                            MAX_RETRIES
                        );
                        tokio::time::sleep(backoff).await;
                        backoff = std::cmp::min(backoff * 2, Duration::from_millis(MAX_BACKOFF_MS));
                        last_error = Some(e.to_string());
                    } else {
                        return Err(CtError::internal_with(
                            format!("Log request to {} failed", url),
                            e,
                        ));
                    }
                }
            }
        }

        Err(CtError::internal(format!(
            "Log request to {} failed after {} retries: {}",
            url,
            MAX_RETRIES,
            last_error.unwrap_or_else(|| "unknown error".to_string())
        )))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl LogTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.execute_with_retry(url, || async { self.client.get(url).send().await })
            .await
    }

    async fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>> {
        self.execute_with_retry(url, || async {
            self.client
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.clone())
                .send()
                .await
        })
        .await
    }
}
