//! reqwest-backed [`PageFetcher`].
//!
//! One client is shared by every task of a run so connections are reused.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::traits::{PageFetcher, TransportError};

pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Builds a transport with the given user agent and per-request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl PageFetcher for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    secs: self.timeout.as_secs(),
                }
            } else {
                TransportError::Network(format!("GET {} failed: {}", url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(url, status = status.as_u16(), "Non-success response");
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| TransportError::Network(format!("Reading body of {} failed: {}", url, e)))
    }
}
