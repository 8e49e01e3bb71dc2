//! reqwest-backed [`FeedTransport`].
//!
//! Status mapping:
//!
//! - `404` is [`FetchError::NotFound`], so dated journals fall back a day
//! - any other non-success status is [`FetchError::Status`]
//! - client-side timeouts are [`FetchError::Timeout`]
//!
//! # Example
//!
//! ```ignore
//! use chambers_service::transport::HttpFeedTransport;
//!
//! let transport = HttpFeedTransport::new(Duration::from_secs(20), "chambers-watch/0.1")?;
//! let raw = transport.fetch("https://clerk.house.gov/floor/20250702.xml").await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chambers_engine::{FeedTransport, FetchError};

/// Fetches upstream documents over HTTP(S).
pub struct HttpFeedTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFeedTransport {
    /// Create a transport with its own client.
    ///
    /// # Errors
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, timeout })
    }

    /// Create a transport with a custom `reqwest::Client` (for testing with custom config).
    #[must_use]
    pub const fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn map_error(&self, url: &str, err: &reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(format!("{url}: {err}"))
        }
    }
}

#[async_trait]
impl FeedTransport for HttpFeedTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(url, &e))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.map_error(url, &e))?;
        tracing::trace!(url, bytes = body.len(), "fetched upstream document");
        Ok(body.to_vec())
    }
}
