//! Transport seam for fetching raw upstream documents.
//!
//! The engine never talks HTTP itself. A [`FeedTransport`] turns a URL into
//! bytes; the service crate provides the reqwest-backed implementation and
//! tests use [`mock::MockFeedTransport`].

use async_trait::async_trait;

use crate::error::FetchError;

/// Fetches one upstream document.
///
/// Every error means "no new data this cycle" to the caller. Implementations
/// should map a missing document to [`FetchError::NotFound`] so dated
/// journals can fall back to an earlier day.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::missing_const_for_fn,
    clippy::must_use_candidate
)]
pub mod mock {
    //! Scripted transport for unit and integration tests.

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{FeedTransport, FetchError};

    /// Serves configured responses per URL and records every call.
    ///
    /// Unknown URLs answer [`FetchError::NotFound`].
    #[derive(Default)]
    pub struct MockFeedTransport {
        responses: Mutex<HashMap<String, Result<Vec<u8>, FetchError>>>,
        delays: Mutex<HashMap<String, Duration>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockFeedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Serve `body` for `url` until replaced.
        pub fn set_body(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
            self.set_result(url, Ok(body.into()));
        }

        pub fn set_result(&self, url: impl Into<String>, result: Result<Vec<u8>, FetchError>) {
            self.responses.lock().unwrap().insert(url.into(), result);
        }

        /// Hold every response for `url` back by `delay`.
        pub fn set_delay(&self, url: impl Into<String>, delay: Duration) {
            self.delays.lock().unwrap().insert(url.into(), delay);
        }

        /// Every URL fetched, in order.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn clear_calls(&self) {
            self.calls.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl FeedTransport for MockFeedTransport {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());

            let delay = self.delays.lock().unwrap().get(url).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            self.responses
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(FetchError::NotFound(url.to_string())))
        }
    }
}
