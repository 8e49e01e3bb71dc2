//! HTTP mock server helpers for testing outbound HTTP calls.
//!
//! This module provides a thin wrapper around `wiremock` for declarative
//! HTTP stubbing. Use it to serve upstream feed documents in integration tests.
//!
//! # Quick Start
//!
//! ```ignore
//! use crate::common::http_mock::MockHttpServer;
//!
//! #[tokio::test]
//! async fn test_feed_fetch() {
//!     let server = MockHttpServer::start().await;
//!
//!     server.expect_get("/floor/20250702.xml")
//!         .respond_with_body("<legislative_activity/>")
//!         .mount()
//!         .await;
//!
//!     // Your code fetches server.url_for("/floor/20250702.xml")
//! }
//! ```
//!
//! # Patterns
//!
//! - **Success response**: `.respond_with_body(bytes)`
//! - **Error response**: `.respond_with_status(503)`
//! - **Timeout simulation**: `.respond_with_delay(Duration::from_secs(30))`
//! - **Request verification**: `.expect_times(1)` to assert call count on drop

#![allow(dead_code)]

use std::time::Duration;

pub use wiremock::matchers::{header, method, path};
pub use wiremock::MockServer as WiremockServer;
pub use wiremock::{Mock, ResponseTemplate};

/// A started `wiremock` server.
pub struct MockHttpServer {
    server: WiremockServer,
}

impl MockHttpServer {
    pub async fn start() -> Self {
        Self {
            server: WiremockServer::start().await,
        }
    }

    /// Base URL, without a trailing slash.
    pub fn url(&self) -> String {
        self.server.uri()
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.server.uri())
    }

    /// The underlying server, for matchers this wrapper does not cover.
    pub fn inner(&self) -> &WiremockServer {
        &self.server
    }

    pub fn expect_get(&self, path: impl Into<String>) -> StubBuilder<'_> {
        StubBuilder {
            server: &self.server,
            path: path.into(),
            headers: Vec::new(),
            status: 200,
            body: Vec::new(),
            delay: None,
            times: None,
        }
    }
}

/// A GET stub under construction.
pub struct StubBuilder<'a> {
    server: &'a WiremockServer,
    path: String,
    headers: Vec<(String, String)>,
    status: u16,
    body: Vec<u8>,
    delay: Option<Duration>,
    times: Option<u64>,
}

impl StubBuilder<'_> {
    /// Only match requests carrying this header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn respond_with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn respond_with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn respond_with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn expect_times(mut self, times: u64) -> Self {
        self.times = Some(times);
        self
    }

    pub async fn mount(self) {
        let mut builder = Mock::given(method("GET")).and(path(self.path.as_str()));
        for (name, value) in &self.headers {
            builder = builder.and(header(name.as_str(), value.as_str()));
        }

        let mut template = ResponseTemplate::new(self.status).set_body_bytes(self.body);
        if let Some(delay) = self.delay {
            template = template.set_delay(delay);
        }

        let mut mock = builder.respond_with(template);
        if let Some(times) = self.times {
            mock = mock.expect(times);
        }
        mock.mount(self.server).await;
    }
}
