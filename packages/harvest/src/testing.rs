//! Testing utilities.
//!
//! Lets applications exercise sources and services without network access.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchRequest, Fetcher};

#[derive(Debug, Clone)]
enum MockResponse {
    Body(String),
    Status(u16),
    Transport(String),
}

/// Fetcher returning canned responses by exact URL.
///
/// Unknown URLs answer with HTTP 404. Clones share responses and call log.
///
/// # Example
///
/// ```rust
/// use harvest::testing::MockFetcher;
///
/// let fetcher = MockFetcher::new()
///     .with_body("https://provider.test/q=example.com", "www.example.com")
///     .with_failure("https://provider.test/q=example.org");
/// ```
#[derive(Debug, Default, Clone)]
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    calls: Arc<RwLock<Vec<FetchRequest>>>,
    latency: Option<Duration>,
}

impl MockFetcher {
    /// Create a fetcher with no canned responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `body`.
    pub fn with_body(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.set(url, MockResponse::Body(body.into()));
        self
    }

    /// Answer `url` with a non-success status.
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.set(url, MockResponse::Status(status));
        self
    }

    /// Fail `url` at the transport level.
    pub fn with_failure(self, url: impl Into<String>) -> Self {
        self.set(url, MockResponse::Transport("connection refused".to_string()));
        self
    }

    /// Delay every response, to simulate a slow provider.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Requests received so far, in order.
    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.read().unwrap().clone()
    }

    /// Number of requests received.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    fn set(&self, url: impl Into<String>, response: MockResponse) {
        self.responses.write().unwrap().insert(url.into(), response);
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<String> {
        self.calls.write().unwrap().push(request.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let response = self.responses.read().unwrap().get(&request.url).cloned();
        match response {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::Status(status)) => Err(FetchError::Status {
                url: request.url.clone(),
                status,
            }),
            Some(MockResponse::Transport(reason)) => Err(FetchError::Request {
                url: request.url.clone(),
                source: reason.into(),
            }),
            None => Err(FetchError::Status {
                url: request.url.clone(),
                status: 404,
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_body() {
        let fetcher = MockFetcher::new().with_body("https://a.test/", "hello");
        let body = fetcher.fetch(&FetchRequest::get("https://a.test/")).await.unwrap();

        assert_eq!(body, "hello");
        assert_eq!(fetcher.name(), "mock");
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(fetcher.calls()[0].url, "https://a.test/");
    }

    #[tokio::test]
    async fn test_unknown_url_is_404() {
        let fetcher = MockFetcher::new();
        let err = fetcher.fetch(&FetchRequest::get("https://missing.test/")).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_failures() {
        let fetcher = MockFetcher::new()
            .with_failure("https://down.test/")
            .with_status("https://busy.test/", 503);

        assert!(matches!(
            fetcher.fetch(&FetchRequest::get("https://down.test/")).await,
            Err(FetchError::Request { .. })
        ));
        assert!(matches!(
            fetcher.fetch(&FetchRequest::get("https://busy.test/")).await,
            Err(FetchError::Status { status: 503, .. })
        ));
    }
}
