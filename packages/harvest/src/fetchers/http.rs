//! reqwest-backed fetcher.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchRequest, Fetcher};

/// Fetcher that issues real HTTP requests.
///
/// # Example
///
/// ```rust,ignore
/// use harvest::{FetchRequest, Fetcher, HttpConfig, HttpFetcher};
///
/// let fetcher = HttpFetcher::new(&HttpConfig::default())?;
/// let body = fetcher.fetch(&FetchRequest::get("https://example.com")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher from HTTP settings.
    pub fn new(config: &HttpConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(Box::new(e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<String> {
        debug!(url = %request.url, "HTTP fetch starting");

        let mut builder = match &request.body {
            Some(body) => self.client.post(&request.url).body(body.clone()),
            None => self.client.get(&request.url),
        };
        if let Some(content_type) = &request.content_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some((user, password)) = &request.basic_auth {
            builder = builder.basic_auth(user, Some(password));
        }

        let response = builder.send().await.map_err(|e| {
            warn!(url = %request.url, error = %e, "HTTP request failed");
            FetchError::Request {
                url: request.url.clone(),
                source: Box::new(e),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Body {
            url: request.url.clone(),
            source: Box::new(e),
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&HttpConfig {
            timeout_secs: 5,
            user_agent: "harvest-test".to_string(),
        })
        .unwrap()
    }

    /// Serve one request with `status`, handing back the raw request text.
    async fn serve_once(status: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/echo", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }

            let body = "ok";
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&raw).into_owned()
        });

        (url, server)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= end + 4 + length
    }

    #[tokio::test]
    async fn test_get_without_body() {
        let (url, server) = serve_once("200 OK").await;

        let body = fetcher().fetch(&FetchRequest::get(&url)).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(body, "ok");
        assert!(request.starts_with("GET /echo HTTP/1.1\r\n"), "{}", request);
        assert!(request.to_ascii_lowercase().contains("user-agent: harvest-test"));
    }

    #[tokio::test]
    async fn test_post_with_body_headers_and_auth() {
        let (url, server) = serve_once("200 OK").await;
        let fetch = FetchRequest::get(&url)
            .with_header("X-Api-Key", "secret")
            .with_body(r#"{"q":"example.com"}"#, "application/json")
            .with_basic_auth("user", "pass");

        fetcher().fetch(&fetch).await.unwrap();
        let request = server.await.unwrap();
        let lowered = request.to_ascii_lowercase();

        assert!(request.starts_with("POST /echo HTTP/1.1\r\n"), "{}", request);
        assert!(lowered.contains("content-type: application/json"));
        assert!(lowered.contains("x-api-key: secret"));
        // base64("user:pass")
        assert!(request.contains("Basic dXNlcjpwYXNz"));
        assert!(request.ends_with(r#"{"q":"example.com"}"#));
    }

    #[tokio::test]
    async fn test_non_success_status_is_status_error() {
        let (url, server) = serve_once("503 Service Unavailable").await;

        let err = fetcher().fetch(&FetchRequest::get(&url)).await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[test]
    fn test_builds_from_default_config() {
        let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
        assert_eq!(fetcher.name(), "http");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_request_error() {
        let fetcher = HttpFetcher::new(&HttpConfig {
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();

        let err = fetcher
            .fetch(&FetchRequest::get("http://127.0.0.1:9/unreachable"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
    }
}
