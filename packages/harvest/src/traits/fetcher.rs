//! Fetcher trait: the HTTP collaborator the harvesting core talks through.

use async_trait::async_trait;

use crate::error::FetchResult;

/// One provider request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRequest {
    /// Absolute URL
    pub url: String,

    /// Extra request headers
    pub headers: Vec<(String, String)>,

    /// Request body; a request with a body is sent as POST
    pub body: Option<String>,

    /// Content-Type for the body
    pub content_type: Option<String>,

    /// Basic-auth credentials (username, password)
    pub basic_auth: Option<(String, String)>,
}

impl FetchRequest {
    /// Plain GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a body and its content type.
    pub fn with_body(mut self, body: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.content_type = Some(content_type.into());
        self
    }

    /// Attach basic-auth credentials.
    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((user.into(), password.into()));
        self
    }
}

/// Issues provider requests and returns the decoded body.
///
/// Any failure is reported as a [`FetchError`](crate::FetchError); callers
/// treat every failure the same way.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Execute a request and return the page text.
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<String>;

    /// Name for logging.
    fn name(&self) -> &str;
}
