//! HTTP requester for the maker's REST API.
//!
//! The polling core and the firm-quote negotiator never talk to `reqwest`
//! directly. They hand a [`RequestDescriptor`] to an [`HttpRequester`], which
//! lets tests swap in [`MockRequester`].

use crate::error::{RegistryError, RegistryResult};
use parking_lot::Mutex;
use reqwest::Client;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "api_key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Endpoint, method, static auth material and optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RequestDescriptor {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach the `api_key` header unless the key is empty.
    pub fn with_api_key(self, api_key: &str) -> Self {
        if api_key.is_empty() {
            self
        } else {
            self.with_header(API_KEY_HEADER, api_key)
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Performs one JSON request.
///
/// Implementations must bound every request with a timeout so a hung
/// upstream cannot stall a polling chain.
pub trait HttpRequester: Send + Sync {
    fn execute(&self, request: RequestDescriptor) -> BoxFuture<'_, RegistryResult<serde_json::Value>>;
}

/// Arc wrapper for requester trait objects.
pub type DynRequester = Arc<dyn HttpRequester>;

/// `reqwest`-backed requester.
pub struct ReqwestRequester {
    client: Client,
}

impl ReqwestRequester {
    /// Create a requester whose every call times out after `timeout`.
    pub fn new(timeout: Duration) -> RegistryResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::HttpClient(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn send(&self, request: RequestDescriptor) -> RegistryResult<serde_json::Value> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RegistryError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let value = response
            .json()
            .await
            .map_err(|e| RegistryError::HttpClient(format!("Failed to parse response: {e}")))?;
        debug!(url = %request.url, "Response received");
        Ok(value)
    }
}

impl HttpRequester for ReqwestRequester {
    fn execute(&self, request: RequestDescriptor) -> BoxFuture<'_, RegistryResult<serde_json::Value>> {
        Box::pin(self.send(request))
    }
}

/// Canned reply of [`MockRequester`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Json(serde_json::Value),
    Status { status: u16, body: String },
    Unreachable,
}

/// Mock requester for testing.
///
/// Replies are keyed by URL and stay in place until replaced. Unknown URLs
/// fail as unreachable.
#[derive(Default)]
pub struct MockRequester {
    replies: Mutex<HashMap<String, MockReply>>,
    requests: Mutex<Vec<RequestDescriptor>>,
}

impl MockRequester {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_json(&self, url: impl Into<String>, value: serde_json::Value) {
        self.replies.lock().insert(url.into(), MockReply::Json(value));
    }

    pub fn set_status(&self, url: impl Into<String>, status: u16, body: impl Into<String>) {
        self.replies.lock().insert(
            url.into(),
            MockReply::Status {
                status,
                body: body.into(),
            },
        );
    }

    pub fn set_unreachable(&self, url: impl Into<String>) {
        self.replies.lock().insert(url.into(), MockReply::Unreachable);
    }

    /// All requests seen so far.
    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().clone()
    }

    /// Number of requests sent to `url`.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.url == url).count()
    }
}

impl HttpRequester for MockRequester {
    fn execute(&self, request: RequestDescriptor) -> BoxFuture<'_, RegistryResult<serde_json::Value>> {
        Box::pin(async move {
            let reply = self.replies.lock().get(&request.url).cloned();
            self.requests.lock().push(request);
            match reply {
                Some(MockReply::Json(value)) => Ok(value),
                Some(MockReply::Status { status, body }) => {
                    Err(RegistryError::HttpStatus { status, body })
                }
                Some(MockReply::Unreachable) | None => {
                    Err(RegistryError::HttpClient("connection refused".to_string()))
                }
            }
        })
    }
}
