//! HTTP transport abstraction.
//!
//! The entity client only speaks [`HttpRequest`]/[`HttpResponse`]; the
//! [`HttpTransport`] trait lets it run over reqwest in production and over
//! [`mock::MockTransport`] in tests.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// HTTP method used by entity routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// An outgoing request, relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path (already percent-encoded), e.g. `/tasks/t1`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A response with any status code.
///
/// Empty bodies decode to `null`; non-JSON bodies are kept as a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Decodes a raw body the way the transport does.
    pub fn decode_body(text: &str) -> Value {
        if text.trim().is_empty() {
            return Value::Null;
        }
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
    }
}

/// Sends entity requests to the backend.
///
/// Implementations return `Ok` for every response the server produced,
/// whatever its status, and `Err(ClientError::Transport)` only when no
/// response was received.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse>;
}

/// Configuration for the reqwest transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Base URL of the REST API (e.g. `https://api.example.com/api`).
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Headers attached to every request (auth cookies, API keys, ...).
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: 30,
            user_agent: concat!("orgdesk/", env!("CARGO_PKG_VERSION")).to_string(),
            default_headers: BTreeMap::new(),
        }
    }
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    config: TransportConfig,
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport, validating the configured headers.
    pub fn new(config: TransportConfig) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::Config(format!("header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::Config(format!("header value for {name}: {e}")))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Joins the base URL and a request path. Absolute URLs pass through.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.config.api_base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        let url = self.url_for(&request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.into(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("{} {url} failed: {e}", request.method)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(format!("failed to read response body: {e}")))?;

        debug!("{} {} -> {}", request.method, url, status);
        Ok(HttpResponse::new(status, HttpResponse::decode_body(&text)))
    }
}

/// A scripted transport for testing.
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct MockReply {
        outcome: Result<HttpResponse, String>,
        delay: Option<Duration>,
    }

    /// Replies to requests from per-route queues and records every request.
    ///
    /// Each `(method, path)` route holds a queue of replies consumed in call
    /// order; the last reply of a queue is repeated once the rest are used.
    /// Unscripted routes answer `404`.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        routes: Mutex<HashMap<(Method, String), VecDeque<MockReply>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        fn push(&self, method: Method, path: &str, reply: MockReply) {
            self.routes
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .entry((method, path.to_string()))
                .or_default()
                .push_back(reply);
        }

        /// Queues a response for a route.
        pub fn reply(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
            self.push(
                method,
                path,
                MockReply {
                    outcome: Ok(HttpResponse::new(status, body)),
                    delay: None,
                },
            );
            self
        }

        /// Queues a response delivered after `delay`.
        pub fn reply_after(
            &self,
            method: Method,
            path: &str,
            delay: Duration,
            status: u16,
            body: Value,
        ) -> &Self {
            self.push(
                method,
                path,
                MockReply {
                    outcome: Ok(HttpResponse::new(status, body)),
                    delay: Some(delay),
                },
            );
            self
        }

        /// Queues a network failure for a route.
        pub fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
            self.push(
                method,
                path,
                MockReply {
                    outcome: Err(message.to_string()),
                    delay: None,
                },
            );
            self
        }

        /// All requests received so far, in order.
        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
        }

        /// Requests received for one method and path.
        pub fn requests_to(&self, method: Method, path: &str) -> Vec<HttpRequest> {
            self.requests()
                .into_iter()
                .filter(|r| r.method == method && r.path == path)
                .collect()
        }

        pub fn request_count(&self) -> usize {
            self.requests
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .len()
        }

        fn next_reply(&self, method: Method, path: &str) -> Option<MockReply> {
            let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
            let queue = routes.get_mut(&(method, path.to_string()))?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
            let reply = self.next_reply(request.method, &request.path);
            self.requests
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(request);

            let Some(reply) = reply else {
                return Ok(HttpResponse::new(
                    404,
                    serde_json::json!({ "message": "no mock route" }),
                ));
            };
            if let Some(delay) = reply.delay {
                tokio::time::sleep(delay).await;
            }
            reply.outcome.map_err(ClientError::Transport)
        }
    }
}
