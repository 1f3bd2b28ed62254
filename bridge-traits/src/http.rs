//! HTTP Client Abstraction
//!
//! Describes a single logical HTTP exchange: method, URL, injected headers and
//! query parameters, optional body, and a per-call timeout. Implementations
//! return the status code of every response they receive; retry decisions
//! belong to the caller (see [`RetryPolicy`]).

use async_trait::async_trait;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Methods whose repetition cannot change server state beyond the first call.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Self::Get | Self::Put | Self::Delete)
    }
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in headers {
            self.headers.insert(key.into(), value.into());
        }
        self
    }

    /// Append a query parameter. Values are URL-encoded by the client.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let json = serde_json::to_vec(body).map_err(|e| {
            BridgeError::InvalidRequest(format!("JSON serialization failed: {}", e))
        })?;
        self.body = Some(Bytes::from(json));
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Parse response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON deserialization failed: {}", e))
        })
    }

    /// Response body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Status codes that signal a transient condition worth another attempt.
pub const RETRYABLE_STATUSES: [u16; 4] = [429, 500, 503, 504];

pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Retry policy applied by callers of [`HttpClient`]
///
/// `retry_attempts` counts attempts made *after* the first one, so the
/// default policy issues at most two requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the initial request
    pub retry_attempts: u32,
    /// Wait before retrying a rate-limited (429) request
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_attempts: 1,
            retry_delay: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    pub fn new(retry_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            retry_attempts,
            retry_delay,
        }
    }

    /// Back-off before the next attempt given the status just observed.
    ///
    /// 429 means the caller is going too fast and must wait the full delay;
    /// 5xx responses are retried immediately.
    pub fn delay_for(&self, status: u16) -> Duration {
        if status == 429 {
            self.retry_delay
        } else {
            Duration::ZERO
        }
    }
}

/// Async HTTP client trait
///
/// Executes exactly one request per call, bounded by the request timeout.
/// Implementations must:
/// - return `Ok` with the status code for any HTTP response, including 4xx/5xx
/// - map timeouts to [`BridgeError::Timeout`]
/// - map DNS/connect/TLS failures to [`BridgeError::Transport`]
/// - map request construction failures to [`BridgeError::InvalidRequest`]
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest, HttpMethod};
///
/// async fn fetch_view(client: &dyn HttpClient) -> Result<String> {
///     let request = HttpRequest::new(HttpMethod::Get, "https://app.iconik.io/API/metadata/v1/views/abc/")
///         .header("App-ID", "app")
///         .timeout(Duration::from_secs(30));
///
///     let response = client.execute(request).await?;
///     Ok(response.text())
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::new(HttpMethod::Get, "https://example.com")
            .header("App-ID", "app")
            .query("page", 2)
            .query("per_page", 500)
            .timeout(Duration::from_secs(30));

        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.headers.get("App-ID"), Some(&"app".to_string()));
        assert_eq!(
            request.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("per_page".to_string(), "500".to_string())
            ]
        );
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = HttpRequest::new(HttpMethod::Patch, "https://example.com")
            .json(&serde_json::json!({"title": "My Clip"}))
            .unwrap();

        assert_eq!(
            request.headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
        assert_eq!(request.body.unwrap(), Bytes::from(r#"{"title":"My Clip"}"#));
    }

    #[test]
    fn test_retry_delay_depends_on_status() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(429), Duration::from_secs(3));
        assert_eq!(policy.delay_for(500), Duration::ZERO);
        assert_eq!(policy.delay_for(503), Duration::ZERO);
    }

    #[test]
    fn test_retryable_statuses() {
        for status in [429, 500, 503, 504] {
            assert!(is_retryable_status(status));
        }
        for status in [200, 400, 401, 403, 404, 502] {
            assert!(!is_retryable_status(status));
        }
    }

    #[test]
    fn test_idempotent_methods() {
        assert!(HttpMethod::Get.is_idempotent());
        assert!(HttpMethod::Put.is_idempotent());
        assert!(!HttpMethod::Patch.is_idempotent());
        assert!(!HttpMethod::Post.is_idempotent());
    }
}
