use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::LLMError;

/// JSON POST request handed to a transport; the only shape adapters issue.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Builds a POST request with a JSON request body.
    ///
    /// The helper sets the `Content-Type` header to `application/json` and stores the
    /// provided buffer as the body.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_relay::http::HttpRequest;
    ///
    /// let request = HttpRequest::post_json("https://example.com", br"{}".to_vec());
    /// assert_eq!(request.headers.get("Content-Type"), Some(&"application/json".to_string()));
    /// ```
    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::from([("Content-Type".to_string(), "application/json".to_string())]),
            body,
        }
    }

    /// Adds headers on top of the ones already present, replacing duplicates.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use llm_relay::http::HttpRequest;
    ///
    /// let request = HttpRequest::post_json("https://example.com", br"{}".to_vec())
    ///     .with_headers(HashMap::from([("Authorization".into(), "Bearer test".into())]));
    /// assert_eq!(request.headers.get("Authorization"), Some(&"Bearer test".to_string()));
    /// assert_eq!(request.headers.get("Content-Type"), Some(&"application/json".to_string()));
    /// ```
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }
}

/// Status and raw body of a provider reply.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body of a 2xx reply as text.
    ///
    /// Non-success replies are handed to `on_error` with the status checked first and
    /// the body decoded lossily, so the status survives even an unreadable body.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_relay::error::LLMError;
    /// use llm_relay::http::HttpResponse;
    ///
    /// let to_error = |status, body: &str| LLMError::Http {
    ///     provider: "demo",
    ///     status,
    ///     message: body.to_string(),
    /// };
    /// let ok = HttpResponse { status: 200, body: b"ok".to_vec() };
    /// assert_eq!(ok.into_text("demo", to_error).unwrap(), "ok");
    ///
    /// let denied = HttpResponse { status: 401, body: b"denied".to_vec() };
    /// assert_eq!(denied.into_text("demo", to_error).unwrap_err().status(), Some(401));
    /// ```
    ///
    /// # Errors
    ///
    /// * The error built by `on_error` for non-success statuses.
    /// * [`LLMError::Provider`] when a 2xx body is not valid UTF-8.
    pub fn into_text<F>(self, provider: &'static str, on_error: F) -> Result<String, LLMError>
    where
        F: FnOnce(u16, &str) -> LLMError,
    {
        if !self.is_success() {
            return Err(on_error(self.status, &String::from_utf8_lossy(&self.body)));
        }
        String::from_utf8(self.body).map_err(|err| {
            LLMError::provider(provider, format!("response body is not valid UTF-8: {err}"))
        })
    }
}

/// Transport abstraction used to decouple adapters from the concrete HTTP client.
///
/// Tests substitute an in-memory implementation; production code uses
/// [`reqwest::ReqwestTransport`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and resolves when the full response is available.
    ///
    /// # Examples
    ///
    /// ```
    /// # use async_trait::async_trait;
    /// # use llm_relay::http::{HttpTransport, HttpRequest, HttpResponse};
    /// # use llm_relay::error::LLMError;
    /// struct MemoryTransport;
    ///
    /// #[async_trait]
    /// impl HttpTransport for MemoryTransport {
    ///     async fn send(&self, request: HttpRequest) -> Result<HttpResponse, LLMError> {
    ///         Ok(HttpResponse { status: 200, body: request.body })
    ///     }
    /// }
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let response = MemoryTransport
    ///     .send(HttpRequest::post_json("https://example.com", br"{}".to_vec()))
    ///     .await
    ///     .unwrap();
    /// assert_eq!(response.status, 200);
    /// # });
    /// ```
    ///
    /// # Errors
    ///
    /// Implementations must map connection-level failures to [`LLMError::Transport`]
    /// so the retry controller treats them as transient. Non-success statuses are
    /// returned as ordinary responses; interpreting them is the adapter's job.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, LLMError>;
}

/// Thread-safe handle to a transport implementation.
pub type DynHttpTransport = Arc<dyn HttpTransport>;

/// Serializes a body to JSON, attaches headers, and issues a POST request.
///
/// # Errors
///
/// Returns [`LLMError::Validation`] if serialization fails or forwards the error raised by
/// [`HttpTransport::send`].
pub async fn post_json_with_headers<T: Serialize>(
    transport: &dyn HttpTransport,
    url: impl Into<String>,
    headers: HashMap<String, String>,
    body: &T,
) -> Result<HttpResponse, LLMError> {
    let payload = serde_json::to_vec(body).map_err(|err| LLMError::Validation {
        message: format!("failed to serialize request: {err}"),
    })?;
    let request = HttpRequest::post_json(url, payload).with_headers(headers);
    transport.send(request).await
}

pub mod reqwest;
