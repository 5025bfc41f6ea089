use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};

use crate::error::LLMError;

use super::{DynHttpTransport, HttpRequest, HttpResponse, HttpTransport};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client with a connect timeout only. Generation calls can legitimately run for
    /// minutes, so total request time is left to the caller.
    pub fn default_client() -> Result<Self, LLMError> {
        Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map(Self::new)
            .map_err(|err| LLMError::transport(format!("failed to create reqwest client: {err}")))
    }

    fn build_request(&self, request: HttpRequest) -> Result<RequestBuilder, LLMError> {
        Ok(self
            .client
            .post(&request.url)
            .headers(header_map(request.headers)?)
            .body(request.body))
    }
}

/// Header problems come from configuration or credentials, never from the network.
fn header_map(headers: HashMap<String, String>) -> Result<HeaderMap, LLMError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|err| LLMError::Validation {
                message: format!("invalid header name `{name}`: {err}"),
            })?;
        // The value may be a secret; only the header name goes into the message.
        let header_value = HeaderValue::from_str(&value).map_err(|_| LLMError::Validation {
            message: format!("invalid characters in header `{header_name}`"),
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

fn describe(err: &reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_body() || err.is_decode() {
        "failed to read response body"
    } else {
        "request failed"
    };
    match err.url() {
        Some(url) => format!("{kind} for {}{}: {err}", url.origin().ascii_serialization(), url.path()),
        None => format!("{kind}: {err}"),
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, LLMError> {
        let response = self
            .build_request(request)?
            .send()
            .await
            .map_err(|err| LLMError::transport(describe(&err)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| LLMError::transport(describe(&err)))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

/// Shareable transport over [`ReqwestTransport::default_client`].
pub fn default_dyn_transport() -> Result<DynHttpTransport, LLMError> {
    Ok(Arc::new(ReqwestTransport::default_client()?))
}
