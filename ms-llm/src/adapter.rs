use crate::error::{LlmError, Result};
use crate::provider::Provider;
use crate::types::Outcome;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::time::Instant;

/// One provider behind the uniform `(prompt, credential) -> Outcome` contract.
///
/// Implementations must not panic or propagate faults; every failure path is
/// reported as `Outcome::Failure`.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    async fn invoke(&self, prompt: &str, credential: Option<&str>) -> Outcome;
}

/// Provider-specific request and response shapes.
///
/// Everything here is pure; the network round trip is shared by
/// [`HttpAdapter`].
pub trait WireFormat: Send + Sync + 'static {
    const PROVIDER: Provider;
    const BASE_URL: &'static str;
    /// Whether the provider pads generated text with whitespace.
    const TRIM: bool;

    fn request(
        http: &reqwest::Client,
        base_url: &str,
        prompt: &str,
        api_key: &str,
    ) -> reqwest::RequestBuilder;

    /// Human-readable message from a non-success response body.
    fn error_message(body: serde_json::Value) -> Option<String>;

    /// Generated text from a success response body.
    fn extract_text(body: serde_json::Value) -> Option<String>;
}

pub struct HttpAdapter<W> {
    http: reqwest::Client,
    base_url: String,
    _wire: PhantomData<fn() -> W>,
}

impl<W: WireFormat> HttpAdapter<W> {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, W::BASE_URL)
    }

    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            _wire: PhantomData,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call(&self, prompt: &str, api_key: &str) -> Result<String> {
        let response = W::request(&self.http, &self.base_url, prompt, api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // An unreadable error body counts as no body at all.
            let message = response
                .text()
                .await
                .ok()
                .and_then(|body| serde_json::from_str::<serde_json::Value>(&body).ok())
                .and_then(W::error_message)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(LlmError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: serde_json::Value = serde_json::from_str(&body)?;
        let text = W::extract_text(parsed).ok_or(LlmError::NoContent)?;
        let text = if W::TRIM {
            text.trim().to_string()
        } else {
            text
        };
        if text.is_empty() {
            return Err(LlmError::NoContent);
        }
        Ok(text)
    }
}

#[async_trait]
impl<W: WireFormat> ProviderAdapter for HttpAdapter<W> {
    fn provider(&self) -> Provider {
        W::PROVIDER
    }

    #[tracing::instrument(level = "info", skip_all, fields(provider = %W::PROVIDER))]
    async fn invoke(&self, prompt: &str, credential: Option<&str>) -> Outcome {
        let Some(api_key) = credential.filter(|k| !k.trim().is_empty()) else {
            tracing::debug!("no credential; skipping request");
            return LlmError::NoCredential.into();
        };

        let started = Instant::now();
        let result = self.call(prompt, api_key).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(text) => tracing::info!(elapsed_ms, chars = text.len(), "provider responded"),
            Err(LlmError::Rejected { status, message }) => {
                tracing::warn!(elapsed_ms, status, %message, "provider rejected request")
            }
            Err(e) => tracing::warn!(elapsed_ms, error = %e, "provider call failed"),
        }
        result.into()
    }
}

/// `Some(s)` only when `s` is a non-empty string.
pub(crate) fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

/// Non-empty string at `key` in a JSON object.
pub(crate) fn string_field(body: &serde_json::Value, key: &str) -> Option<String> {
    non_empty(body.get(key).and_then(|v| v.as_str()).map(str::to_string))
}

/// Deserialize only `body[key][0]`; later entries are never looked at.
pub(crate) fn first<T: serde::de::DeserializeOwned>(
    body: &serde_json::Value,
    key: &str,
) -> Option<T> {
    serde_json::from_value(body.get(key)?.get(0)?.clone()).ok()
}

/// Shared by providers that answer errors with `{"error": {"message": ...}}`.
pub(crate) fn nested_error_message(body: serde_json::Value) -> Option<String> {
    body.get("error").and_then(|e| string_field(e, "message"))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for exercising adapters against a mock server.

    pub fn http() -> reqwest::Client {
        reqwest::Client::new()
    }

    /// Base URL nothing is listening on, for transport-failure cases.
    pub const DEAD_BASE_URL: &str = "http://127.0.0.1:9";

    /// Serve one request with `500` headers announcing more body than is
    /// sent, then close. Returns the base URL.
    pub async fn truncated_error_server() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&request) {
                let n = socket.read(&mut buf).await.expect("read request");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\n\
                      content-type: application/json\r\n\
                      content-length: 100\r\n\r\n{\"mes",
                )
                .await
                .expect("write response");
            socket.shutdown().await.expect("shutdown");
        });
        format!("http://{addr}")
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(end) = text.find("\r\n\r\n") else {
            return false;
        };
        let body_len = text[..end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= end + 4 + body_len
    }
}
