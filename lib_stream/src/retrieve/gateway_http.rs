//! # Gateway HTTP Client
//!
//! A small asynchronous JSON client around `reqwest`. It performs exactly one
//! request per call (no retry middleware: credential failures must surface
//! immediately) and reports non-2xx answers as data rather than errors.

use std::time::Duration;

use anyhow::Context;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Serialize};

/// Request timeout applied when the caller does not pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A standardized container for API responses.
///
/// This struct wraps the deserialized data along with the status of the
/// HTTP transaction.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The successfully deserialized response body, if any.
    pub data: Option<T>,
    /// The raw error body returned by the server if the request failed.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Indicates if the status code was in the 2xx range.
    pub success: bool,
}

/// JSON-over-HTTP client used for the credential exchange.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: reqwest::Client,
}

impl ApiClient {
    /// Builds a client that identifies itself with `user_agent`. With
    /// `direct` set, system proxy settings are ignored.
    pub fn new(user_agent: &str, timeout: Duration, direct: bool) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout);
        if direct {
            builder = builder.no_proxy();
        }
        let inner = builder.build().context("failed to build HTTP client")?;
        Ok(Self { inner })
    }

    /// POSTs `body` as JSON to `url` and decodes a 2xx answer as `T`.
    ///
    /// # Errors
    /// Network failures and 2xx bodies that are not valid JSON for `T`.
    pub async fn post_json<T, B>(&self, url: &str, body: &B) -> anyhow::Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        // 1. Serialize the request body
        let json_body = serde_json::to_string(body)?;

        // 2. Execute the request and capture response metadata
        let response = self
            .inner
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(json_body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;

        let status = response.status();
        let text = response.text().await.context("failed to read response body")?;

        // 3. Decode 2xx bodies; keep anything else as text for diagnostics
        if status.is_success() {
            let data = serde_json::from_str::<T>(&text)
                .with_context(|| format!("response body is not valid JSON: {:.200}", text))?;
            Ok(ApiResponse {
                data: Some(data),
                error_body: None,
                status: status.as_u16(),
                success: true,
            })
        } else {
            Ok(ApiResponse {
                data: None,
                error_body: Some(text),
                status: status.as_u16(),
                success: false,
            })
        }
    }
}
