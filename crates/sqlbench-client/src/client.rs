// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport for the query service API.
//!
//! Provides [`ServiceClient`], which builds `/dbs/{id}/...` URLs, attaches
//! authentication, maps error bodies to [`SqlbenchError`], and optionally
//! retries transient failures.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlbench_config::model::ServiceConfig;
use sqlbench_core::{DatabaseId, SqlbenchError};
use tracing::{debug, warn};
use url::Url;

use crate::wire::ApiErrorBody;

/// Delay before the first retry; doubled on each further attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// HTTP client for the query service.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    max_retries: u32,
}

impl ServiceClient {
    /// Creates a client from the `[service]` configuration section.
    pub fn new(config: &ServiceConfig) -> Result<Self, SqlbenchError> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| {
            SqlbenchError::Config(format!(
                "invalid service.base_url `{}`: {e}",
                config.base_url
            ))
        })?;

        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                SqlbenchError::Config(format!("invalid service.api_key header value: {e}"))
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("sqlbench/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| SqlbenchError::Service {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            max_retries: config.max_retries,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `{base}/dbs/{database}/{segments...}` with each part
    /// percent-encoded as a single path segment.
    pub fn endpoint(&self, database: &DatabaseId, segments: &[&str]) -> Result<Url, SqlbenchError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                SqlbenchError::Config(format!(
                    "service.base_url `{}` cannot carry a path",
                    self.base_url
                ))
            })?;
            path.pop_if_empty().push("dbs").push(database.as_str());
            path.extend(segments);
        }
        Ok(url)
    }

    /// POSTs a JSON body and decodes a JSON response.
    pub async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, SqlbenchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send_with_retry(|| self.client.post(url.clone()).json(body))
            .await?;
        decode(response).await
    }

    /// GETs a URL and decodes a JSON response.
    pub async fn get_json<T>(&self, url: Url) -> Result<T, SqlbenchError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .send_with_retry(|| self.client.get(url.clone()))
            .await?;
        decode(response).await
    }

    /// Sends a request, retrying 429/502/503 up to `max_retries` times.
    ///
    /// Returns the first successful response; any other status becomes a
    /// [`SqlbenchError::Service`] carrying the service's own message.
    async fn send_with_retry<F>(&self, build: F) -> Result<Response, SqlbenchError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            if attempt > 0 {
                let delay = RETRY_BASE_DELAY * 2u32.saturating_pow(attempt - 1);
                warn!(attempt, ?delay, "retrying request after transient error");
                tokio::time::sleep(delay).await;
            }

            let response = build().send().await.map_err(|e| self.transport_error(e))?;
            let status = response.status();
            debug!(status = %status, url = %response.url(), attempt, "response received");

            if status.is_success() {
                return Ok(response);
            }

            if is_transient(status) && attempt < self.max_retries {
                attempt += 1;
                continue;
            }

            return Err(error_from_response(response).await);
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> SqlbenchError {
        if e.is_timeout() {
            SqlbenchError::Timeout {
                duration: self.timeout,
            }
        } else {
            SqlbenchError::Service {
                message: format!("request failed: {e}"),
                status: None,
                source: Some(Box::new(e)),
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SqlbenchError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| SqlbenchError::Service {
        message: format!("failed to read response body: {e}"),
        status: Some(status.as_u16()),
        source: Some(Box::new(e)),
    })?;
    serde_json::from_str(&body).map_err(|e| SqlbenchError::Service {
        message: format!("failed to parse service response: {e}"),
        status: Some(status.as_u16()),
        source: Some(Box::new(e)),
    })
}

async fn error_from_response(response: Response) -> SqlbenchError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(api_err) => api_err.message().to_string(),
        Err(_) if body.trim().is_empty() => format!("service returned {status}"),
        Err(_) => format!("service returned {status}: {body}"),
    };
    warn!(status = %status, message = %message, "service reported an error");
    SqlbenchError::Service {
        message,
        status: Some(status.as_u16()),
        source: None,
    }
}

/// Statuses worth retrying when retries are enabled.
fn is_transient(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 502 | 503)
}
