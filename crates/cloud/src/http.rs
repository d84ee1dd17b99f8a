//! JSON-over-HTTP wrapper with retry logic.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{CloudError, Result};

/// HTTP client bound to the service base URL.
pub struct HttpClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    request_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(base_url: &str, request_timeout: Duration, max_retries: u32) -> Result<Self> {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(request_timeout);
        let client = builder
            .build()
            .map_err(|e| CloudError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/predictions`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.execute_with_retry(self.client.get(self.url(path))).await?;
        decode(resp).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.client.post(self.url(path)).json(body);
        let resp = self.execute_with_retry(req).await?;
        decode(resp).await
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.client.patch(self.url(path)).json(body);
        let resp = self.execute_with_retry(req).await?;
        decode(resp).await
    }

    /// DELETE a resource, discarding the response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute_with_retry(self.client.delete(self.url(path)))
            .await
            .map(|_| ())
    }

    /// Execute a request with exponential backoff retry.
    ///
    /// Timeouts, connection failures and 5xx responses are retried; other
    /// 4xx responses fail immediately.
    async fn execute_with_retry(&self, request: RequestBuilder) -> Result<Response> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                debug!(attempt, ?delay, "retrying request");
                sleep(delay).await;
            }

            let Some(cloned) = request.try_clone() else {
                // Streaming bodies cannot be replayed: single shot.
                let resp = request.send().await?;
                return check_status(resp).await;
            };

            match cloned.send().await {
                Ok(resp) if resp.status().is_server_error() => {
                    last_err = Some(error_from_response(resp).await);
                }
                Ok(resp) => return check_status(resp).await,
                Err(e) if e.is_timeout() || e.is_connect() => {
                    last_err = Some(CloudError::Http(e));
                }
                Err(e) => return Err(CloudError::Http(e)),
            }
        }

        Err(last_err.unwrap_or_else(|| CloudError::Network("request failed".into())))
    }

    /// Getter for the timeout duration.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

/// Platform sleep used for retry backoff and polling.
pub(crate) async fn sleep(delay: Duration) {
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(delay).await;
    // No timer on WASM without extra deps; proceed immediately.
    #[cfg(target_arch = "wasm32")]
    let _ = delay;
}

async fn check_status(resp: Response) -> Result<Response> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(error_from_response(resp).await)
    }
}

/// Build an [`CloudError::Api`] from a failed response.
///
/// The service reports errors as `{"detail": ...}`; fall back to the raw body.
async fn error_from_response(resp: Response) -> CloudError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    CloudError::Api {
        status: status.as_u16(),
        message: error_message(status, &body),
    }
}

pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("detail") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        });
    match detail {
        Some(d) => d,
        None if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("An error occurred")
            .to_string(),
        None => body.chars().take(500).collect(),
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let url = resp.url().to_string();
    let body = resp
        .text()
        .await
        .map_err(|e| CloudError::Network(format!("reading response body: {e}")))?;
    serde_json::from_str(&body).map_err(|e| CloudError::Decode(format!("{url}: {e}")))
}
