//! HTTP GET with the installer's retry policy.
//!
//! Every remote call goes through [`RetryingClient`]:
//! - at most [`MAX_ATTEMPTS`] attempts;
//! - HTTP 403 and 429 are rate limiting: wait `Retry-After` seconds when the
//!   header holds a positive integer, `2^attempt` seconds otherwise;
//! - any other non-success status fails at once;
//! - transport errors (connect, timeout, broken body) back off `2^attempt`
//!   seconds and retry;
//! - cancellation is checked before every attempt and ends a backoff wait
//!   early.

use crate::core::cancel::CancelToken;
use crate::core::{InstallerError, InstallerResult};
use crate::di::Sleeper;
use crate::events::Reporter;
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as HttpClient, Response, StatusCode};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Attempts per remote call, first try included.
pub const MAX_ATTEMPTS: u32 = 3;

const USER_AGENT: &str = "ArchipelInstaller/1.0";
const ACCEPT: &str = "application/vnd.github+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// HTTP client applying the retry policy to every request.
pub struct RetryingClient {
    http: HttpClient,
    sleeper: Arc<dyn Sleeper>,
    reporter: Reporter,
}

impl RetryingClient {
    /// Client with the fixed user agent and accept headers, honouring the
    /// system proxy settings.
    pub fn new(reporter: Reporter) -> InstallerResult<Self> {
        Ok(Self::with_parts(
            default_http_client()?,
            Arc::new(TokioSleeper),
            reporter,
        ))
    }

    pub fn with_parts(http: HttpClient, sleeper: Arc<dyn Sleeper>, reporter: Reporter) -> Self {
        Self {
            http,
            sleeper,
            reporter,
        }
    }

    /// GET `url` and return the body as text.
    pub async fn get_string(&self, url: &str, cancel: &CancelToken) -> InstallerResult<String> {
        self.execute(url, "remote manifest request", cancel, |response| async move {
            Ok(response.text().await?)
        })
        .await
    }

    /// GET `url` and stream the body into `destination`, returning the
    /// number of bytes written. The body is never held in memory whole.
    pub async fn download_to_file(
        &self,
        url: &str,
        destination: &Path,
        cancel: &CancelToken,
    ) -> InstallerResult<u64> {
        self.execute(url, "archive download", cancel, |response| {
            stream_to_file(response, destination.to_path_buf(), cancel.clone())
        })
        .await
    }

    async fn execute<T, F, Fut>(
        &self,
        url: &str,
        what: &str,
        cancel: &CancelToken,
        mut consume: F,
    ) -> InstallerResult<T>
    where
        F: FnMut(Response) -> Fut,
        Fut: Future<Output = InstallerResult<T>>,
    {
        for attempt in 1..=MAX_ATTEMPTS {
            cancel.check()?;

            let outcome = match self.http.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if is_rate_limited(status) {
                        if attempt == MAX_ATTEMPTS {
                            return Err(InstallerError::network(format!(
                                "The server refused the {} (HTTP {}). Check the rate limit or proxy.",
                                what,
                                status.as_u16()
                            )));
                        }

                        let delay = retry_delay(response.headers(), attempt);
                        self.reporter.warn(format!(
                            "HTTP {} on {}, retrying in {}s.",
                            status.as_u16(),
                            what,
                            delay.as_secs()
                        ));
                        self.wait(delay, cancel).await?;
                        continue;
                    }

                    if !status.is_success() {
                        return Err(InstallerError::network(format!(
                            "The {} failed (HTTP {}).",
                            what,
                            status.as_u16()
                        )));
                    }

                    consume(response).await
                }
                Err(e) => Err(InstallerError::Http(e)),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(InstallerError::Http(e)) => {
                    if attempt == MAX_ATTEMPTS {
                        return Err(InstallerError::network_with(
                            format!("Network error during the {}.", what),
                            e,
                        ));
                    }

                    let delay = backoff(attempt);
                    self.reporter.warn(format!(
                        "Attempt {}/{} of the {} failed: {}. Retrying in {}s.",
                        attempt,
                        MAX_ATTEMPTS,
                        what,
                        e,
                        delay.as_secs()
                    ));
                    self.wait(delay, cancel).await?;
                }
                Err(other) => return Err(other),
            }
        }

        Err(InstallerError::network(format!(
            "The {} did not succeed after {} attempts.",
            what, MAX_ATTEMPTS
        )))
    }

    /// Sleep for `delay` unless cancellation arrives first.
    async fn wait(&self, delay: Duration, cancel: &CancelToken) -> InstallerResult<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(InstallerError::Cancelled),
            _ = self.sleeper.sleep(delay) => Ok(()),
        }
    }
}

/// reqwest client with the installer's headers and timeout.
pub fn default_http_client() -> InstallerResult<HttpClient> {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));

    HttpClient::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| InstallerError::network_with("Failed to create HTTP client", e))
}

fn is_rate_limited(status: StatusCode) -> bool {
    status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS
}

/// `2^attempt` seconds.
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.pow(attempt))
}

/// `Retry-After` when it is a positive integer, exponential backoff otherwise.
fn retry_delay(headers: &HeaderMap, attempt: u32) -> Duration {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|seconds| *seconds > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| backoff(attempt))
}

async fn stream_to_file(
    mut response: Response,
    destination: PathBuf,
    cancel: CancelToken,
) -> InstallerResult<u64> {
    let mut file = tokio::fs::File::create(&destination).await?;
    let mut written = 0u64;

    while let Some(chunk) = response.chunk().await? {
        cancel.check()?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}
