//! Core HTTP operations with rate limiting and retry logic
//!
//! Every request the application makes goes through [`HttpHandler`], which
//! paces requests with a token-bucket limiter and retries connection errors,
//! HTTP 429 and HTTP 503 with exponential backoff. Retries only ever happen
//! before a response body is handed to the caller.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Jitter, Quota, RateLimiter};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, Method, Response, StatusCode};
use url::Url;

use crate::app::client::config::ClientConfig;
use crate::errors::{DownloadError, DownloadResult};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// What the request timeout bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deadline {
    /// The whole exchange, body included
    WholeRequest,
    /// Only the wait for response headers; the caller paces the body
    Headers,
}

/// HTTP operations handler with resilience patterns
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: DirectLimiter,
    max_retries: u32,
    retry_base_delay: Duration,
    request_timeout: Duration,
    read_timeout: Duration,
}

impl HttpHandler {
    /// Creates a new HttpHandler from a built client and its configuration
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::InvalidRateLimit` if the configured rate is zero
    pub fn new(client: Client, config: &ClientConfig) -> DownloadResult<Self> {
        let rate_limiter = Self::build_rate_limiter(config.rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
            request_timeout: config.request_timeout,
            read_timeout: config.read_timeout,
        })
    }

    /// Builds the rate limiter with the specified rate limit
    fn build_rate_limiter(rate_limit_rps: u32) -> DownloadResult<DirectLimiter> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or(DownloadError::InvalidRateLimit {
            rps: rate_limit_rps,
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    /// Longest gap allowed between body chunks of a download
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        backoff_delay(self.retry_base_delay, attempt)
    }

    /// Sends a request with rate limiting and retry logic
    ///
    /// The returned response has a status that is not 429 or 503; other
    /// statuses are left for the caller to interpret.
    async fn send(
        &self,
        method: Method,
        url: &Url,
        deadline: Deadline,
    ) -> DownloadResult<Response> {
        let mut retries = 0;
        loop {
            // Apply rate limiting with jitter
            self.rate_limiter
                .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
                .await;

            let request = self.client.request(method.clone(), url.as_str());
            let sent = match deadline {
                Deadline::WholeRequest => request.timeout(self.request_timeout).send().await,
                Deadline::Headers => {
                    match tokio::time::timeout(self.request_timeout, request.send()).await {
                        Ok(sent) => sent,
                        Err(_) => {
                            return Err(DownloadError::Timeout {
                                url: url.to_string(),
                                timeout: self.request_timeout,
                            })
                        }
                    }
                }
            };

            match sent {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::SERVICE_UNAVAILABLE
                    {
                        if retries < self.max_retries {
                            retries += 1;
                            let delay = self.retry_delay(retries);
                            tracing::warn!(
                                "Server responded {} for {}. Backing off for {}ms",
                                status.as_u16(),
                                url,
                                delay.as_millis()
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                            DownloadError::RateLimitExceeded
                        } else {
                            DownloadError::ServerOverloaded
                        });
                    }

                    tracing::debug!("{} {} -> {}", method, url, status);
                    return Ok(response);
                }
                Err(e) if retries < self.max_retries => {
                    retries += 1;
                    let delay = self.retry_delay(retries);
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {}ms",
                        retries,
                        self.max_retries,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if self.max_retries == 0 => return Err(DownloadError::Http(e)),
                Err(e) => {
                    tracing::error!("Request failed after {} retries: {}", self.max_retries, e);
                    return Err(DownloadError::MaxRetriesExceeded {
                        max_retries: self.max_retries,
                    });
                }
            }
        }
    }

    /// Issues a GET and checks the status, returning the unread response
    ///
    /// Only the wait for headers is bounded by the request timeout. The
    /// caller reads the body under [`read_timeout`](Self::read_timeout).
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::NotFound` for 404, `ServerError` for any other
    /// non-success status, or the transport error after retries.
    pub async fn get_response(&self, url: &Url) -> DownloadResult<Response> {
        let response = self.send(Method::GET, url, Deadline::Headers).await?;
        check_status(url, response)
    }

    /// Fetches the body of a page as text
    pub async fn get_page(&self, url: &Url) -> DownloadResult<String> {
        let response = self.send(Method::GET, url, Deadline::WholeRequest).await?;
        let response = check_status(url, response)?;
        let text = response.text().await?;
        tracing::debug!("Fetched page {} ({} bytes)", url, text.len());
        Ok(text)
    }

    /// Asks the server for a resource's size without transferring it
    ///
    /// Returns `Ok(None)` when the response carries no usable Content-Length.
    pub async fn head_content_length(&self, url: &Url) -> DownloadResult<Option<u64>> {
        let response = self.send(Method::HEAD, url, Deadline::WholeRequest).await?;
        let response = check_status(url, response)?;
        Ok(declared_content_length(&response))
    }
}

/// Exponential backoff: `base * 2^attempt`
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(attempt))
}

fn check_status(url: &Url, response: Response) -> DownloadResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status == StatusCode::NOT_FOUND {
        Err(DownloadError::NotFound {
            url: url.to_string(),
        })
    } else {
        Err(DownloadError::ServerError {
            status: status.as_u16(),
        })
    }
}

/// Content-Length as sent by the server
///
/// Read from the header rather than the body size hint, which is always zero
/// for HEAD responses.
pub fn declared_content_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}
