//! HTTP fetcher for catalogue lookups
//!
//! One `fetch` performs one lookup: a GET against the search URL with a
//! bounded timeout, retried with exponential backoff on transient
//! failures. All outcomes come back as typed results; nothing escapes
//! this boundary as an error.

use crate::config::{CatalogConfig, CrawlerConfig};
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Cap on a single backoff sleep.
const MAX_BACKOFF_MS: u64 = 10_000;

/// A successfully fetched catalogue page, ready for extraction.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Final URL the body was served from (after redirects).
    pub source_url: String,
    /// Page body.
    pub body: String,
}

/// How a fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, connection failure, or server-side error; a retry might
    /// have succeeded but the attempt limit ran out.
    Transient,
    /// The service said the item does not exist (HTTP 404).
    NotFound,
}

/// A classified fetch failure.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub url: String,
    /// Attempts actually made, including the failing one.
    pub attempts: u32,
    pub message: String,
}

/// Result of one lookup.
#[derive(Debug)]
pub enum FetchOutcome {
    Document(RawDocument),
    Failure(FetchFailure),
}

/// Per-attempt classification, internal to the retry loop.
enum AttemptError {
    /// Worth retrying: timeout, connect failure, 429, 5xx.
    Retryable(String),
    /// Not worth retrying: unexpected but stable status.
    Fatal(String),
    /// HTTP 404.
    NotFound,
}

/// Builds the shared HTTP client for catalogue requests.
pub fn build_http_client(
    catalog: &CatalogConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(catalog.user_agent.clone())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs catalogue lookups with retry and backoff.
pub struct Fetcher {
    client: Client,
    max_attempts: u32,
    retry_base_delay: Duration,
    requests_sent: AtomicU64,
}

impl Fetcher {
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            max_attempts: config.max_attempts.max(1),
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
            requests_sent: AtomicU64::new(0),
        }
    }

    /// Total HTTP requests sent, across all lookups and retries.
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent.load(Ordering::Relaxed)
    }

    /// Fetches one lookup URL.
    ///
    /// Retries transient failures up to the configured attempt limit with
    /// exponentially growing, jittered delays. Cancellation is honored
    /// between attempts and during backoff sleeps; a request already on
    /// the wire is left to finish on its own.
    pub async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> FetchOutcome {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.try_fetch(url).await {
                Ok(doc) => return FetchOutcome::Document(doc),

                Err(AttemptError::NotFound) => {
                    return FetchOutcome::Failure(FetchFailure {
                        kind: FailureKind::NotFound,
                        url: url.to_string(),
                        attempts: attempt,
                        message: "HTTP 404".to_string(),
                    });
                }

                Err(AttemptError::Fatal(message)) => {
                    return FetchOutcome::Failure(FetchFailure {
                        kind: FailureKind::Transient,
                        url: url.to_string(),
                        attempts: attempt,
                        message,
                    });
                }

                Err(AttemptError::Retryable(message)) => {
                    if attempt >= self.max_attempts {
                        tracing::warn!(
                            "Giving up on {} after {} attempts: {}",
                            url,
                            attempt,
                            message
                        );
                        return FetchOutcome::Failure(FetchFailure {
                            kind: FailureKind::Transient,
                            url: url.to_string(),
                            attempts: attempt,
                            message,
                        });
                    }

                    if cancel.is_cancelled() {
                        return FetchOutcome::Failure(FetchFailure {
                            kind: FailureKind::Transient,
                            url: url.to_string(),
                            attempts: attempt,
                            message: format!("cancelled after attempt {}: {}", attempt, message),
                        });
                    }

                    let delay = backoff_delay(self.retry_base_delay, attempt);
                    tracing::debug!(
                        "Attempt {} for {} failed ({}), retrying in {:?}",
                        attempt,
                        url,
                        message,
                        delay
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return FetchOutcome::Failure(FetchFailure {
                                kind: FailureKind::Transient,
                                url: url.to_string(),
                                attempts: attempt,
                                message: format!(
                                    "cancelled during backoff after attempt {}: {}",
                                    attempt, message
                                ),
                            });
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// One GET attempt, classified.
    async fn try_fetch(&self, url: &Url) -> Result<RawDocument, AttemptError> {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                return if e.is_timeout() {
                    Err(AttemptError::Retryable("request timeout".to_string()))
                } else if e.is_connect() {
                    Err(AttemptError::Retryable("connection failed".to_string()))
                } else if e.is_request() {
                    Err(AttemptError::Retryable(e.to_string()))
                } else {
                    Err(AttemptError::Fatal(e.to_string()))
                };
            }
        };

        let status = response.status();
        let final_url = response.url().to_string();

        if status == StatusCode::NOT_FOUND {
            return Err(AttemptError::NotFound);
        }

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(AttemptError::Retryable(format!("HTTP {}", status.as_u16())));
        }

        if !status.is_success() {
            return Err(AttemptError::Fatal(format!("HTTP {}", status.as_u16())));
        }

        match response.text().await {
            Ok(body) => Ok(RawDocument {
                source_url: final_url,
                body,
            }),
            Err(e) => Err(AttemptError::Retryable(format!("body read failed: {}", e))),
        }
    }
}

/// Backoff for the sleep after `attempt` failures: base * 2^(attempt-1),
/// capped, plus up to 20% random jitter.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let base_ms = base.as_millis() as u64;
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    let exp = base_ms.saturating_mul(factor);
    let capped = exp.min(MAX_BACKOFF_MS);
    let jitter = if capped >= 10 {
        fastrand::u64(0..=(capped / 5))
    } else {
        0
    };
    Duration::from_millis(capped + jitter)
}
