use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{info, warn};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};

use crate::error::{Error, Result};
use crate::utils::config::ScrapeConfig;

/// Browser-like user agents rotated across requests to reduce the chance of
/// the target site blocking the scrape.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

/// HTTP fetcher shared by the job-board scrapers. Retries transient statuses
/// (429/5xx) up to the configured budget, waiting at least the server's
/// `Retry-After` when one is sent. Anything else fails on the first attempt.
pub struct Fetcher {
    client: reqwest::Client,
    config: ScrapeConfig,
}

impl Fetcher {
    pub fn new(config: ScrapeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<String> {
        let mut last_error = String::new();

        for attempt in 0..self.config.max_retries {
            // courtesy delay before each request, jittered
            let delay = jitter_delay(
                self.config.min_request_delay_ms,
                self.config.max_request_delay_ms,
            );
            tokio::time::sleep(delay).await;

            let response = self
                .client
                .get(url)
                .headers(browser_headers())
                .timeout(Duration::from_secs(10))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    info!("fetched {}", url);
                    return Ok(resp.text().await?);
                }
                Ok(resp) if retryable_status(resp.status()) => {
                    let wait = retry_after(resp.headers())
                        .unwrap_or_else(|| self.backoff_delay(attempt));
                    last_error = format!("HTTP {}", resp.status());
                    warn!(
                        "transient {} from {}, retrying in {:?} (attempt {}/{})",
                        resp.status(),
                        url,
                        wait,
                        attempt + 1,
                        self.config.max_retries
                    );
                    tokio::time::sleep(wait).await;
                }
                Ok(resp) => {
                    return Err(Error::Fetch(format!("{url}: HTTP {}", resp.status())));
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    last_error = e.to_string();
                    let wait = self.backoff_delay(attempt);
                    warn!("request error for {url}: {e}, retrying in {wait:?}");
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::Fetch(format!(
            "{url}: exhausted {} attempts ({last_error})",
            self.config.max_retries
        )))
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = Duration::from_secs(self.config.base_delay_secs);
        if self.config.exponential_backoff {
            base * 2u32.saturating_pow(attempt)
        } else {
            base
        }
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(pick_user_agent()));
    headers.insert(
        "Accept",
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert("Accept-Language", HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert("DNT", HeaderValue::from_static("1"));
    headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
    headers
}

fn pick_user_agent() -> &'static str {
    USER_AGENTS[subsecond_nanos() as usize % USER_AGENTS.len()]
}

/// Parses a seconds-valued `Retry-After` header.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

pub fn retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Picks a delay within `[min_ms, max_ms]` using clock nanoseconds as the
/// jitter source. Not correctness-critical, only anti-blocking.
pub fn jitter_delay(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    let span = max_ms - min_ms + 1;
    Duration::from_millis(min_ms + subsecond_nanos() % span)
}

fn subsecond_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0)
}
