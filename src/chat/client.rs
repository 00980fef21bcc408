use std::time::{Duration, Instant};

use backon::{ExponentialBuilder, Retryable};
use log::{debug, info};
use serde_json::json;

use crate::error::{Error, Result};
use crate::utils::config::LLMConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Internal split between "worth retrying" and "surface immediately" so the
/// retry policy only ever covers transient overload conditions.
#[derive(Debug)]
enum CallError {
    Retryable(String),
    Fatal(Error),
}

/// Thin wrapper around the hosted messages API. One prompt in, one text
/// response out; no caching, no deduplication. Transient overload statuses are
/// retried a small fixed number of times, everything else surfaces as
/// [`Error::Completion`] on the first attempt.
pub struct CompletionClient {
    client: reqwest::Client,
    api_key: String,
    config: LLMConfig,
}

impl CompletionClient {
    pub fn new(config: LLMConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                Error::Completion(
                    "no API key configured (set llm.api_key or ANTHROPIC_API_KEY)".to_string(),
                )
            })?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            config,
        })
    }

    /// Sends one prompt and returns the text of the response. Logs call
    /// duration and token counts for every round trip.
    pub async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let start = Instant::now();

        let body = (|| async { self.attempt(prompt, max_tokens).await })
            .retry(self.backoff())
            .when(|e| matches!(e, CallError::Retryable(_)))
            .await
            .map_err(|e| match e {
                CallError::Retryable(msg) => {
                    Error::Completion(format!("retries exhausted: {msg}"))
                }
                CallError::Fatal(err) => err,
            })?;

        let text = body
            .get("content")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| Error::Completion("missing text in API response".to_string()))?
            .to_string();

        let duration = start.elapsed();
        let input_tokens = body
            .pointer("/usage/input_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let output_tokens = body
            .pointer("/usage/output_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        info!(
            "completion returned in {:.2}s (input tokens: {}, output tokens: {})",
            duration.as_secs_f64(),
            input_tokens,
            output_tokens
        );
        if self.config.verbose_prompt {
            debug!("prompt: {}", single_line(prompt));
        } else {
            debug!("prompt: {}...", single_line(&truncate(prompt, 60)));
        }
        if self.config.verbose_output {
            debug!("output: {}", single_line(&text));
        } else {
            debug!("output: {}...", single_line(&truncate(&text, 60)));
        }

        Ok(text)
    }

    async fn attempt(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> std::result::Result<serde_json::Value, CallError> {
        let request_body = json!({
            "model": self.config.model,
            "max_tokens": max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| CallError::Retryable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            if overloaded_status(status.as_u16()) || error_body.contains("overloaded_error") {
                return Err(CallError::Retryable(format!("HTTP {status}: {error_body}")));
            }
            return Err(CallError::Fatal(Error::Completion(format!(
                "HTTP {status}: {error_body}"
            ))));
        }

        response
            .json()
            .await
            .map_err(|e| CallError::Fatal(Error::Completion(e.to_string())))
    }

    fn backoff(&self) -> ExponentialBuilder {
        let base = ExponentialBuilder::default()
            .with_min_delay(Duration::from_secs(self.config.retry_delay_secs))
            .with_max_times(self.config.max_retries as usize);

        if self.config.exponential_backoff {
            base.with_jitter()
        } else {
            base.with_factor(1.0)
        }
    }
}

/// Statuses the API uses for transient overload (rate limit, server busy).
fn overloaded_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 503 | 529)
}

fn single_line(text: &str) -> String {
    text.replace('\n', " ")
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String, max_retries: u32) -> LLMConfig {
        LLMConfig {
            api_key: Some("test-key".to_string()),
            model: "test-model".to_string(),
            endpoint,
            max_retries,
            retry_delay_secs: 0,
            exponential_backoff: false,
            max_tokens: 256,
            verbose_prompt: false,
            verbose_output: false,
        }
    }

    fn success_body() -> serde_json::Value {
        json!({
            "content": [{"type": "text", "text": "Senior Data Scientist"}],
            "usage": {"input_tokens": 42, "output_tokens": 7}
        })
    }

    #[test]
    fn overload_statuses_are_retryable() {
        assert!(overloaded_status(429));
        assert!(overloaded_status(529));
        assert!(!overloaded_status(400));
        assert!(!overloaded_status(401));
    }

    #[tokio::test]
    async fn returns_response_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let client = CompletionClient::new(config(server.uri(), 3)).unwrap();
        let text = client.complete("title this role", 256).await.unwrap();
        assert_eq!(text, "Senior Data Scientist");
    }

    #[tokio::test]
    async fn retries_overloaded_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_string(
                r#"{"error": {"type": "overloaded_error", "message": "Overloaded"}}"#,
            ))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let client = CompletionClient::new(config(server.uri(), 3)).unwrap();
        let text = client.complete("prompt", 256).await.unwrap();
        assert_eq!(text, "Senior Data Scientist");
    }

    #[tokio::test]
    async fn non_retryable_error_surfaces_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"error": {"type": "invalid_request_error", "message": "bad"}}"#,
            ))
            .mount(&server)
            .await;

        let client = CompletionClient::new(config(server.uri(), 3)).unwrap();
        let err = client.complete("prompt", 256).await.unwrap_err();
        assert!(matches!(err, Error::Completion(_)));
        // one request only, no retries for a 400
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
