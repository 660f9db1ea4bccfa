//! Gemini REST client
//!
//! Talks to the generative language API for text generation and uses the
//! token-counting endpoint as a lightweight health probe.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::oracle::{ModelProbe, OracleError, TextOracle};
use crate::config::OracleConfig;

const PROBE_TEXT: &str = "health_check";

/// Each backoff delay is drawn from +/- 50% of the nominal interval
const RETRY_RANDOMIZATION: f64 = 0.5;

/// Retry bounds for transient failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

/// Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct ContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl<'a> ContentRequest<'a> {
    fn single(text: &'a str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text }],
            }],
        }
    }
}

impl GeminiClient {
    /// Create a client from configuration; a missing API key is an error
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = config.resolve_api_key().ok_or(OracleError::MissingApiKey)?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| OracleError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                initial_delay: Duration::from_millis(config.initial_retry_delay_ms),
                max_delay: Duration::from_millis(config.max_retry_delay_ms),
            },
        })
    }

    /// Bind the client to one model
    pub fn oracle(&self, model: impl Into<String>) -> GeminiOracle {
        GeminiOracle {
            client: self.clone(),
            model: model.into(),
        }
    }

    fn endpoint(&self, model: &str, action: &str) -> String {
        endpoint_url(&self.base_url, model, action)
    }

    /// Generate text for a prompt, retrying transient failures
    pub async fn generate_content(&self, model: &str, prompt: &str) -> Result<String, OracleError> {
        let url = self.endpoint(model, "generateContent");
        let url = url.as_str();
        self.with_retry(move || async move {
            let response: GenerateContentResponse =
                self.post_json(url, &ContentRequest::single(prompt)).await?;
            response_text(response)
        })
        .await
    }

    /// Count tokens of a fixed text; succeeds only if the model is usable
    pub async fn count_tokens(&self, model: &str) -> Result<(), OracleError> {
        let url = self.endpoint(model, "countTokens");
        let _: serde_json::Value = self.post_json(&url, &ContentRequest::single(PROBE_TEXT)).await?;
        Ok(())
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, OracleError>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OracleError::Decode(e.to_string()))
    }

    /// Run `operation`, retrying transient failures with jittered
    /// exponential backoff up to `max_retries` times
    async fn with_retry<T, F, Fut>(&self, mut operation: F) -> Result<T, OracleError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OracleError>>,
    {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.retry.initial_delay)
            .with_max_interval(self.retry.max_delay)
            .with_multiplier(2.0)
            .with_randomization_factor(RETRY_RANDOMIZATION)
            .with_max_elapsed_time(None)
            .build();

        let max_retries = self.retry.max_retries;
        let mut attempt = 0;
        let mut retries = 0;
        backoff::future::retry_notify(
            backoff,
            || {
                attempt += 1;
                let call = operation();
                let attempt = attempt;
                async move { call.await.map_err(|e| classify(e, attempt, max_retries)) }
            },
            |e: OracleError, delay: Duration| {
                retries += 1;
                tracing::warn!(
                    "Oracle call failed, retrying in {:?} (retry {}/{}): {}",
                    delay,
                    retries,
                    max_retries,
                    e
                );
            },
        )
        .await
    }
}

/// Transient errors are retried while attempts remain; everything else is final
fn classify(error: OracleError, attempt: u32, max_retries: u32) -> backoff::Error<OracleError> {
    if error.is_retryable() && attempt <= max_retries {
        backoff::Error::transient(error)
    } else {
        backoff::Error::permanent(error)
    }
}

/// Build `{base}/models/{id}:{action}`; a leading `models/` in the id is dropped
fn endpoint_url(base_url: &str, model: &str, action: &str) -> String {
    let id = model.strip_prefix("models/").unwrap_or(model);
    format!("{}/models/{}:{}", base_url, id, action)
}

fn map_transport_error(e: reqwest::Error) -> OracleError {
    if e.is_timeout() {
        OracleError::Timeout
    } else if e.is_decode() {
        OracleError::Decode(e.to_string())
    } else {
        OracleError::Connection(e.to_string())
    }
}

/// Concatenated text parts of the first candidate
fn response_text(response: GenerateContentResponse) -> Result<String, OracleError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(OracleError::EmptyResponse);
    }
    Ok(text.to_string())
}

#[async_trait]
impl ModelProbe for GeminiClient {
    async fn probe(&self, model: &str) -> Result<(), OracleError> {
        self.count_tokens(model).await
    }
}

/// Gemini client bound to the model chosen at startup
#[derive(Clone)]
pub struct GeminiOracle {
    client: GeminiClient,
    model: String,
}

#[async_trait]
impl TextOracle for GeminiOracle {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        self.client.generate_content(&self.model, prompt).await
    }
}
