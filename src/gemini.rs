//! Minimal Gemini client for structured JSON generation.
//!
//! We only call `models/{model}:generateContent` and always request
//! `application/json` with an explicit response schema. Calls are instrumented and
//! log model name, latency, token usage and response size (not contents).
//!
//! NOTE: the API key travels in a header and is never logged.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::config::GeminiSettings;
use crate::error::ModelError;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// One structured-output request: a full instruction plus the shape to answer in.
#[derive(Clone, Debug)]
pub struct StructuredRequest {
  /// Short label for logs ("generate_quiz", ...).
  pub stage: &'static str,
  pub prompt: String,
  pub schema: Value,
}

/// The seam between the evaluation operations and whatever produces JSON text.
#[async_trait]
pub trait TextModel: Send + Sync {
  /// Returns the raw JSON document produced for `request`.
  async fn generate_json(&self, request: StructuredRequest) -> Result<String, ModelError>;
}

#[derive(Clone, Debug)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub base_backoff: Duration,
  pub max_backoff: Duration,
  pub jitter_max: Duration,
}

impl RetryPolicy {
  pub fn with_attempts(max_attempts: u32) -> Self {
    Self {
      max_attempts: max_attempts.max(1),
      base_backoff: Duration::from_millis(500),
      max_backoff: Duration::from_secs(8),
      jitter_max: Duration::from_millis(250),
    }
  }

  /// Delay before attempt `attempt + 1`, given `attempt` (1-based) just failed.
  pub fn backoff(&self, attempt: u32) -> Duration {
    let exp = self
      .base_backoff
      .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
    let jitter_ms = self.jitter_max.as_millis() as u64;
    let jitter = if jitter_ms == 0 {
      Duration::ZERO
    } else {
      Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    };
    exp.min(self.max_backoff) + jitter
  }
}

#[derive(Clone)]
pub struct GeminiClient {
  client: reqwest::Client,
  api_key: String,
  pub base_url: String,
  pub model: String,
  retry: RetryPolicy,
}

impl GeminiClient {
  pub fn new(settings: &GeminiSettings) -> Result<Self, ModelError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(60))
      .build()?;
    Ok(Self {
      client,
      api_key: settings.api_key.clone(),
      base_url: settings.base_url.trim_end_matches('/').to_string(),
      model: settings.model.clone(),
      retry: RetryPolicy::with_attempts(settings.max_attempts),
    })
  }

  fn endpoint(&self) -> String {
    format!("{}/models/{}:generateContent", self.base_url, self.model)
  }

  #[instrument(level = "info", skip(self, request), fields(stage = request.stage, model = %self.model, prompt_len = request.prompt.len()))]
  async fn generate_once(&self, request: &StructuredRequest) -> Result<String, ModelError> {
    let body = GenerateContentRequest {
      contents: vec![Content {
        role: "user".into(),
        parts: vec![Part { text: request.prompt.clone() }],
      }],
      generation_config: GenerationConfig {
        response_mime_type: "application/json".into(),
        response_schema: request.schema.clone(),
      },
    };

    let start = Instant::now();
    let res = self
      .client
      .post(self.endpoint())
      .header(USER_AGENT, "prompt-practice/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(API_KEY_HEADER, &self.api_key)
      .json(&body)
      .send()
      .await?;

    if !res.status().is_success() {
      let status = res.status();
      let text = res.text().await.unwrap_or_default();
      let message = extract_api_error(&text).unwrap_or(text);
      return Err(ModelError::Api { status: status.as_u16(), message });
    }

    let body: GenerateContentResponse = res.json().await?;
    if let Some(usage) = &body.usage_metadata {
      info!(
        prompt_tokens = ?usage.prompt_token_count,
        candidates_tokens = ?usage.candidates_token_count,
        total_tokens = ?usage.total_token_count,
        "Gemini usage"
      );
    }

    let text = body
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
      .filter(|t| !t.trim().is_empty())
      .ok_or(ModelError::EmptyCandidate)?;

    let cleaned = strip_json_fence(&text).to_string();
    info!(elapsed = ?start.elapsed(), response_len = cleaned.len(), "Model response received");
    Ok(cleaned)
  }
}

#[async_trait]
impl TextModel for GeminiClient {
  async fn generate_json(&self, request: StructuredRequest) -> Result<String, ModelError> {
    let mut attempt = 1;
    loop {
      match self.generate_once(&request).await {
        Ok(text) => return Ok(text),
        Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
          let delay = self.retry.backoff(attempt);
          warn!(target: "gemini", stage = request.stage, attempt, max = self.retry.max_attempts, ?delay, error = %e, "Model call failed; retrying");
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        Err(e) => {
          error!(target: "gemini", stage = request.stage, attempt, error = %e, "Model call failed");
          return Err(e);
        }
      }
    }
  }
}

/// Models sometimes wrap JSON in a markdown fence even in JSON mode.
fn strip_json_fence(text: &str) -> &str {
  let trimmed = text.trim();
  let Some(rest) = trimmed.strip_prefix("```") else { return trimmed };
  let rest = rest.strip_prefix("json").unwrap_or(rest);
  rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Try to extract a clean error message from a Gemini error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

// --- generateContent DTOs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
  contents: Vec<Content>,
  generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content { role: String, parts: Vec<Part> }
#[derive(Serialize)]
struct Part { text: String }

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  response_mime_type: String,
  response_schema: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)] candidates: Vec<Candidate>,
  #[serde(default)] usage_metadata: Option<UsageMetadata>,
}
#[derive(Deserialize)]
struct Candidate { #[serde(default)] content: Option<CandidateContent> }
#[derive(Deserialize)]
struct CandidateContent { #[serde(default)] parts: Vec<CandidatePart> }
#[derive(Deserialize)]
struct CandidatePart { #[serde(default)] text: Option<String> }
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)] prompt_token_count: Option<u32>,
  #[serde(default)] candidates_token_count: Option<u32>,
  #[serde(default)] total_token_count: Option<u32>,
}
