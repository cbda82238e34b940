//! Error types shared across the backend.

use thiserror::Error;

/// Failure talking to the generative model, or making sense of what it sent.
#[derive(Error, Debug)]
pub enum ModelError {
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("model API error {status}: {message}")]
  Api { status: u16, message: String },

  #[error("model returned no text candidate")]
  EmptyCandidate,

  /// The response was readable but did not match the requested shape.
  #[error("malformed response: {0}")]
  Malformed(String),
}

impl ModelError {
  /// Transport faults, throttling and server errors may clear up on retry.
  /// Other 4xx answers and shape violations will not.
  pub fn is_retryable(&self) -> bool {
    match self {
      ModelError::Transport(_) | ModelError::EmptyCandidate => true,
      ModelError::Api { status, .. } => matches!(*status, 408 | 429 | 500..=599),
      ModelError::Malformed(_) => false,
    }
  }
}

/// Failures of the four remote evaluation operations.
#[derive(Error, Debug)]
pub enum AiError {
  #[error("could not generate exercise: {0}")]
  Generation(#[source] ModelError),

  #[error("could not evaluate attempt: {0}")]
  Evaluation(#[source] ModelError),

  #[error("prompt is blank")]
  BlankPrompt,

  #[error("invalid submission: {0}")]
  InvalidSubmission(String),
}

impl AiError {
  pub fn is_malformed(&self) -> bool {
    matches!(
      self,
      AiError::Generation(ModelError::Malformed(_)) | AiError::Evaluation(ModelError::Malformed(_))
    )
  }
}

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("history I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("history JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("GEMINI_API_KEY is not set")]
  MissingApiKey,

  #[error("failed to read {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Toml {
    path: String,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid configuration: {0}")]
  Invalid(String),
}
