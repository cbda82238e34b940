//! Runtime configuration: environment variables plus optional TOML prompt overrides.
//!
//! See `AppConfig::from_lookup` for the variables read and their defaults, and
//! `Prompts` for the template placeholders.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_HISTORY_PATH: &str = "./data/prompt-history.json";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug)]
pub struct GeminiSettings {
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub max_attempts: u32,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
  pub port: u16,
  pub history_path: PathBuf,
  pub gemini: GeminiSettings,
  pub prompts: Prompts,
}

/// Shape of the optional file named by PROMPTS_CONFIG_PATH.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct PromptsFile {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Instruction templates sent to the model. Every template receives `{language}`;
/// the rest of the placeholders are listed per field.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  /// `{question_count}`, `{option_count}`
  pub quiz_generation: String,
  /// `{client_problem}`, `{answers_json}`
  pub quiz_evaluation: String,
  pub problem_generation: String,
  /// `{client_problem}`, `{task}`, `{desired_output}`, `{user_prompt}`
  pub prompt_evaluation: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      quiz_generation: "You are an AI assistant creating educational content for aspiring prompt engineers. \
IMPORTANT: Your entire response, including the client problem, all questions, and all options, must be in {language}. \
Generate a unique and realistic client problem scenario and {question_count} multiple-choice questions based on it. \
The questions should test knowledge of prompt engineering techniques like Zero-shot, Few-shot, Chain-of-Thought, persona adoption, or formatting instructions. \
For each question, provide {option_count} options and indicate the correct answer's index.".into(),
      quiz_evaluation: "You are an AI assistant evaluating a student's multiple-choice test on prompt engineering.
IMPORTANT: Your entire response, including all explanations and suggestions, must be in {language}.

Here is the test context:
Client Problem: \"{client_problem}\"

Here are the student's answers:
{answers_json}

For each question, determine if the user's answer was correct. Provide a clear explanation for why the answer was correct or incorrect, referencing the client problem.
Finally, provide 3 actionable, encouraging suggestions for the student to improve their prompting skills based on their performance.".into(),
      problem_generation: "You are an AI assistant creating educational content. \
IMPORTANT: Your entire response (clientProblem, task, and desiredOutput) must be in {language}. \
Generate a realistic but concise client problem scenario for a beginner prompt engineer. \
Describe the client's business, the specific task, and the desired output format.".into(),
      prompt_evaluation: "You are an expert prompt engineering instructor. \
IMPORTANT: Your entire response (feedback and suggested prompt) must be in {language}. \
A student was given the following client problem:
- Client: {client_problem}
- Task: {task}
- Desired Output: {desired_output}

The student wrote this prompt: \"{user_prompt}\"

Evaluate the student's prompt on a scale of 1-100 based on its clarity, specificity, inclusion of constraints, persona adoption (if applicable), and overall potential effectiveness for the given task. \
Provide detailed, constructive feedback explaining the score, highlighting what was done well and what could be improved. \
Offer a revised, more effective version of the prompt that an expert would write.".into(),
    }
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Build the config from any key lookup. Missing GEMINI_API_KEY is fatal so the
  /// server never starts without credentials.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let api_key = lookup("GEMINI_API_KEY")
      .filter(|k| !k.trim().is_empty())
      .ok_or(ConfigError::MissingApiKey)?;

    let port = match lookup("PORT") {
      Some(p) => p
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(format!("PORT must be a port number, got {p:?}")))?,
      None => DEFAULT_PORT,
    };

    let max_attempts = match lookup("GEMINI_MAX_ATTEMPTS") {
      Some(n) => match n.parse::<u32>() {
        Ok(n) if n >= 1 => n,
        _ => return Err(ConfigError::Invalid(format!("GEMINI_MAX_ATTEMPTS must be >= 1, got {n:?}"))),
      },
      None => 1,
    };

    let prompts = match lookup("PROMPTS_CONFIG_PATH") {
      Some(path) => load_prompts(&path)?,
      None => Prompts::default(),
    };

    Ok(Self {
      port,
      history_path: lookup("HISTORY_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_PATH)),
      gemini: GeminiSettings {
        api_key,
        base_url: lookup("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
        model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
        max_attempts,
      },
      prompts,
    })
  }
}

/// Read prompt overrides. Unlike an absent variable, a named file that fails to
/// load stops startup.
pub fn load_prompts(path: &str) -> Result<Prompts, ConfigError> {
  let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.into(), source })?;
  let file: PromptsFile =
    toml::from_str(&raw).map_err(|source| ConfigError::Toml { path: path.into(), source })?;
  info!(target: "prompt_practice", %path, "Loaded prompt overrides (TOML)");
  Ok(file.prompts)
}
