//! Application state shared by every connection.
//!
//! This module owns:
//!   - the evaluator (model client + prompt templates)
//!   - the attempt history, behind a RwLock so sessions can append concurrently
//!   - a writer lock that keeps history file writes in append order
//!
//! Per-connection UI state lives in `session::Session`, never here.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument};

use crate::config::AppConfig;
use crate::domain::AttemptRecord;
use crate::error::ModelError;
use crate::evaluator::Evaluator;
use crate::gemini::GeminiClient;
use crate::history::{HistoryStore, JsonFileRepository};

#[derive(Clone)]
pub struct AppState {
    pub evaluator: Evaluator,
    pub history: Arc<RwLock<HistoryStore>>,
    history_writer: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(evaluator: Evaluator, history: HistoryStore) -> Self {
        Self {
            evaluator,
            history: Arc::new(RwLock::new(history)),
            history_writer: Arc::new(Mutex::new(())),
        }
    }

    /// Build state from config: Gemini client, prompts, and the history file.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(cfg: &AppConfig) -> Result<Self, ModelError> {
        let client = GeminiClient::new(&cfg.gemini)?;
        info!(target: "prompt_practice", base_url = %client.base_url, model = %client.model, max_attempts = cfg.gemini.max_attempts, "Gemini enabled.");

        let history = HistoryStore::load(Box::new(JsonFileRepository::new(&cfg.history_path)));
        info!(target: "prompt_practice", path = %cfg.history_path.display(), records = history.len(), "History ready");

        Ok(Self::new(Evaluator::new(Arc::new(client), cfg.prompts.clone()), history))
    }

    /// Record a finished attempt. A failed write is logged; the attempt still counts.
    /// The file write runs on the blocking pool after the history lock is released.
    #[instrument(level = "debug", skip(self, record), fields(id = record.id()))]
    pub async fn record_attempt(&self, record: AttemptRecord) {
        // held across append and write so the file never goes back to an older snapshot
        let _writer = self.history_writer.lock().await;
        let pending = self.history.write().await.append(record);
        match tokio::task::spawn_blocking(move || pending.write()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(target: "history", error = %e, "Failed to persist history"),
            Err(e) => error!(target: "history", error = %e, "History write task failed"),
        }
    }

    pub async fn search_history(&self, term: &str) -> Vec<AttemptRecord> {
        self.history.read().await.filter(term)
    }

    pub async fn find_attempt(&self, id: &str) -> Option<AttemptRecord> {
        self.history.read().await.get(id).cloned()
    }
}
