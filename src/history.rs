//! Attempt history: an in-memory log, newest first, persisted through a repository.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::domain::AttemptRecord;
use crate::error::StoreError;
use crate::util::is_blank;

/// Where the log lives between runs.
pub trait HistoryRepository: Send + Sync {
  fn load(&self) -> Result<Vec<AttemptRecord>, StoreError>;
  fn save(&self, records: &[AttemptRecord]) -> Result<(), StoreError>;
}

/// The whole log as one JSON array in a single file.
#[derive(Clone, Debug)]
pub struct JsonFileRepository {
  path: PathBuf,
}

impl JsonFileRepository {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }
}

impl HistoryRepository for JsonFileRepository {
  fn load(&self) -> Result<Vec<AttemptRecord>, StoreError> {
    let raw = match std::fs::read_to_string(&self.path) {
      Ok(raw) => raw,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(e.into()),
    };
    if raw.trim().is_empty() {
      return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&raw)?)
  }

  fn save(&self, records: &[AttemptRecord]) -> Result<(), StoreError> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(&self.path, json)?;
    Ok(())
  }
}

/// Process-local slot for tests.
#[derive(Debug, Default)]
pub struct MemoryRepository {
  slot: Mutex<Vec<AttemptRecord>>,
}

impl MemoryRepository {
  pub fn new() -> Self {
    Self::default()
  }
}

impl HistoryRepository for MemoryRepository {
  fn load(&self) -> Result<Vec<AttemptRecord>, StoreError> {
    Ok(self.slot.lock().map(|v| v.clone()).unwrap_or_default())
  }

  fn save(&self, records: &[AttemptRecord]) -> Result<(), StoreError> {
    if let Ok(mut slot) = self.slot.lock() {
      *slot = records.to_vec();
    }
    Ok(())
  }
}

pub struct HistoryStore {
  records: Vec<AttemptRecord>,
  repo: Arc<dyn HistoryRepository>,
}

/// A copy of the log taken right after an append, not yet on disk.
/// Writing it needs no access to the store, so callers can do it off any lock.
#[must_use = "the appended record is not persisted until the write runs"]
pub struct PendingWrite {
  repo: Arc<dyn HistoryRepository>,
  records: Vec<AttemptRecord>,
}

impl PendingWrite {
  pub fn write(self) -> Result<(), StoreError> {
    self.repo.save(&self.records)
  }
}

impl HistoryStore {
  /// Reads the persisted log once. An unreadable log starts empty; it is
  /// replaced on the next append.
  pub fn load(repo: Box<dyn HistoryRepository>) -> Self {
    let records = match repo.load() {
      Ok(records) => {
        info!(target: "history", count = records.len(), "History loaded");
        records
      }
      Err(e) => {
        warn!(target: "history", error = %e, "Could not read history; starting empty");
        Vec::new()
      }
    };
    Self { records, repo: Arc::from(repo) }
  }

  pub fn records(&self) -> &[AttemptRecord] {
    &self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Puts the record first and hands back the write that persists it.
  /// On a failed write the record stays in memory.
  pub fn append(&mut self, record: AttemptRecord) -> PendingWrite {
    debug!(target: "history", id = record.id(), score = record.score(), "Appending attempt");
    self.records.insert(0, record);
    PendingWrite { repo: Arc::clone(&self.repo), records: self.records.clone() }
  }

  /// Case-insensitive search over text fields. Blank term returns everything.
  pub fn filter(&self, term: &str) -> Vec<AttemptRecord> {
    if is_blank(term) {
      return self.records.clone();
    }
    let needle = term.to_lowercase();
    self.records.iter().filter(|r| r.matches_lowercase(&needle)).cloned().collect()
  }

  pub fn get(&self, id: &str) -> Option<&AttemptRecord> {
    self.records.iter().find(|r| r.id() == id)
  }
}
