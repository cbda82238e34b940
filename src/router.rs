//! Which screen the session is showing. No back stack.

use serde::{Deserialize, Serialize};

use crate::domain::AttemptRecord;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
  #[default]
  Home,
  Quiz,
  OpenEnded,
  History,
  Results,
  Tutorials,
}

impl View {
  /// Views that own an exercise attempt.
  pub fn is_exercise(self) -> bool {
    matches!(self, View::Quiz | View::OpenEnded)
  }
}

#[derive(Clone, Debug, Default)]
pub struct ViewRouter {
  view: View,
  result: Option<AttemptRecord>,
}

impl ViewRouter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn navigate(&mut self, view: View) {
    self.view = view;
    self.result = None;
  }

  pub fn show_result(&mut self, record: AttemptRecord) {
    self.result = Some(record);
    self.view = View::Results;
  }

  /// `Results` with nothing to show falls back to `Home`.
  pub fn current(&self) -> View {
    match (self.view, &self.result) {
      (View::Results, None) => View::Home,
      (view, _) => view,
    }
  }

  pub fn active_result(&self) -> Option<&AttemptRecord> {
    self.result.as_ref()
  }
}
