//! Exercise state machines: one quiz attempt or one open-ended attempt.
//!
//! Both variants move `Loading → Ready → Submitting → Complete`. Generation
//! failure ends in `Error`; evaluation failure drops back to `Ready` with the
//! failure message so the user keeps their answers.
//!
//! The machines are synchronous. The caller performs the remote call for the
//! request returned by `begin_submit` and feeds the outcome back in.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{
  quiz_score, AttemptRecord, OpenEndedExercise, OpenEndedResult, PromptEvaluation, QuizEvaluation, QuizExercise,
  QuizResult,
};
use crate::util::is_blank;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
  Loading,
  Ready,
  Submitting,
  Complete,
  Error,
}

/// What a transition did. Ignored transitions leave the machine untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
  Applied,
  Ignored,
}

impl Transition {
  fn from_bool(applied: bool) -> Self {
    if applied { Transition::Applied } else { Transition::Ignored }
  }
}

/// New identifier and completion time for a record.
fn stamp() -> (String, DateTime<Utc>) {
  (Uuid::new_v4().to_string(), Utc::now())
}

// ---------------------------------------------------------------------------
// Quiz
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct QuizProgress {
  pub exercise: QuizExercise,
  pub answers: Vec<Option<usize>>,
  pub current: usize,
  /// Message of the last failed submission, cleared on the next submit.
  pub failure: Option<String>,
}

impl QuizProgress {
  fn new(exercise: QuizExercise) -> Self {
    let slots = exercise.questions.len();
    Self { exercise, answers: vec![None; slots], current: 0, failure: None }
  }

  fn last_index(&self) -> usize {
    self.exercise.questions.len().saturating_sub(1)
  }

  pub fn all_answered(&self) -> bool {
    self.answers.iter().all(Option::is_some)
  }

  pub fn can_go_next(&self) -> bool {
    self.current < self.last_index() && self.answers.get(self.current).copied().flatten().is_some()
  }

  pub fn can_go_back(&self) -> bool {
    self.current > 0
  }

  /// Every slot answered and the last question is on screen.
  pub fn can_submit(&self) -> bool {
    !self.answers.is_empty() && self.all_answered() && self.current == self.last_index()
  }

  fn selected(&self) -> Vec<usize> {
    self.answers.iter().map(|a| a.unwrap_or_default()).collect()
  }
}

#[derive(Clone, Debug)]
pub enum QuizPhase {
  Loading,
  Ready(QuizProgress),
  Submitting(QuizProgress),
  Complete(Box<AttemptRecord>),
  Error(String),
}

/// Everything the evaluation call needs, detached from the machine.
#[derive(Clone, Debug)]
pub struct QuizSubmission {
  pub exercise: QuizExercise,
  pub answers: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct QuizAttempt {
  phase: QuizPhase,
}

impl Default for QuizAttempt {
  fn default() -> Self {
    Self::new()
  }
}

impl QuizAttempt {
  pub fn new() -> Self {
    Self { phase: QuizPhase::Loading }
  }

  pub fn phase(&self) -> &QuizPhase {
    &self.phase
  }

  pub fn kind(&self) -> PhaseKind {
    match self.phase {
      QuizPhase::Loading => PhaseKind::Loading,
      QuizPhase::Ready(_) => PhaseKind::Ready,
      QuizPhase::Submitting(_) => PhaseKind::Submitting,
      QuizPhase::Complete(_) => PhaseKind::Complete,
      QuizPhase::Error(_) => PhaseKind::Error,
    }
  }

  pub fn progress(&self) -> Option<&QuizProgress> {
    match &self.phase {
      QuizPhase::Ready(p) | QuizPhase::Submitting(p) => Some(p),
      _ => None,
    }
  }

  fn ready_mut(&mut self) -> Option<&mut QuizProgress> {
    match &mut self.phase {
      QuizPhase::Ready(p) => Some(p),
      _ => None,
    }
  }

  pub fn on_generated(&mut self, outcome: Result<QuizExercise, String>) -> Transition {
    if !matches!(self.phase, QuizPhase::Loading) {
      warn!(target: "exercise", phase = ?self.kind(), "Quiz generation result outside Loading; ignored");
      return Transition::Ignored;
    }
    self.phase = match outcome {
      Ok(exercise) => QuizPhase::Ready(QuizProgress::new(exercise)),
      Err(message) => QuizPhase::Error(message),
    };
    Transition::Applied
  }

  pub fn select_option(&mut self, option: usize) -> Transition {
    let Some(p) = self.ready_mut() else { return Transition::Ignored };
    let in_range = p
      .exercise
      .questions
      .get(p.current)
      .is_some_and(|q| option < q.options.len());
    if !in_range {
      return Transition::Ignored;
    }
    p.answers[p.current] = Some(option);
    Transition::Applied
  }

  pub fn next(&mut self) -> Transition {
    let Some(p) = self.ready_mut() else { return Transition::Ignored };
    let ok = p.can_go_next();
    if ok {
      p.current += 1;
    }
    Transition::from_bool(ok)
  }

  pub fn previous(&mut self) -> Transition {
    let Some(p) = self.ready_mut() else { return Transition::Ignored };
    let ok = p.can_go_back();
    if ok {
      p.current -= 1;
    }
    Transition::from_bool(ok)
  }

  pub fn can_submit(&self) -> bool {
    matches!(&self.phase, QuizPhase::Ready(p) if p.can_submit())
  }

  /// Moves to `Submitting` and hands out the submission, or does nothing.
  pub fn begin_submit(&mut self) -> Option<QuizSubmission> {
    if !self.can_submit() {
      return None;
    }
    let QuizPhase::Ready(mut progress) = std::mem::replace(&mut self.phase, QuizPhase::Loading) else {
      return None;
    };
    progress.failure = None;
    let submission = QuizSubmission { exercise: progress.exercise.clone(), answers: progress.selected() };
    self.phase = QuizPhase::Submitting(progress);
    Some(submission)
  }

  /// Returns the finished record on success.
  pub fn on_evaluated(&mut self, outcome: Result<QuizEvaluation, String>) -> Option<AttemptRecord> {
    if !matches!(self.phase, QuizPhase::Submitting(_)) {
      warn!(target: "exercise", phase = ?self.kind(), "Quiz evaluation result outside Submitting; ignored");
      return None;
    }
    let QuizPhase::Submitting(mut progress) = std::mem::replace(&mut self.phase, QuizPhase::Loading) else {
      return None;
    };
    match outcome {
      Ok(evaluation) => {
        let total = progress.exercise.questions.len();
        let score = quiz_score(evaluation.correct_count(), total);
        let (id, timestamp) = stamp();
        let record = AttemptRecord::Quiz(QuizResult {
          id,
          user_answers: progress.selected(),
          test_data: progress.exercise,
          score,
          feedback: evaluation.feedback,
          suggestions: evaluation.suggestions,
          timestamp,
        });
        debug!(target: "exercise", id = record.id(), score, "Quiz attempt complete");
        self.phase = QuizPhase::Complete(Box::new(record.clone()));
        Some(record)
      }
      Err(message) => {
        progress.failure = Some(message);
        self.phase = QuizPhase::Ready(progress);
        None
      }
    }
  }
}

// ---------------------------------------------------------------------------
// Open-ended
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct PromptDraft {
  pub exercise: OpenEndedExercise,
  pub text: String,
  pub failure: Option<String>,
}

impl PromptDraft {
  pub fn can_submit(&self) -> bool {
    !is_blank(&self.text)
  }
}

#[derive(Clone, Debug)]
pub enum PromptPhase {
  Loading,
  Ready(PromptDraft),
  Submitting(PromptDraft),
  Complete(Box<AttemptRecord>),
  Error(String),
}

#[derive(Clone, Debug)]
pub struct PromptSubmission {
  pub exercise: OpenEndedExercise,
  pub user_prompt: String,
}

#[derive(Clone, Debug)]
pub struct PromptAttempt {
  phase: PromptPhase,
}

impl Default for PromptAttempt {
  fn default() -> Self {
    Self::new()
  }
}

impl PromptAttempt {
  pub fn new() -> Self {
    Self { phase: PromptPhase::Loading }
  }

  pub fn phase(&self) -> &PromptPhase {
    &self.phase
  }

  pub fn kind(&self) -> PhaseKind {
    match self.phase {
      PromptPhase::Loading => PhaseKind::Loading,
      PromptPhase::Ready(_) => PhaseKind::Ready,
      PromptPhase::Submitting(_) => PhaseKind::Submitting,
      PromptPhase::Complete(_) => PhaseKind::Complete,
      PromptPhase::Error(_) => PhaseKind::Error,
    }
  }

  pub fn draft(&self) -> Option<&PromptDraft> {
    match &self.phase {
      PromptPhase::Ready(d) | PromptPhase::Submitting(d) => Some(d),
      _ => None,
    }
  }

  pub fn on_generated(&mut self, outcome: Result<OpenEndedExercise, String>) -> Transition {
    if !matches!(self.phase, PromptPhase::Loading) {
      warn!(target: "exercise", phase = ?self.kind(), "Problem generation result outside Loading; ignored");
      return Transition::Ignored;
    }
    self.phase = match outcome {
      Ok(exercise) => PromptPhase::Ready(PromptDraft { exercise, text: String::new(), failure: None }),
      Err(message) => PromptPhase::Error(message),
    };
    Transition::Applied
  }

  pub fn edit(&mut self, text: String) -> Transition {
    match &mut self.phase {
      PromptPhase::Ready(d) => {
        d.text = text;
        Transition::Applied
      }
      _ => Transition::Ignored,
    }
  }

  pub fn can_submit(&self) -> bool {
    matches!(&self.phase, PromptPhase::Ready(d) if d.can_submit())
  }

  /// Blank text yields nothing: no state change, no remote call.
  pub fn begin_submit(&mut self) -> Option<PromptSubmission> {
    if !self.can_submit() {
      return None;
    }
    let PromptPhase::Ready(mut draft) = std::mem::replace(&mut self.phase, PromptPhase::Loading) else {
      return None;
    };
    draft.failure = None;
    let submission = PromptSubmission { exercise: draft.exercise.clone(), user_prompt: draft.text.clone() };
    self.phase = PromptPhase::Submitting(draft);
    Some(submission)
  }

  pub fn on_evaluated(&mut self, outcome: Result<PromptEvaluation, String>) -> Option<AttemptRecord> {
    if !matches!(self.phase, PromptPhase::Submitting(_)) {
      warn!(target: "exercise", phase = ?self.kind(), "Prompt evaluation result outside Submitting; ignored");
      return None;
    }
    let PromptPhase::Submitting(mut draft) = std::mem::replace(&mut self.phase, PromptPhase::Loading) else {
      return None;
    };
    match outcome {
      Ok(evaluation) => {
        let (id, timestamp) = stamp();
        // validated upstream to be within 0..=100
        let score = evaluation.score.clamp(0, 100) as u8;
        let record = AttemptRecord::OpenEnded(OpenEndedResult {
          id,
          problem: draft.exercise,
          user_prompt: draft.text,
          score,
          feedback: evaluation.feedback,
          suggested_prompt: evaluation.suggested_prompt,
          timestamp,
        });
        debug!(target: "exercise", id = record.id(), score, "Prompt attempt complete");
        self.phase = PromptPhase::Complete(Box::new(record.clone()));
        Some(record)
      }
      Err(message) => {
        draft.failure = Some(message);
        self.phase = PromptPhase::Ready(draft);
        None
      }
    }
  }
}
