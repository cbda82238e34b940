//! Per-connection UI session.
//!
//! The session is plain state plus transitions. Actions that need the model
//! return an [`Effect`]; whoever drives the session runs it with [`perform`]
//! (usually on a spawned task) and hands the [`Completion`] back. Every effect
//! is stamped with the attempt epoch it was issued under, and completions from
//! an older epoch are dropped.

use tracing::{debug, error, info};

use crate::domain::{AttemptRecord, OpenEndedExercise, PromptEvaluation, QuizEvaluation, QuizExercise};
use crate::error::AiError;
use crate::evaluator::Evaluator;
use crate::exercise::{PromptAttempt, PromptSubmission, QuizAttempt, QuizSubmission, Transition};
use crate::i18n::{t, Language, MessageKey};
use crate::router::{View, ViewRouter};

#[derive(Clone, Debug)]
pub enum Exercise {
  Quiz(QuizAttempt),
  OpenEnded(PromptAttempt),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
  Navigate(View),
  SetLanguage(Language),
  SelectOption(usize),
  NextQuestion,
  PreviousQuestion,
  EditPrompt(String),
  Submit,
  Restart,
  SearchHistory(String),
}

/// Remote work requested by a transition.
#[derive(Clone, Debug)]
pub enum Effect {
  GenerateQuiz { epoch: u64, language: Language },
  GenerateProblem { epoch: u64, language: Language },
  EvaluateQuiz { epoch: u64, language: Language, submission: QuizSubmission },
  EvaluatePrompt { epoch: u64, language: Language, submission: PromptSubmission },
}

impl Effect {
  pub fn epoch(&self) -> u64 {
    match self {
      Effect::GenerateQuiz { epoch, .. }
      | Effect::GenerateProblem { epoch, .. }
      | Effect::EvaluateQuiz { epoch, .. }
      | Effect::EvaluatePrompt { epoch, .. } => *epoch,
    }
  }
}

#[derive(Debug)]
pub enum Completion {
  QuizGenerated { epoch: u64, outcome: Result<QuizExercise, AiError> },
  ProblemGenerated { epoch: u64, outcome: Result<OpenEndedExercise, AiError> },
  QuizEvaluated { epoch: u64, outcome: Result<QuizEvaluation, AiError> },
  PromptEvaluated { epoch: u64, outcome: Result<PromptEvaluation, AiError> },
}

impl Completion {
  pub fn epoch(&self) -> u64 {
    match self {
      Completion::QuizGenerated { epoch, .. }
      | Completion::ProblemGenerated { epoch, .. }
      | Completion::QuizEvaluated { epoch, .. }
      | Completion::PromptEvaluated { epoch, .. } => *epoch,
    }
  }
}

/// What applying a completion did to the session.
#[derive(Debug, PartialEq)]
pub enum Applied {
  Stale,
  Updated,
  /// The attempt finished; the record should go to history.
  Finished(AttemptRecord),
}

/// Run one effect against the evaluator.
pub async fn perform(evaluator: &Evaluator, effect: Effect) -> Completion {
  match effect {
    Effect::GenerateQuiz { epoch, language } => {
      Completion::QuizGenerated { epoch, outcome: evaluator.generate_quiz(language).await }
    }
    Effect::GenerateProblem { epoch, language } => Completion::ProblemGenerated {
      epoch,
      outcome: evaluator.generate_open_ended_problem(language).await,
    },
    Effect::EvaluateQuiz { epoch, language, submission } => Completion::QuizEvaluated {
      epoch,
      outcome: evaluator.evaluate_quiz(&submission.exercise, &submission.answers, language).await,
    },
    Effect::EvaluatePrompt { epoch, language, submission } => Completion::PromptEvaluated {
      epoch,
      outcome: evaluator
        .evaluate_open_ended_prompt(&submission.exercise, &submission.user_prompt, language)
        .await,
    },
  }
}

#[derive(Clone, Debug, Default)]
pub struct Session {
  language: Language,
  router: ViewRouter,
  exercise: Option<Exercise>,
  epoch: u64,
  search_term: String,
}

impl Session {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn language(&self) -> Language {
    self.language
  }

  pub fn view(&self) -> View {
    self.router.current()
  }

  pub fn router(&self) -> &ViewRouter {
    &self.router
  }

  pub fn exercise(&self) -> Option<&Exercise> {
    self.exercise.as_ref()
  }

  pub fn epoch(&self) -> u64 {
    self.epoch
  }

  pub fn search_term(&self) -> &str {
    &self.search_term
  }

  /// Apply a user action. Returns the remote work it requires, if any.
  pub fn apply(&mut self, action: Action) -> Option<Effect> {
    debug!(target: "exercise", ?action, view = ?self.view(), "Session action");
    match action {
      Action::Navigate(view) => {
        self.router.navigate(view);
        self.search_term.clear();
        self.start_exercise()
      }
      Action::SetLanguage(language) => {
        if language == self.language {
          return None;
        }
        self.language = language;
        info!(target: "exercise", language = language.code(), "Language changed");
        // an exercise in progress restarts in the new language
        if self.view().is_exercise() {
          self.start_exercise()
        } else {
          None
        }
      }
      Action::Restart => {
        if self.view().is_exercise() {
          self.start_exercise()
        } else {
          None
        }
      }
      Action::SelectOption(index) => {
        self.with_quiz(|q| q.select_option(index));
        None
      }
      Action::NextQuestion => {
        self.with_quiz(QuizAttempt::next);
        None
      }
      Action::PreviousQuestion => {
        self.with_quiz(QuizAttempt::previous);
        None
      }
      Action::EditPrompt(text) => {
        if let Some(Exercise::OpenEnded(p)) = &mut self.exercise {
          p.edit(text);
        }
        None
      }
      Action::Submit => self.submit(),
      Action::SearchHistory(term) => {
        self.search_term = term;
        None
      }
    }
  }

  /// Show a stored record, as when opening an entry from history.
  pub fn view_result(&mut self, record: AttemptRecord) {
    self.discard_exercise();
    self.router.show_result(record);
  }

  fn with_quiz(&mut self, f: impl FnOnce(&mut QuizAttempt) -> Transition) -> Transition {
    match &mut self.exercise {
      Some(Exercise::Quiz(q)) => f(q),
      _ => Transition::Ignored,
    }
  }

  fn discard_exercise(&mut self) {
    self.exercise = None;
    self.epoch += 1;
  }

  /// Fresh attempt for the current view. Leaving exercise views just drops the attempt.
  fn start_exercise(&mut self) -> Option<Effect> {
    self.discard_exercise();
    let (epoch, language) = (self.epoch, self.language);
    match self.view() {
      View::Quiz => {
        self.exercise = Some(Exercise::Quiz(QuizAttempt::new()));
        Some(Effect::GenerateQuiz { epoch, language })
      }
      View::OpenEnded => {
        self.exercise = Some(Exercise::OpenEnded(PromptAttempt::new()));
        Some(Effect::GenerateProblem { epoch, language })
      }
      _ => None,
    }
  }

  fn submit(&mut self) -> Option<Effect> {
    let (epoch, language) = (self.epoch, self.language);
    match self.exercise.as_mut()? {
      Exercise::Quiz(q) => q
        .begin_submit()
        .map(|submission| Effect::EvaluateQuiz { epoch, language, submission }),
      Exercise::OpenEnded(p) => p
        .begin_submit()
        .map(|submission| Effect::EvaluatePrompt { epoch, language, submission }),
    }
  }

  /// Feed back the result of an effect.
  pub fn complete(&mut self, completion: Completion) -> Applied {
    if completion.epoch() != self.epoch {
      debug!(target: "exercise", got = completion.epoch(), current = self.epoch, "Dropping stale completion");
      return Applied::Stale;
    }
    let lang = self.language;
    let finished = match (completion, self.exercise.as_mut()) {
      (Completion::QuizGenerated { outcome, .. }, Some(Exercise::Quiz(q))) => {
        q.on_generated(outcome.map_err(|e| failure(lang, MessageKey::ErrorLoadTest, &e)));
        None
      }
      (Completion::ProblemGenerated { outcome, .. }, Some(Exercise::OpenEnded(p))) => {
        p.on_generated(outcome.map_err(|e| failure(lang, MessageKey::ErrorLoadProblem, &e)));
        None
      }
      (Completion::QuizEvaluated { outcome, .. }, Some(Exercise::Quiz(q))) => {
        q.on_evaluated(outcome.map_err(|e| failure(lang, MessageKey::ErrorEvaluate, &e)))
      }
      (Completion::PromptEvaluated { outcome, .. }, Some(Exercise::OpenEnded(p))) => {
        p.on_evaluated(outcome.map_err(|e| failure(lang, MessageKey::ErrorEvaluatePrompt, &e)))
      }
      (completion, _) => {
        debug!(target: "exercise", ?completion, "Completion has no matching exercise; dropped");
        return Applied::Stale;
      }
    };

    match finished {
      Some(record) => {
        self.discard_exercise();
        self.router.show_result(record.clone());
        Applied::Finished(record)
      }
      None => Applied::Updated,
    }
  }
}

/// Log the cause and turn it into the message the user sees.
fn failure(lang: Language, key: MessageKey, err: &AiError) -> String {
  error!(target: "exercise", error = %err, malformed = err.is_malformed(), "Remote exercise call failed");
  t(lang, key).to_string()
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::config::Prompts;
  use crate::domain::fixtures;
  use crate::error::ModelError;
  use crate::evaluator::testing::ScriptedModel;
  use crate::exercise::PhaseKind;

  fn evaluator(model: &Arc<ScriptedModel>) -> Evaluator {
    Evaluator::new(model.clone(), Prompts::default())
  }

  fn quiz_json() -> String {
    serde_json::to_string(&fixtures::quiz()).unwrap()
  }

  fn evaluation_json(correct: usize) -> String {
    serde_json::to_string(&fixtures::evaluation(correct, 5)).unwrap()
  }

  fn quiz_kind(s: &Session) -> Option<PhaseKind> {
    match s.exercise() {
      Some(Exercise::Quiz(q)) => Some(q.kind()),
      _ => None,
    }
  }

  async fn drive(s: &mut Session, ev: &Evaluator, effect: Option<Effect>) -> Applied {
    let effect = effect.expect("an effect");
    let completion = perform(ev, effect).await;
    s.complete(completion)
  }

  #[tokio::test]
  async fn full_quiz_round_ends_in_results() {
    let model = Arc::new(ScriptedModel::new().reply(quiz_json()).reply(evaluation_json(5)));
    let ev = evaluator(&model);
    let mut s = Session::new();

    let effect = s.apply(Action::Navigate(View::Quiz));
    assert_eq!(quiz_kind(&s), Some(PhaseKind::Loading));
    assert_eq!(drive(&mut s, &ev, effect).await, Applied::Updated);
    assert_eq!(quiz_kind(&s), Some(PhaseKind::Ready));

    for (i, pick) in [1, 2, 3, 0, 1].into_iter().enumerate() {
      assert!(s.apply(Action::SelectOption(pick)).is_none());
      if i < 4 {
        s.apply(Action::NextQuestion);
      }
    }
    let effect = s.apply(Action::Submit);
    assert_eq!(quiz_kind(&s), Some(PhaseKind::Submitting));

    match drive(&mut s, &ev, effect).await {
      Applied::Finished(record) => assert_eq!(record.score(), 100),
      other => panic!("expected a finished attempt, got {other:?}"),
    }
    assert_eq!(s.view(), View::Results);
    assert!(s.exercise().is_none());
    assert_eq!(model.calls(), 2);
  }

  #[tokio::test]
  async fn generation_failure_shows_localized_error() {
    let model = Arc::new(ScriptedModel::new().fail(ModelError::EmptyCandidate));
    let ev = evaluator(&model);
    let mut s = Session::new();
    s.apply(Action::SetLanguage(Language::Pt));

    let effect = s.apply(Action::Navigate(View::Quiz));
    drive(&mut s, &ev, effect).await;
    match s.exercise() {
      Some(Exercise::Quiz(q)) => match q.phase() {
        crate::exercise::QuizPhase::Error(m) => assert!(m.starts_with("Falha ao carregar o teste")),
        other => panic!("unexpected phase {other:?}"),
      },
      other => panic!("unexpected exercise {other:?}"),
    }
  }

  #[tokio::test]
  async fn leaving_the_view_makes_pending_results_stale() {
    let model = Arc::new(ScriptedModel::new().reply(quiz_json()));
    let ev = evaluator(&model);
    let mut s = Session::new();

    let effect = s.apply(Action::Navigate(View::Quiz)).unwrap();
    s.apply(Action::Navigate(View::Home));
    let completion = perform(&ev, effect).await;
    assert_eq!(s.complete(completion), Applied::Stale);
    assert!(s.exercise().is_none());
    assert_eq!(s.view(), View::Home);
  }

  #[tokio::test]
  async fn language_switch_restarts_the_exercise() {
    let model = Arc::new(ScriptedModel::new().reply(quiz_json()).reply(quiz_json()));
    let ev = evaluator(&model);
    let mut s = Session::new();

    let first = s.apply(Action::Navigate(View::Quiz)).unwrap();
    let second = s.apply(Action::SetLanguage(Language::Pt)).unwrap();
    assert!(second.epoch() > first.epoch());
    assert!(matches!(second, Effect::GenerateQuiz { language: Language::Pt, .. }));

    // the English quiz arrives late and is dropped
    let late = perform(&ev, first).await;
    assert_eq!(s.complete(late), Applied::Stale);
    assert_eq!(quiz_kind(&s), Some(PhaseKind::Loading));

    assert_eq!(drive(&mut s, &ev, Some(second)).await, Applied::Updated);
    assert_eq!(quiz_kind(&s), Some(PhaseKind::Ready));
    assert!(model.prompt(1).contains("must be in Portuguese"));
  }

  #[test]
  fn language_switch_elsewhere_emits_nothing() {
    let mut s = Session::new();
    s.apply(Action::Navigate(View::History));
    assert!(s.apply(Action::SetLanguage(Language::Pt)).is_none());
    assert_eq!(s.language(), Language::Pt);
    assert!(s.apply(Action::SetLanguage(Language::Pt)).is_none());
  }

  #[test]
  fn blank_open_ended_submit_emits_no_effect() {
    let mut s = Session::new();
    let effect = s.apply(Action::Navigate(View::OpenEnded)).unwrap();
    let applied = s.complete(Completion::ProblemGenerated { epoch: effect.epoch(), outcome: Ok(fixtures::open_ended()) });
    assert_eq!(applied, Applied::Updated);

    s.apply(Action::EditPrompt("   ".into()));
    assert!(s.apply(Action::Submit).is_none());
    match s.exercise() {
      Some(Exercise::OpenEnded(p)) => assert_eq!(p.kind(), PhaseKind::Ready),
      other => panic!("unexpected exercise {other:?}"),
    }
  }

  #[tokio::test]
  async fn quiz_evaluation_failure_returns_to_ready_with_answers() {
    let model = Arc::new(ScriptedModel::new().fail(ModelError::Malformed("bad".into())));
    let ev = evaluator(&model);
    let mut s = Session::new();
    let effect = s.apply(Action::Navigate(View::Quiz)).unwrap();
    s.complete(Completion::QuizGenerated { epoch: effect.epoch(), outcome: Ok(fixtures::quiz()) });
    for i in 0..5 {
      s.apply(Action::SelectOption(i % 4));
      s.apply(Action::NextQuestion);
    }
    let effect = s.apply(Action::Submit);
    assert_eq!(drive(&mut s, &ev, effect).await, Applied::Updated);

    match s.exercise() {
      Some(Exercise::Quiz(q)) => {
        let p = q.progress().unwrap();
        assert_eq!(q.kind(), PhaseKind::Ready);
        assert_eq!(p.answers, vec![Some(0), Some(1), Some(2), Some(3), Some(0)]);
        assert_eq!(p.failure.as_deref(), Some("Failed to evaluate your answers. Please try again."));
      }
      other => panic!("unexpected exercise {other:?}"),
    }
  }

  #[test]
  fn restart_only_applies_to_exercise_views() {
    let mut s = Session::new();
    assert!(s.apply(Action::Restart).is_none());
    let first = s.apply(Action::Navigate(View::OpenEnded)).unwrap();
    let again = s.apply(Action::Restart).unwrap();
    assert!(matches!(again, Effect::GenerateProblem { .. }));
    assert_eq!(again.epoch(), first.epoch() + 1);
  }

  #[test]
  fn completion_for_the_other_exercise_is_dropped() {
    let mut s = Session::new();
    let effect = s.apply(Action::Navigate(View::Quiz)).unwrap();
    let applied = s.complete(Completion::ProblemGenerated { epoch: effect.epoch(), outcome: Ok(fixtures::open_ended()) });
    assert_eq!(applied, Applied::Stale);
    assert_eq!(quiz_kind(&s), Some(PhaseKind::Loading));
  }

  #[test]
  fn viewing_a_stored_result_switches_to_results() {
    let mut s = Session::new();
    s.apply(Action::Navigate(View::History));
    s.apply(Action::SearchHistory("bakery".into()));
    s.view_result(fixtures::quiz_record("r1"));
    assert_eq!(s.view(), View::Results);
    assert_eq!(s.router().active_result().map(|r| r.id()), Some("r1"));
    assert_eq!(s.search_term(), "bakery");
  }

  #[test]
  fn navigating_resets_the_history_search() {
    let mut s = Session::new();
    s.apply(Action::Navigate(View::History));
    s.apply(Action::SearchHistory("bakery".into()));
    assert_eq!(s.search_term(), "bakery");

    s.apply(Action::Navigate(View::Home));
    s.apply(Action::Navigate(View::History));
    assert_eq!(s.search_term(), "");
  }
}
