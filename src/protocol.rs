//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Snapshots are a read-only projection of the session; the front end renders them as-is.

use serde::{Deserialize, Serialize};

use crate::domain::{AttemptRecord, OpenEndedExercise, ScoreBand};
use crate::exercise::{PhaseKind, PromptPhase, QuizPhase};
use crate::i18n::{t, Language, MessageKey};
use crate::router::View;
use crate::session::{Action, Exercise, Session};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Navigate { view: View },
    SetLanguage { language: Language },
    SelectOption { index: usize },
    NextQuestion,
    PreviousQuestion,
    EditPrompt { text: String },
    Submit,
    Restart,
    ViewResult { id: String },
    SearchHistory { term: String },
}

impl ClientWsMessage {
    /// The session action this message maps to. `Ping` and `ViewResult` are
    /// handled by the socket loop itself.
    pub fn into_action(self) -> Option<Action> {
        Some(match self {
            ClientWsMessage::Navigate { view } => Action::Navigate(view),
            ClientWsMessage::SetLanguage { language } => Action::SetLanguage(language),
            ClientWsMessage::SelectOption { index } => Action::SelectOption(index),
            ClientWsMessage::NextQuestion => Action::NextQuestion,
            ClientWsMessage::PreviousQuestion => Action::PreviousQuestion,
            ClientWsMessage::EditPrompt { text } => Action::EditPrompt(text),
            ClientWsMessage::Submit => Action::Submit,
            ClientWsMessage::Restart => Action::Restart,
            ClientWsMessage::SearchHistory { term } => Action::SearchHistory(term),
            ClientWsMessage::Ping | ClientWsMessage::ViewResult { .. } => return None,
        })
    }
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    State { snapshot: SessionSnapshot },
    History {
        term: String,
        records: Vec<AttemptRecord>,
        /// Set when `records` is empty.
        empty: Option<EmptyNotice>,
    },
    Error { message: String },
}

#[derive(Debug, Serialize)]
pub struct EmptyNotice {
    pub title: &'static str,
    pub subtitle: &'static str,
}

impl ServerWsMessage {
    /// History listing; the empty notice depends on whether a search was active.
    pub fn history(term: String, records: Vec<AttemptRecord>, lang: Language) -> Self {
        let empty = records.is_empty().then(|| {
            if term.trim().is_empty() {
                EmptyNotice {
                    title: t(lang, MessageKey::NoHistoryTitle),
                    subtitle: t(lang, MessageKey::NoHistorySubtitle),
                }
            } else {
                EmptyNotice {
                    title: t(lang, MessageKey::NoResultsFound),
                    subtitle: t(lang, MessageKey::NoResultsFoundSubtitle),
                }
            }
        });
        ServerWsMessage::History { term, records, empty }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub view: View,
    pub language: Language,
    pub title: &'static str,
    pub exercise: Option<ExerciseView>,
    pub result: Option<ResultView>,
    pub history_term: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExerciseView {
    Quiz(QuizView),
    OpenEnded(PromptView),
}

/// Quiz as shown while it is being answered. Correct indices are never included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub phase: PhaseKind,
    /// Loading / evaluating notice, or the failure message.
    pub notice: Option<String>,
    pub client_problem: Option<String>,
    pub questions: Vec<QuestionView>,
    pub answers: Vec<Option<usize>>,
    pub current: usize,
    pub can_go_next: bool,
    pub can_go_back: bool,
    pub can_submit: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub question_text: String,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptView {
    pub phase: PhaseKind,
    pub notice: Option<String>,
    pub problem: Option<OpenEndedExercise>,
    pub text: String,
    pub can_submit: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub heading: &'static str,
    pub band: ScoreBand,
    pub celebrate: bool,
    pub record: AttemptRecord,
}

impl ResultView {
    pub fn of(record: &AttemptRecord, lang: Language) -> Self {
        let band = ScoreBand::of(record.score());
        Self {
            heading: t(lang, MessageKey::EvaluationComplete),
            band,
            celebrate: band == ScoreBand::High,
            record: record.clone(),
        }
    }
}

impl SessionSnapshot {
    pub fn of(session: &Session) -> Self {
        let lang = session.language();
        let view = session.view();
        Self {
            view,
            language: lang,
            title: match view {
                View::Quiz => t(lang, MessageKey::QuizTitle),
                View::OpenEnded => t(lang, MessageKey::PromptDevTitle),
                _ => t(lang, MessageKey::AppTitle),
            },
            exercise: session.exercise().map(|e| exercise_view(e, lang)),
            result: session.router().active_result().map(|r| ResultView::of(r, lang)),
            history_term: session.search_term().to_string(),
        }
    }
}

fn exercise_view(exercise: &Exercise, lang: Language) -> ExerciseView {
    match exercise {
        Exercise::Quiz(q) => {
            let notice = match q.phase() {
                QuizPhase::Loading => Some(t(lang, MessageKey::LoadingTest).to_string()),
                QuizPhase::Submitting(_) => Some(t(lang, MessageKey::EvaluatingAnswers).to_string()),
                QuizPhase::Ready(p) => p.failure.clone(),
                QuizPhase::Error(m) => Some(m.clone()),
                QuizPhase::Complete(_) => None,
            };
            let mut view = QuizView {
                phase: q.kind(),
                notice,
                client_problem: None,
                questions: Vec::new(),
                answers: Vec::new(),
                current: 0,
                can_go_next: false,
                can_go_back: false,
                can_submit: q.can_submit(),
            };
            if let Some(p) = q.progress() {
                view.client_problem = Some(p.exercise.client_problem.clone());
                view.questions = p
                    .exercise
                    .questions
                    .iter()
                    .map(|q| QuestionView { question_text: q.question_text.clone(), options: q.options.clone() })
                    .collect();
                view.answers = p.answers.clone();
                view.current = p.current;
                // navigation is frozen while submitting
                let ready = q.kind() == PhaseKind::Ready;
                view.can_go_next = ready && p.can_go_next();
                view.can_go_back = ready && p.can_go_back();
            }
            ExerciseView::Quiz(view)
        }
        Exercise::OpenEnded(a) => {
            let notice = match a.phase() {
                PromptPhase::Loading => Some(t(lang, MessageKey::LoadingProblem).to_string()),
                PromptPhase::Submitting(_) => Some(t(lang, MessageKey::EvaluatingPrompt).to_string()),
                PromptPhase::Ready(d) => d.failure.clone(),
                PromptPhase::Error(m) => Some(m.clone()),
                PromptPhase::Complete(_) => None,
            };
            let draft = a.draft();
            ExerciseView::OpenEnded(PromptView {
                phase: a.kind(),
                notice,
                problem: draft.map(|d| d.exercise.clone()),
                text: draft.map(|d| d.text.clone()).unwrap_or_default(),
                can_submit: a.can_submit(),
            })
        }
    }
}

// --- HTTP DTOs ---

#[derive(Debug, Deserialize, Default)]
pub struct HistoryQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TutorialsQuery {
    #[serde(default)]
    pub lang: Option<Language>,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub ok: bool,
}
