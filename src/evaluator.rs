//! The four remote operations: generate/evaluate a quiz, generate/evaluate an
//! open-ended prompt exercise.
//!
//! Each call renders a prompt template, attaches the response schema of its
//! target type, then parses and validates the JSON it gets back. A response that
//! parses but has the wrong shape is reported as `ModelError::Malformed` under the
//! same failure kind as a transport error.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::Prompts;
use crate::domain::{
  OpenEndedExercise, PromptEvaluation, QuizEvaluation, QuizExercise, QUIZ_OPTION_COUNT, QUIZ_QUESTION_COUNT,
};
use crate::error::{AiError, ModelError};
use crate::gemini::{StructuredRequest, TextModel};
use crate::i18n::Language;
use crate::schema::response_schema;
use crate::util::{fill_template, is_blank, trunc_for_log};

/// Answer as sent for grading: texts, never indices.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnsweredQuestion<'a> {
  question: &'a str,
  user_answer: &'a str,
  correct_answer: &'a str,
}

#[derive(Clone)]
pub struct Evaluator {
  model: Arc<dyn TextModel>,
  prompts: Prompts,
}

impl Evaluator {
  pub fn new(model: Arc<dyn TextModel>, prompts: Prompts) -> Self {
    Self { model, prompts }
  }

  #[instrument(level = "info", skip_all, fields(language = language.code()))]
  pub async fn generate_quiz(&self, language: Language) -> Result<QuizExercise, AiError> {
    let question_count = QUIZ_QUESTION_COUNT.to_string();
    let option_count = QUIZ_OPTION_COUNT.to_string();
    let prompt = fill_template(
      &self.prompts.quiz_generation,
      &[
        ("language", language.instruction_name()),
        ("question_count", &question_count),
        ("option_count", &option_count),
      ],
    );
    let quiz: QuizExercise = self
      .request("generate_quiz", prompt, |q: &QuizExercise| q.validate())
      .await
      .map_err(AiError::Generation)?;
    info!(target: "exercise", questions = quiz.questions.len(), scenario = %trunc_for_log(&quiz.client_problem, 40), "Quiz generated");
    Ok(quiz)
  }

  #[instrument(level = "info", skip_all, fields(language = language.code(), answers = selected.len()))]
  pub async fn evaluate_quiz(
    &self,
    exercise: &QuizExercise,
    selected: &[usize],
    language: Language,
  ) -> Result<QuizEvaluation, AiError> {
    let answers = answered_questions(exercise, selected)?;
    let answers_json = serde_json::to_string_pretty(&answers)
      .map_err(|e| AiError::InvalidSubmission(e.to_string()))?;
    let prompt = fill_template(
      &self.prompts.quiz_evaluation,
      &[
        ("language", language.instruction_name()),
        ("client_problem", &exercise.client_problem),
        ("answers_json", &answers_json),
      ],
    );
    let evaluation: QuizEvaluation = self
      .request("evaluate_quiz", prompt, |e: &QuizEvaluation| e.validate_for(exercise))
      .await
      .map_err(AiError::Evaluation)?;
    info!(target: "exercise", correct = evaluation.correct_count(), total = exercise.questions.len(), "Quiz evaluated");
    Ok(evaluation)
  }

  #[instrument(level = "info", skip_all, fields(language = language.code()))]
  pub async fn generate_open_ended_problem(&self, language: Language) -> Result<OpenEndedExercise, AiError> {
    let prompt = fill_template(&self.prompts.problem_generation, &[("language", language.instruction_name())]);
    let problem: OpenEndedExercise = self
      .request("generate_problem", prompt, OpenEndedExercise::validate)
      .await
      .map_err(AiError::Generation)?;
    info!(target: "exercise", task = %trunc_for_log(&problem.task, 40), "Open-ended problem generated");
    Ok(problem)
  }

  #[instrument(level = "info", skip_all, fields(language = language.code(), prompt_len = user_prompt.len()))]
  pub async fn evaluate_open_ended_prompt(
    &self,
    exercise: &OpenEndedExercise,
    user_prompt: &str,
    language: Language,
  ) -> Result<PromptEvaluation, AiError> {
    if is_blank(user_prompt) {
      return Err(AiError::BlankPrompt);
    }
    let prompt = fill_template(
      &self.prompts.prompt_evaluation,
      &[
        ("language", language.instruction_name()),
        ("client_problem", &exercise.client_problem),
        ("task", &exercise.task),
        ("desired_output", &exercise.desired_output),
        ("user_prompt", user_prompt),
      ],
    );
    let evaluation: PromptEvaluation = self
      .request("evaluate_prompt", prompt, PromptEvaluation::validate)
      .await
      .map_err(AiError::Evaluation)?;
    info!(target: "exercise", score = evaluation.score, "Prompt evaluated");
    Ok(evaluation)
  }

  async fn request<T, V>(&self, stage: &'static str, prompt: String, validate: V) -> Result<T, ModelError>
  where
    T: DeserializeOwned + JsonSchema,
    V: FnOnce(&T) -> Result<(), String>,
  {
    let schema = response_schema::<T>();
    let text = self.model.generate_json(StructuredRequest { stage, prompt, schema }).await?;
    debug!(target: "gemini", stage, preview = %trunc_for_log(&text, 120), "Raw model output");
    let parsed: T = serde_json::from_str(&text).map_err(|e| ModelError::Malformed(e.to_string()))?;
    validate(&parsed).map_err(ModelError::Malformed)?;
    Ok(parsed)
  }
}

fn answered_questions<'a>(
  exercise: &'a QuizExercise,
  selected: &[usize],
) -> Result<Vec<AnsweredQuestion<'a>>, AiError> {
  if selected.len() != exercise.questions.len() {
    return Err(AiError::InvalidSubmission(format!(
      "{} answers for {} questions",
      selected.len(),
      exercise.questions.len()
    )));
  }
  exercise
    .questions
    .iter()
    .zip(selected)
    .enumerate()
    .map(|(i, (q, &choice))| -> Result<AnsweredQuestion<'a>, AiError> {
      let user_answer = q
        .options
        .get(choice)
        .ok_or_else(|| AiError::InvalidSubmission(format!("answer {choice} out of range for question {i}")))?;
      let correct_answer = q
        .options
        .get(q.correct_answer_index)
        .ok_or_else(|| AiError::InvalidSubmission(format!("question {i} has no correct option")))?;
      Ok(AnsweredQuestion { question: &q.question_text, user_answer, correct_answer })
    })
    .collect()
}


#[cfg(test)]
mod tests {
  use super::testing::ScriptedModel;
  use super::*;
  use crate::domain::fixtures;

  fn evaluator(model: &Arc<ScriptedModel>) -> Evaluator {
    Evaluator::new(model.clone(), Prompts::default())
  }

  fn quiz_json() -> String {
    serde_json::to_string(&fixtures::quiz()).unwrap()
  }

  #[tokio::test]
  async fn generate_quiz_embeds_language_and_schema() {
    let model = Arc::new(ScriptedModel::new().reply(quiz_json()));
    let quiz = evaluator(&model).generate_quiz(Language::Pt).await.unwrap();
    assert_eq!(quiz, fixtures::quiz());

    let req = model.requests.lock().unwrap()[0].clone();
    assert_eq!(req.stage, "generate_quiz");
    assert!(req.prompt.contains("must be in Portuguese"));
    assert!(req.prompt.contains("5 multiple-choice questions"));
    assert!(req.prompt.contains("provide 4 options"));
    assert_eq!(req.schema["properties"]["questions"]["type"], "array");
  }

  #[tokio::test]
  async fn generation_transport_failure_is_a_generation_error() {
    let model = Arc::new(ScriptedModel::new().fail(ModelError::EmptyCandidate));
    let err = evaluator(&model).generate_quiz(Language::En).await.unwrap_err();
    assert!(matches!(err, AiError::Generation(ModelError::EmptyCandidate)));
  }

  #[tokio::test]
  async fn quiz_with_three_questions_is_malformed() {
    let mut short = fixtures::quiz();
    short.questions.truncate(3);
    let model = Arc::new(ScriptedModel::new().reply(serde_json::to_string(&short).unwrap()));
    let err = evaluator(&model).generate_quiz(Language::En).await.unwrap_err();
    assert!(matches!(err, AiError::Generation(_)));
    assert!(err.is_malformed());
  }

  #[tokio::test]
  async fn json_missing_fields_is_malformed_not_passed_through() {
    let model = Arc::new(ScriptedModel::new().reply(r#"{"clientProblem": "Shop"}"#));
    let err = evaluator(&model).generate_quiz(Language::En).await.unwrap_err();
    assert!(err.is_malformed());

    let model = Arc::new(ScriptedModel::new().reply("not json at all"));
    let err = evaluator(&model).generate_open_ended_problem(Language::En).await.unwrap_err();
    assert!(matches!(err, AiError::Generation(ModelError::Malformed(_))));
  }

  #[tokio::test]
  async fn evaluate_quiz_sends_answer_texts() {
    let model = Arc::new(ScriptedModel::new().reply(serde_json::to_string(&fixtures::evaluation(4, 5)).unwrap()));
    let quiz = fixtures::quiz();
    let eval = evaluator(&model)
      .evaluate_quiz(&quiz, &[1, 2, 3, 0, 3], Language::En)
      .await
      .unwrap();
    assert_eq!(eval.correct_count(), 4);

    let prompt = model.prompt(0);
    assert!(prompt.contains("must be in English"));
    assert!(prompt.contains(&quiz.client_problem));
    assert!(prompt.contains("\"userAnswer\": \"Persona\""));
    assert!(prompt.contains("\"correctAnswer\": \"Few-shot\""));
    assert!(!prompt.contains("correctAnswerIndex"));
  }

  #[tokio::test]
  async fn evaluation_with_missing_feedback_items_is_malformed() {
    let model = Arc::new(ScriptedModel::new().reply(serde_json::to_string(&fixtures::evaluation(2, 4)).unwrap()));
    let err = evaluator(&model)
      .evaluate_quiz(&fixtures::quiz(), &[0, 0, 0, 0, 0], Language::En)
      .await
      .unwrap_err();
    assert!(matches!(err, AiError::Evaluation(ModelError::Malformed(_))));
  }

  #[tokio::test]
  async fn incomplete_selection_never_reaches_the_model() {
    let model = Arc::new(ScriptedModel::new());
    let ev = evaluator(&model);
    let quiz = fixtures::quiz();
    assert!(matches!(
      ev.evaluate_quiz(&quiz, &[0, 1], Language::En).await,
      Err(AiError::InvalidSubmission(_))
    ));
    assert!(matches!(
      ev.evaluate_quiz(&quiz, &[0, 1, 2, 3, 9], Language::En).await,
      Err(AiError::InvalidSubmission(_))
    ));
    assert_eq!(model.calls(), 0);
  }

  #[tokio::test]
  async fn open_ended_round() {
    let model = Arc::new(
      ScriptedModel::new()
        .reply(serde_json::to_string(&fixtures::open_ended()).unwrap())
        .reply(r#"{"score": 78, "feedback": "Solid persona.", "suggestedPrompt": "Act as a receptionist..."}"#),
    );
    let ev = evaluator(&model);
    let problem = ev.generate_open_ended_problem(Language::Pt).await.unwrap();
    assert!(model.prompt(0).contains("must be in Portuguese"));

    let eval = ev
      .evaluate_open_ended_prompt(&problem, "Act as a receptionist and remind patients.", Language::Pt)
      .await
      .unwrap();
    assert_eq!(eval.score, 78);
    let prompt = model.prompt(1);
    assert!(prompt.contains("Draft appointment reminder messages."));
    assert!(prompt.contains("The student wrote this prompt: \"Act as a receptionist and remind patients.\""));
  }

  #[tokio::test]
  async fn blank_prompt_is_rejected_locally() {
    let model = Arc::new(ScriptedModel::new());
    let err = evaluator(&model)
      .evaluate_open_ended_prompt(&fixtures::open_ended(), "  \n ", Language::En)
      .await
      .unwrap_err();
    assert!(matches!(err, AiError::BlankPrompt));
    assert_eq!(model.calls(), 0);
  }

  #[tokio::test]
  async fn out_of_range_score_is_malformed() {
    let model = Arc::new(
      ScriptedModel::new().reply(r#"{"score": 140, "feedback": "Great", "suggestedPrompt": "Better"}"#),
    );
    let err = evaluator(&model)
      .evaluate_open_ended_prompt(&fixtures::open_ended(), "Do it", Language::En)
      .await
      .unwrap_err();
    assert!(matches!(err, AiError::Evaluation(ModelError::Malformed(_))));
  }
}
