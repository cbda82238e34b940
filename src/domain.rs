//! Domain models: exercises, remote evaluations, and completed attempt records.
//!
//! Exercise and evaluation types double as the structured-output shapes requested
//! from the model, so their serde names (camelCase) are also the wire names.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const QUIZ_QUESTION_COUNT: usize = 5;
pub const QUIZ_OPTION_COUNT: usize = 4;
pub const MAX_SCORE: u8 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  #[schemars(description = "The text of the question.")]
  pub question_text: String,
  #[schemars(description = "An array of 4 string options for the question.", length(min = 4, max = 4))]
  pub options: Vec<String>,
  #[schemars(description = "The 0-based index of the correct answer in the options array.")]
  pub correct_answer_index: usize,
}

/// A multiple-choice exercise: one client scenario plus its questions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizExercise {
  #[schemars(description = "A realistic client problem scenario for a prompt engineer.")]
  pub client_problem: String,
  #[schemars(description = "An array of 5 multiple-choice questions about the scenario.", length(min = 5, max = 5))]
  pub questions: Vec<Question>,
}

impl QuizExercise {
  pub fn validate(&self) -> Result<(), String> {
    non_blank("clientProblem", &self.client_problem)?;
    if self.questions.len() != QUIZ_QUESTION_COUNT {
      return Err(format!(
        "expected {} questions, got {}",
        QUIZ_QUESTION_COUNT,
        self.questions.len()
      ));
    }
    for (i, q) in self.questions.iter().enumerate() {
      non_blank(&format!("questions[{i}].questionText"), &q.question_text)?;
      if q.options.len() != QUIZ_OPTION_COUNT {
        return Err(format!(
          "questions[{i}]: expected {} options, got {}",
          QUIZ_OPTION_COUNT,
          q.options.len()
        ));
      }
      for (j, opt) in q.options.iter().enumerate() {
        non_blank(&format!("questions[{i}].options[{j}]"), opt)?;
      }
      if q.correct_answer_index >= q.options.len() {
        return Err(format!(
          "questions[{i}]: correctAnswerIndex {} out of range",
          q.correct_answer_index
        ));
      }
    }
    Ok(())
  }
}

/// An open-ended prompt-writing brief.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenEndedExercise {
  #[schemars(description = "A summary of the client's business or situation.")]
  pub client_problem: String,
  #[schemars(description = "The specific task the client wants the AI to perform.")]
  pub task: String,
  #[schemars(description = "A description of the desired format or content of the AI's output.")]
  pub desired_output: String,
}

impl OpenEndedExercise {
  pub fn validate(&self) -> Result<(), String> {
    non_blank("clientProblem", &self.client_problem)?;
    non_blank("task", &self.task)?;
    non_blank("desiredOutput", &self.desired_output)
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizFeedback {
  #[schemars(description = "The original question text.")]
  pub question: String,
  #[schemars(description = "The answer the user selected.")]
  pub user_answer: String,
  #[schemars(description = "The correct answer.")]
  pub correct_answer: String,
  pub is_correct: bool,
  #[schemars(description = "A detailed explanation for why the user's answer was right or wrong.")]
  pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizEvaluation {
  #[schemars(description = "Feedback for each question answered by the user.")]
  pub feedback: Vec<QuizFeedback>,
  #[schemars(description = "Three actionable suggestions for the student to improve their prompting skills.")]
  pub suggestions: Vec<String>,
}

impl QuizEvaluation {
  pub fn validate_for(&self, exercise: &QuizExercise) -> Result<(), String> {
    if self.feedback.len() != exercise.questions.len() {
      return Err(format!(
        "expected {} feedback items, got {}",
        exercise.questions.len(),
        self.feedback.len()
      ));
    }
    if self.suggestions.is_empty() {
      return Err("suggestions must not be empty".into());
    }
    Ok(())
  }

  pub fn correct_count(&self) -> usize {
    self.feedback.iter().filter(|f| f.is_correct).count()
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptEvaluation {
  #[schemars(description = "A score from 1-100 evaluating the prompt's effectiveness.")]
  pub score: i64,
  #[schemars(description = "Detailed feedback explaining the score, covering clarity, specificity, and effectiveness.")]
  pub feedback: String,
  #[schemars(description = "An improved version of the student's prompt.")]
  pub suggested_prompt: String,
}

impl PromptEvaluation {
  pub fn validate(&self) -> Result<(), String> {
    if !(0..=i64::from(MAX_SCORE)).contains(&self.score) {
      return Err(format!("score {} outside 0..=100", self.score));
    }
    non_blank("feedback", &self.feedback)?;
    non_blank("suggestedPrompt", &self.suggested_prompt)
  }
}

/// `round(100 * correct / total)`; an empty quiz scores 0.
pub fn quiz_score(correct: usize, total: usize) -> u8 {
  if total == 0 {
    return 0;
  }
  let correct = correct.min(total);
  ((correct as f64 * f64::from(MAX_SCORE)) / total as f64).round() as u8
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
  pub id: String,
  pub test_data: QuizExercise,
  pub user_answers: Vec<usize>,
  pub score: u8,
  pub feedback: Vec<QuizFeedback>,
  pub suggestions: Vec<String>,
  pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenEndedResult {
  pub id: String,
  pub problem: OpenEndedExercise,
  pub user_prompt: String,
  pub score: u8,
  pub feedback: String,
  pub suggested_prompt: String,
  pub timestamp: DateTime<Utc>,
}

/// A completed attempt, as kept in history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AttemptRecord {
  #[serde(rename = "Multiple-Choice")]
  Quiz(QuizResult),
  #[serde(rename = "Prompt-Development")]
  OpenEnded(OpenEndedResult),
}

impl AttemptRecord {
  pub fn id(&self) -> &str {
    match self {
      AttemptRecord::Quiz(r) => &r.id,
      AttemptRecord::OpenEnded(r) => &r.id,
    }
  }

  pub fn score(&self) -> u8 {
    match self {
      AttemptRecord::Quiz(r) => r.score,
      AttemptRecord::OpenEnded(r) => r.score,
    }
  }

  pub fn timestamp(&self) -> DateTime<Utc> {
    match self {
      AttemptRecord::Quiz(r) => r.timestamp,
      AttemptRecord::OpenEnded(r) => r.timestamp,
    }
  }

  /// Case-insensitive match against the searchable text fields.
  /// `needle` must already be lowercased.
  pub fn matches_lowercase(&self, needle: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(needle);
    match self {
      AttemptRecord::Quiz(r) => {
        hit(&r.test_data.client_problem) || r.test_data.questions.iter().any(|q| hit(&q.question_text))
      }
      AttemptRecord::OpenEnded(r) => {
        hit(&r.problem.client_problem)
          || hit(&r.problem.task)
          || hit(&r.user_prompt)
          || hit(&r.suggested_prompt)
      }
    }
  }
}

/// Coarse grading used by renderers for colouring and celebration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
  High,
  Medium,
  Low,
}

impl ScoreBand {
  pub fn of(score: u8) -> Self {
    match score {
      80..=u8::MAX => ScoreBand::High,
      50..=79 => ScoreBand::Medium,
      _ => ScoreBand::Low,
    }
  }
}

fn non_blank(field: &str, value: &str) -> Result<(), String> {
  if value.trim().is_empty() {
    Err(format!("{field} must not be blank"))
  } else {
    Ok(())
  }
}

#[cfg(test)]
pub(crate) mod fixtures {
  use super::*;

  pub fn question(text: &str, correct: usize) -> Question {
    Question {
      question_text: text.into(),
      options: vec!["Zero-shot".into(), "Few-shot".into(), "Chain-of-Thought".into(), "Persona".into()],
      correct_answer_index: correct,
    }
  }

  pub fn quiz() -> QuizExercise {
    QuizExercise {
      client_problem: "A bakery wants weekly social media posts.".into(),
      questions: vec![
        question("Which technique gives the model examples?", 1),
        question("Which technique asks for step-by-step reasoning?", 2),
        question("Which technique assigns a role?", 3),
        question("Which technique uses no examples?", 0),
        question("Which technique suits a strict output format?", 1),
      ],
    }
  }

  pub fn open_ended() -> OpenEndedExercise {
    OpenEndedExercise {
      client_problem: "A dental clinic with a busy front desk.".into(),
      task: "Draft appointment reminder messages.".into(),
      desired_output: "Three short SMS texts under 160 characters.".into(),
    }
  }

  pub fn feedback(is_correct: bool) -> QuizFeedback {
    QuizFeedback {
      question: "q".into(),
      user_answer: "a".into(),
      correct_answer: "b".into(),
      is_correct,
      explanation: "because".into(),
    }
  }

  pub fn evaluation(correct: usize, total: usize) -> QuizEvaluation {
    QuizEvaluation {
      feedback: (0..total).map(|i| feedback(i < correct)).collect(),
      suggestions: vec!["Add examples.".into(), "Define a persona.".into(), "Specify a format.".into()],
    }
  }

  pub fn quiz_record(id: &str) -> AttemptRecord {
    AttemptRecord::Quiz(QuizResult {
      id: id.into(),
      test_data: quiz(),
      user_answers: vec![1, 2, 3, 0, 1],
      score: 100,
      feedback: evaluation(5, 5).feedback,
      suggestions: vec!["Keep going.".into()],
      timestamp: Utc::now(),
    })
  }

  pub fn prompt_record(id: &str, user_prompt: &str) -> AttemptRecord {
    AttemptRecord::OpenEnded(OpenEndedResult {
      id: id.into(),
      problem: open_ended(),
      user_prompt: user_prompt.into(),
      score: 72,
      feedback: "Clear, but missing constraints.".into(),
      suggested_prompt: "Act as a friendly receptionist and write three reminders.".into(),
      timestamp: Utc::now(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::fixtures::*;
  use super::*;

  #[test]
  fn quiz_score_rounds_to_nearest_integer() {
    assert_eq!(quiz_score(5, 5), 100);
    assert_eq!(quiz_score(2, 5), 40);
    assert_eq!(quiz_score(0, 5), 0);
    assert_eq!(quiz_score(1, 3), 33);
    assert_eq!(quiz_score(2, 3), 67);
    assert_eq!(quiz_score(0, 0), 0);
  }

  #[test]
  fn quiz_score_stays_within_bounds() {
    for total in 1..=12 {
      for correct in 0..=total + 2 {
        assert!(quiz_score(correct, total) <= MAX_SCORE);
      }
    }
  }

  #[test]
  fn well_formed_quiz_validates() {
    assert!(quiz().validate().is_ok());
  }

  #[test]
  fn quiz_with_wrong_question_count_is_rejected() {
    let mut q = quiz();
    q.questions.truncate(3);
    assert!(q.validate().unwrap_err().contains("expected 5 questions"));
  }

  #[test]
  fn quiz_with_extra_option_or_bad_index_is_rejected() {
    let mut q = quiz();
    q.questions[2].options.push("Retrieval".into());
    assert!(q.validate().is_err());

    let mut q = quiz();
    q.questions[4].correct_answer_index = 4;
    assert!(q.validate().unwrap_err().contains("out of range"));
  }

  #[test]
  fn blank_fields_are_rejected() {
    let mut q = quiz();
    q.client_problem = "   ".into();
    assert!(q.validate().is_err());

    let mut p = open_ended();
    p.task = String::new();
    assert!(p.validate().is_err());
  }

  #[test]
  fn evaluation_must_cover_every_question() {
    let exercise = quiz();
    assert!(evaluation(3, 5).validate_for(&exercise).is_ok());
    assert!(evaluation(3, 4).validate_for(&exercise).is_err());
    let mut no_suggestions = evaluation(3, 5);
    no_suggestions.suggestions.clear();
    assert!(no_suggestions.validate_for(&exercise).is_err());
  }

  #[test]
  fn prompt_evaluation_score_must_be_a_percentage() {
    let mut e = PromptEvaluation {
      score: 85,
      feedback: "Good persona.".into(),
      suggested_prompt: "Act as...".into(),
    };
    assert!(e.validate().is_ok());
    e.score = 101;
    assert!(e.validate().is_err());
    e.score = -3;
    assert!(e.validate().is_err());
  }

  #[test]
  fn records_serialize_with_type_discriminant() {
    let v = serde_json::to_value(quiz_record("r1")).unwrap();
    assert_eq!(v["type"], "Multiple-Choice");
    assert_eq!(v["testData"]["questions"][0]["correctAnswerIndex"], 1);

    let v = serde_json::to_value(prompt_record("r2", "Write reminders")).unwrap();
    assert_eq!(v["type"], "Prompt-Development");
    assert_eq!(v["suggestedPrompt"], "Act as a friendly receptionist and write three reminders.");

    let back: AttemptRecord = serde_json::from_value(v).unwrap();
    assert_eq!(back.id(), "r2");
  }

  #[test]
  fn search_covers_question_texts_and_prompts() {
    let quiz = quiz_record("q");
    assert!(quiz.matches_lowercase("step-by-step"));
    assert!(quiz.matches_lowercase("bakery"));
    assert!(!quiz.matches_lowercase("dental"));

    let prompt = prompt_record("p", "Remind patients kindly");
    assert!(prompt.matches_lowercase("remind patients"));
    assert!(prompt.matches_lowercase("receptionist"));
    assert!(prompt.matches_lowercase("appointment"));
    // desired output is not a searchable field
    assert!(!prompt.matches_lowercase("160 characters"));
  }

  #[test]
  fn score_bands() {
    assert_eq!(ScoreBand::of(100), ScoreBand::High);
    assert_eq!(ScoreBand::of(80), ScoreBand::High);
    assert_eq!(ScoreBand::of(79), ScoreBand::Medium);
    assert_eq!(ScoreBand::of(50), ScoreBand::Medium);
    assert_eq!(ScoreBand::of(49), ScoreBand::Low);
  }
}
