//! Display languages and the backend's user-visible strings.
//!
//! Only strings the backend itself surfaces live here (status notices, failure
//! messages, exercise titles). Layout copy belongs to the front end.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  #[default]
  En,
  Pt,
}

impl Language {
  /// Name used inside model instructions ("must be in {language}").
  pub fn instruction_name(self) -> &'static str {
    match self {
      Language::En => "English",
      Language::Pt => "Portuguese",
    }
  }

  pub fn code(self) -> &'static str {
    match self {
      Language::En => "en",
      Language::Pt => "pt",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKey {
  AppTitle,
  QuizTitle,
  PromptDevTitle,
  LoadingTest,
  EvaluatingAnswers,
  ErrorLoadTest,
  ErrorEvaluate,
  LoadingProblem,
  EvaluatingPrompt,
  ErrorLoadProblem,
  ErrorEvaluatePrompt,
  NoHistoryTitle,
  NoHistorySubtitle,
  NoResultsFound,
  NoResultsFoundSubtitle,
  EvaluationComplete,
}

pub fn t(lang: Language, key: MessageKey) -> &'static str {
  use MessageKey::*;
  match lang {
    Language::En => match key {
      AppTitle => "Prompt Practice Pad",
      QuizTitle => "Multiple-Choice Quiz",
      PromptDevTitle => "Prompt Development",
      LoadingTest => "Generating your test...",
      EvaluatingAnswers => "Evaluating your answers...",
      ErrorLoadTest => "Failed to load the test. Please try again later.",
      ErrorEvaluate => "Failed to evaluate your answers. Please try again.",
      LoadingProblem => "Crafting a client problem for you...",
      EvaluatingPrompt => "Our expert is evaluating your prompt...",
      ErrorLoadProblem => "Failed to load a problem. Please try again later.",
      ErrorEvaluatePrompt => "Failed to evaluate your prompt. Please try again.",
      NoHistoryTitle => "No History Yet",
      NoHistorySubtitle => "Complete a multiple-choice quiz or a prompt development exercise to see your results here.",
      NoResultsFound => "No Results Found",
      NoResultsFoundSubtitle => "We couldn't find any matches for your search.",
      EvaluationComplete => "Evaluation Complete",
    },
    Language::Pt => match key {
      AppTitle => "Painel de Prática de Prompt",
      QuizTitle => "Quiz de Múltipla Escolha",
      PromptDevTitle => "Desenvolvimento de Prompt",
      LoadingTest => "Gerando seu teste...",
      EvaluatingAnswers => "Avaliando suas respostas...",
      ErrorLoadTest => "Falha ao carregar o teste. Por favor, tente novamente mais tarde.",
      ErrorEvaluate => "Falha ao avaliar suas respostas. Por favor, tente novamente.",
      LoadingProblem => "Elaborando um problema de cliente para você...",
      EvaluatingPrompt => "Nosso especialista está avaliando seu prompt...",
      ErrorLoadProblem => "Falha ao carregar um problema. Por favor, tente novamente mais tarde.",
      ErrorEvaluatePrompt => "Falha ao avaliar seu prompt. Por favor, tente novamente.",
      NoHistoryTitle => "Nenhum Histórico Ainda",
      NoHistorySubtitle => "Complete um quiz de múltipla escolha ou um exercício de desenvolvimento de prompt para ver seus resultados aqui.",
      NoResultsFound => "Nenhum Resultado Encontrado",
      NoResultsFoundSubtitle => "Não foi possível encontrar resultados para sua busca.",
      EvaluationComplete => "Avaliação Concluída",
    },
  }
}
