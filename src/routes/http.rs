//! HTTP endpoint handlers. These are thin wrappers over the shared state.
//! Each handler is instrumented and logs its parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::AttemptRecord;
use crate::protocol::{Health, HistoryQuery, TutorialsQuery};
use crate::state::AppState;
use crate::tutorials::{catalogue, Tutorial};

#[derive(Error, Debug)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(Health { ok: true }) }

#[instrument(level = "info", skip(state, q))]
pub async fn http_list_history(
  State(state): State<Arc<AppState>>,
  Query(q): Query<HistoryQuery>,
) -> Json<Vec<AttemptRecord>> {
  let term = q.q.unwrap_or_default();
  let records = state.search_history(&term).await;
  info!(target: "history", %term, hits = records.len(), "HTTP history served");
  Json(records)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_history_item(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<AttemptRecord>, ApiError> {
  state
    .find_attempt(&id)
    .await
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("attempt {id}")))
}

#[instrument(level = "info", skip(q))]
pub async fn http_tutorials(Query(q): Query<TutorialsQuery>) -> Json<Vec<Tutorial>> {
  Json(catalogue(q.lang.unwrap_or_default()))
}
