//! Prompt Practice Pad · backend
//!
//! - Axum HTTP + WebSocket API; one UI session per socket
//! - Gemini structured-output calls for exercise generation and evaluation
//! - Attempt history persisted to a JSON file
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   GEMINI_API_KEY       : required; startup fails without it
//!   GEMINI_BASE_URL      : default "https://generativelanguage.googleapis.com/v1beta"
//!   GEMINI_MODEL         : default "gemini-2.5-flash"
//!   GEMINI_MAX_ATTEMPTS  : attempts per model call, default 1
//!   PORT                 : u16 (default 3000)
//!   HISTORY_PATH         : default "./data/prompt-history.json"
//!   PROMPTS_CONFIG_PATH  : optional TOML file overriding prompt templates
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

mod config;
mod domain;
mod error;
mod evaluator;
mod exercise;
mod gemini;
mod history;
mod i18n;
mod protocol;
mod router;
mod routes;
mod schema;
mod session;
mod state;
mod telemetry;
mod tutorials;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = AppConfig::from_env().map_err(|e| {
    error!(target: "prompt_practice", error = %e, "Invalid configuration; refusing to start");
    e
  })?;

  let state = Arc::new(AppState::from_config(&cfg)?);
  let app = build_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "prompt_practice", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "prompt_practice", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "prompt_practice", error = %e, "Failed to listen for shutdown signal");
  }
}
