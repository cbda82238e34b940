//! WebSocket upgrade + session loop.
//!
//! One `Session` per connection. The loop selects over client messages and
//! completions of the remote calls it spawned; after every applied change the
//! client gets a fresh `state` snapshot.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::protocol::{ClientWsMessage, ServerWsMessage, SessionSnapshot};
use crate::router::View;
use crate::session::{perform, Applied, Completion, Effect, Session};
use crate::state::AppState;

const COMPLETION_BUFFER: usize = 8;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "prompt_practice", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "prompt_practice", "WebSocket connected");
  let (tx, mut rx) = mpsc::channel::<Completion>(COMPLETION_BUFFER);
  let mut session = Session::new();

  if !send(&mut socket, &state_message(&session)).await {
    return;
  }

  loop {
    let replies = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(msg) => {
            debug!(target: "prompt_practice", "WS received: {:?}", &msg);
            handle_client_ws(msg, &mut session, &state, &tx).await
          }
          Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
        },
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
          Vec::new()
        }
        Some(Ok(Message::Close(_))) | None => break,
        Some(Ok(_)) => Vec::new(),
        Some(Err(e)) => {
          error!(target: "prompt_practice", error = %e, "WS receive error");
          break;
        }
      },
      Some(completion) = rx.recv() => apply_completion(completion, &mut session, &state).await,
    };

    for reply in &replies {
      if !send(&mut socket, reply).await {
        info!(target: "prompt_practice", "WebSocket disconnected");
        return;
      }
    }
  }
  info!(target: "prompt_practice", "WebSocket disconnected");
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> bool {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  match socket.send(Message::Text(out)).await {
    Ok(()) => true,
    Err(e) => {
      error!(target: "prompt_practice", error = %e, "WS send error");
      false
    }
  }
}

fn state_message(session: &Session) -> ServerWsMessage {
  ServerWsMessage::State { snapshot: SessionSnapshot::of(session) }
}

/// Run an effect off the socket task; its completion comes back through `tx`.
fn spawn_effect(state: &AppState, tx: &mpsc::Sender<Completion>, effect: Effect) {
  let evaluator = state.evaluator.clone();
  let tx = tx.clone();
  tokio::spawn(async move {
    let completion = perform(&evaluator, effect).await;
    // receiver gone means the socket closed; nothing to deliver
    let _ = tx.send(completion).await;
  });
}

async fn apply_completion(completion: Completion, session: &mut Session, state: &AppState) -> Vec<ServerWsMessage> {
  match session.complete(completion) {
    Applied::Stale => Vec::new(),
    Applied::Updated => vec![state_message(session)],
    Applied::Finished(record) => {
      info!(target: "exercise", id = record.id(), score = record.score(), "Attempt finished");
      state.record_attempt(record).await;
      vec![state_message(session)]
    }
  }
}

#[instrument(level = "debug", skip(session, state, tx))]
async fn handle_client_ws(
  msg: ClientWsMessage,
  session: &mut Session,
  state: &AppState,
  tx: &mpsc::Sender<Completion>,
) -> Vec<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => vec![ServerWsMessage::Pong],

    ClientWsMessage::ViewResult { id } => match state.find_attempt(&id).await {
      Some(record) => {
        session.view_result(record);
        vec![state_message(session)]
      }
      None => vec![ServerWsMessage::Error { message: format!("No attempt with id {id}") }],
    },

    other => {
      let Some(action) = other.into_action() else { return Vec::new() };
      if let Some(effect) = session.apply(action) {
        debug!(target: "exercise", epoch = effect.epoch(), "Spawning remote call");
        spawn_effect(state, tx, effect);
      }
      let mut out = vec![state_message(session)];
      if session.view() == View::History {
        let term = session.search_term().to_string();
        let records = state.search_history(&term).await;
        out.push(ServerWsMessage::history(term, records, session.language()));
      }
      out
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::fixtures;
  use crate::evaluator::testing::ScriptedModel;
  use crate::exercise::PhaseKind;
  use crate::i18n::Language;
  use crate::session::Exercise;
  use crate::state::testing::state_with;

  fn quiz_json() -> String {
    serde_json::to_string(&fixtures::quiz()).unwrap()
  }

  #[tokio::test]
  async fn navigating_to_quiz_spawns_generation() {
    let state = state_with(Arc::new(ScriptedModel::new().reply(quiz_json())));
    let (tx, mut rx) = mpsc::channel(COMPLETION_BUFFER);
    let mut session = Session::new();

    let out = handle_client_ws(ClientWsMessage::Navigate { view: View::Quiz }, &mut session, &state, &tx).await;
    assert_eq!(out.len(), 1);
    assert!(matches!(out[0], ServerWsMessage::State { .. }));

    let completion = rx.recv().await.unwrap();
    let out = apply_completion(completion, &mut session, &state).await;
    assert_eq!(out.len(), 1);
    match session.exercise() {
      Some(Exercise::Quiz(q)) => assert_eq!(q.kind(), PhaseKind::Ready),
      other => panic!("unexpected exercise {other:?}"),
    }
  }

  #[tokio::test]
  async fn finished_attempt_lands_in_history() {
    let model = ScriptedModel::new()
      .reply(serde_json::to_string(&fixtures::open_ended()).unwrap())
      .reply(serde_json::json!({ "score": 85, "feedback": "Strong persona.", "suggestedPrompt": "Act as..." }).to_string());
    let state = state_with(Arc::new(model));
    let (tx, mut rx) = mpsc::channel(COMPLETION_BUFFER);
    let mut session = Session::new();

    handle_client_ws(ClientWsMessage::Navigate { view: View::OpenEnded }, &mut session, &state, &tx).await;
    let generated = rx.recv().await.unwrap();
    apply_completion(generated, &mut session, &state).await;

    handle_client_ws(ClientWsMessage::EditPrompt { text: "Act as a receptionist".into() }, &mut session, &state, &tx).await;
    handle_client_ws(ClientWsMessage::Submit, &mut session, &state, &tx).await;
    let evaluated = rx.recv().await.unwrap();
    let out = apply_completion(evaluated, &mut session, &state).await;
    assert_eq!(out.len(), 1);
    assert_eq!(session.view(), View::Results);

    let stored = state.search_history("").await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].score(), 85);
  }

  #[tokio::test]
  async fn history_view_and_search_send_records() {
    let state = state_with(Arc::new(ScriptedModel::new()));
    state.record_attempt(fixtures::quiz_record("q1")).await;
    state.record_attempt(fixtures::prompt_record("p1", "Remind patients")).await;
    let (tx, _rx) = mpsc::channel(COMPLETION_BUFFER);
    let mut session = Session::new();

    let out = handle_client_ws(ClientWsMessage::Navigate { view: View::History }, &mut session, &state, &tx).await;
    assert!(matches!(&out[1], ServerWsMessage::History { records, .. } if records.len() == 2));

    let out = handle_client_ws(ClientWsMessage::SearchHistory { term: "BAKERY".into() }, &mut session, &state, &tx).await;
    match &out[1] {
      ServerWsMessage::History { term, records, .. } => {
        assert_eq!(term, "BAKERY");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), "q1");
      }
      other => panic!("unexpected reply {other:?}"),
    }

    let out = handle_client_ws(ClientWsMessage::ViewResult { id: "p1".into() }, &mut session, &state, &tx).await;
    assert!(matches!(out[0], ServerWsMessage::State { .. }));
    assert_eq!(session.view(), View::Results);

    let out = handle_client_ws(ClientWsMessage::ViewResult { id: "missing".into() }, &mut session, &state, &tx).await;
    assert!(matches!(out[0], ServerWsMessage::Error { .. }));
  }

  #[tokio::test]
  async fn ping_and_language_on_home() {
    let state = state_with(Arc::new(ScriptedModel::new()));
    let (tx, _rx) = mpsc::channel(COMPLETION_BUFFER);
    let mut session = Session::new();

    let out = handle_client_ws(ClientWsMessage::Ping, &mut session, &state, &tx).await;
    assert!(matches!(out[0], ServerWsMessage::Pong));

    handle_client_ws(ClientWsMessage::SetLanguage { language: Language::Pt }, &mut session, &state, &tx).await;
    assert_eq!(session.language(), Language::Pt);
  }
}
