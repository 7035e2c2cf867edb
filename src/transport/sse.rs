//! SSE + POST transport pair (C7): `GET /mcp/sse` opens the long-lived
//! stream, `POST /mcp/messages?session_id=<uuid>` enqueues one JSON-RPC
//! request. Grounded on the base repo's `dashboard/handlers.rs::event_stream`
//! (`async_stream::stream!` + axum `Sse`/`KeepAlive`).

use crate::rpc;
use crate::snapshot::SnapshotStore;
use crate::transport::session::{SessionPhase, SessionRegistry};
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::{http::StatusCode, Json};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_stream::Stream;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SnapshotStore>,
    pub sessions: Arc<SessionRegistry>,
    pub min_k: usize,
    pub started_at: Instant,
    pub shutting_down: Arc<AtomicBool>,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::constants::server_version(),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

pub async fn ready(State(state): State<AppState>) -> StatusCode {
    // The initial snapshot load happens before the router is ever served, so
    // reaching this handler at all means a snapshot is loaded.
    let _ = state.store.current().await;
    StatusCode::OK
}

pub async fn mcp_sse(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (session, mut rx) = state.sessions.create(64).await;
    let session_id = session.id;
    let endpoint = format!("/mcp/messages?session_id={session_id}");
    let shutting_down = state.shutting_down.clone();
    let sessions = state.sessions.clone();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("endpoint").data(endpoint));

        loop {
            if shutting_down.load(Ordering::Relaxed) {
                yield Ok(Event::default().event("close").data(""));
                break;
            }
            match tokio::time::timeout(
                Duration::from_secs(crate::constants::SSE_KEEPALIVE_INTERVAL_SECS),
                rx.recv(),
            )
            .await
            {
                Ok(Some(message)) => {
                    session.touch();
                    yield Ok(Event::default().event("message").data(message.to_string()));
                }
                Ok(None) => break,
                Err(_elapsed) => {
                    if session.idle_for()
                        >= Duration::from_secs(crate::constants::SESSION_IDLE_TIMEOUT_SECS)
                    {
                        yield Ok(Event::default().event("close").data(""));
                        break;
                    }
                    yield Ok(Event::default().comment("keepalive"));
                }
            }
        }

        sessions.remove(session_id).await;
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn mcp_messages(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let Some(session_id) = params
        .get("session_id")
        .and_then(|s| uuid::Uuid::parse_str(s).ok())
    else {
        return (StatusCode::BAD_REQUEST, "missing or invalid session_id").into_response();
    };

    let Some(session) = state.sessions.get(session_id).await else {
        return (StatusCode::NOT_FOUND, "unknown session").into_response();
    };

    let started = Instant::now();
    let request_id = uuid::Uuid::new_v4();
    let method = body.get("method").and_then(|m| m.as_str()).unwrap_or("").to_string();

    session.touch();

    let response = if !session.accepts_method(&method) {
        let id = body.get("id").cloned().unwrap_or(serde_json::Value::Null);
        rpc::failure(&id, &crate::error::McpError::ProtocolError(
            "initialize must be the first method on a new session".to_string(),
        ))
    } else {
        if method == "initialize" {
            session.set_phase(SessionPhase::Initialized);
        } else if session.phase() == SessionPhase::Initialized {
            session.set_phase(SessionPhase::Active);
        }
        let snapshot = state.store.current().await;
        rpc::dispatch(&body, &snapshot, state.min_k)
    };

    let outcome = if response.get("error").is_some() { "error" } else { "ok" };
    crate::logging::RequestLog {
        request_id: &request_id.to_string(),
        session_id: &session_id.to_string(),
        method: &method,
        duration_ms: started.elapsed().as_millis(),
        outcome,
    }
    .emit();

    let _ = session.outbound_tx.send(response).await;
    StatusCode::ACCEPTED.into_response()
}
