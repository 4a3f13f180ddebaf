
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tracing::Instrument;
use uuid::Uuid;

use crate::dispatch::{Dispatcher, ParseRequest};

// Upper bound on an urlencoded form body. Requests beyond it are
// answered with an in-band error instead of being buffered whole.
const FORM_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Shared pieces every request handler sees
pub struct ServerState {
    dispatcher: Arc<Dispatcher>,
    parse_timeout: Option<Duration>,
}

impl ServerState {
    /// Wrap a dispatcher for serving. `parse_timeout` bounds how long a
    /// handler waits on one parse; None waits forever.
    pub fn new(dispatcher: Dispatcher, parse_timeout: Option<Duration>) -> Self {
        ServerState {
            dispatcher: Arc::new(dispatcher),
            parse_timeout,
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Router that answers every path and method the same way.
///
/// The transport surface is deliberately a single operation, so routing
/// is one fallback handler and nothing else.
pub fn router(state: SharedState) -> Router {
    Router::new().fallback(handle_parse).with_state(state)
}

/// Bind and serve until ctrl-c arrives
pub async fn serve(addr: SocketAddr, state: SharedState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated abnormally")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}

async fn handle_parse(State(state): State<SharedState>, request: Request) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("request", %request_id);
    run_request(state, request).instrument(span).await
}

async fn run_request(state: SharedState, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    tracing::debug!(method = %parts.method, path = %parts.uri.path(), "request received");

    let mut params: HashMap<String, String> =
        parts.uri.query().map(decode_pairs).unwrap_or_default();

    // urlencoded is the only body format read; multipart uploads
    // contribute no parameters
    if is_form_content(&parts.headers) {
        let bytes = match to_bytes(body, FORM_BODY_LIMIT).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read form body");
                return error_response(format!("Unreadable form body: {err}"));
            }
        };
        match std::str::from_utf8(&bytes) {
            // body parameters override query parameters of the same name
            Ok(text) => params.extend(decode_pairs(text)),
            Err(_) => tracing::warn!("form body is not valid UTF-8, ignoring it"),
        }
    }

    let parse_request = ParseRequest {
        text: params.remove("q").unwrap_or_default(),
        want_svg: params.get("want_svg").map(|v| v == "y").unwrap_or(false),
    };

    let dispatcher = state.dispatcher.clone();
    let work = tokio::task::spawn_blocking(move || dispatcher.handle(&parse_request));

    let joined = match state.parse_timeout {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(joined) => joined,
            Err(_) => {
                // only the waiting stops here; the abandoned task keeps
                // the parse lock until it actually finishes
                tracing::warn!(limit_msec = limit.as_millis() as u64, "parse abandoned");
                return error_response(format!(
                    "Parse did not finish within {} ms",
                    limit.as_millis()
                ));
            }
        },
        None => work.await,
    };

    let result = match joined {
        Ok(result) => result,
        Err(err) if err.is_panic() => {
            tracing::error!("parse task panicked");
            return error_response("Parse task panicked".to_string());
        }
        Err(err) => {
            tracing::error!(error = %err, "parse task did not complete");
            return error_response(format!("Parse task failed: {err}"));
        }
    };

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "dispatch failed");
            error_response(err.to_string())
        }
    }
}

/// Decode urlencoded pairs, tolerating junk by returning what parsed.
/// The first occurrence of a repeated key wins.
fn decode_pairs(raw: &str) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    for (key, value) in serde_urlencoded::from_str::<Vec<(String, String)>>(raw).unwrap_or_default()
    {
        pairs.entry(key).or_insert(value);
    }
    pairs
}

fn is_form_content(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

// Failures at this layer still answer 200 with an error payload; the
// transport only reports whether it could talk to the server at all.
fn error_response(message: String) -> Response {
    let body = serde_json::json!({
        "status": "error",
        "error": message,
    });
    (StatusCode::OK, Json(body)).into_response()
}
