//! HTTP surface.
//!
//! A compact Axum router with two endpoints:
//!
//! - `POST /ai/get-review` – Summarise `{ "text": ..., "length"?: ... }` and
//!   return `{ "text": ..., "highlights": [...] }`.
//! - `GET /healthz` – Liveness probe, always `{ "ok": true }`.
//!
//! Error bodies are `{ "error": message }`: 400 for missing or blank text
//! (and for bodies that are not JSON), 413 for text over the character
//! limit, 500 for everything else. Internal error detail is logged, never
//! returned.
//!
//! The request-body limit is derived from the character limit (see
//! [`body_limit`]), and a body over it is answered like oversized text.

use crate::config::LengthMode;
use crate::error::{DocSumError, ErrorCategory};
use crate::output::SummaryResult;
use crate::summarize::Summarizer;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Read `DOCSUM_PORT` (or `PORT`) and `DOCSUM_BIND`, after loading a
    /// `.env` file when one exists. Unparseable ports fall back to the default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let port = lookup("DOCSUM_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|p| p.trim().parse::<u16>().ok())
            .unwrap_or(defaults.port);
        let bind = lookup("DOCSUM_BIND")
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(defaults.bind);
        Self { bind, port }
    }

    /// `bind:port`, ready for [`TcpListener::bind`].
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Worst-case JSON bytes per character: an escaped surrogate pair
/// (`\ud83d\ude00`) is 12 bytes.
const MAX_JSON_BYTES_PER_CHAR: usize = 12;

/// Room for the `length` field, keys and whitespace.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Largest request body that can still carry `max_text_chars` characters.
pub fn body_limit(max_text_chars: usize) -> usize {
    max_text_chars
        .saturating_mul(MAX_JSON_BYTES_PER_CHAR)
        .saturating_add(BODY_OVERHEAD_BYTES)
}

/// Build the HTTP router around a shared [`Summarizer`].
pub fn create_router(summarizer: Arc<Summarizer>) -> Router {
    let limit = body_limit(summarizer.max_text_chars());
    Router::new()
        .route("/ai/get-review", post(get_review))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(summarizer)
}

/// Bind `config.addr()` and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, summarizer: Arc<Summarizer>) -> Result<(), DocSumError> {
    let listener = TcpListener::bind(config.addr())
        .await
        .map_err(|e| DocSumError::Internal(format!("failed to bind {}: {}", config.addr(), e)))?;
    let local: SocketAddr = listener
        .local_addr()
        .map_err(|e| DocSumError::Internal(e.to_string()))?;
    info!(
        generative = summarizer.generative_enabled(),
        "Server listening on http://{}", local
    );

    axum::serve(listener, create_router(summarizer))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DocSumError::Internal(format!("server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Summarise the posted text.
async fn get_review(
    State(summarizer): State<Arc<Summarizer>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SummaryResult>, AppError> {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            debug!("Request body over limit: {}", rejection);
            let max = summarizer.max_text_chars();
            // Exact length unknown: the body was cut off at the limit.
            return Err(AppError(DocSumError::TextTooLarge {
                len: max.saturating_add(1),
                max,
            }));
        }
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection);
            return Err(AppError(DocSumError::EmptyText));
        }
    };

    let text = match body.get("text").and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Err(AppError(DocSumError::EmptyText)),
    };
    let length = LengthMode::from_hint(body.get("length").and_then(Value::as_str));

    let result = summarizer.summarize(text, length).await?;
    Ok(Json(SummaryResult::normalized(&result.text, &result.highlights)))
}

struct AppError(DocSumError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match (self.0.category(), &self.0) {
            (ErrorCategory::Input, DocSumError::TextTooLarge { .. }) => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.0.to_string())
            }
            (ErrorCategory::Input, _) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            _ => {
                error!(error = %self.0, "Error in /ai/get-review");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<DocSumError> for AppError {
    fn from(inner: DocSumError) -> Self {
        Self(inner)
    }
}
