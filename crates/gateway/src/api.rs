//! HTTP API handlers.
//!
//! - `GET  /`                — Service info
//! - `GET  /health`          — Health check (`?deep=true` calls the provider)
//! - `POST /api/chat`        — One tutoring turn
//! - `POST /api/checkMemory` — Grade a from-memory reconstruction
//! - `POST /api/execute`     — Run a code snippet (off unless `[runner] enabled`)
//!
//! Request bodies are parsed by hand from raw bytes so that every
//! validation failure answers 400 with an `{error}` body.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use thinkfirst_core::context::ConversationContext;
use thinkfirst_core::message::ChatTurn;
use thinkfirst_runner::{ExecuteRequest, ExecuteResult};
use thinkfirst_tutor::{
    MemoryCheck, MemoryCheckRequest, ReplyMode, TimeTravelContext, TurnRequest,
};

use crate::SharedState;

const FEATURES: &[&str] = &[
    "Progressive Learning Mode",
    "Time-Travel Hints Mode",
    "Amnesia Mode (Memory Check)",
    "Real-Time Weather and News",
    "Code Execution",
    "Context-Aware Conversations",
];

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    /// 400 with `{error}`.
    BadRequest(String),
    /// 403 with `{error}`.
    Forbidden(String),
    /// 500 with `{error, detail}`.
    Internal { error: String, detail: String },
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(error) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error,
                    detail: None,
                },
            ),
            Self::Forbidden(error) => (
                StatusCode::FORBIDDEN,
                ErrorResponse {
                    error,
                    detail: None,
                },
            ),
            Self::Internal { error, detail } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error,
                    detail: Some(detail),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError::BadRequest(message.into())
}

// ── Info ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub(crate) struct ServiceInfo {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    features: &'static [&'static str],
    timestamp: String,
}

pub(crate) async fn root_handler() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "healthy",
        service: "ThinkFirst AI",
        version: env!("CARGO_PKG_VERSION"),
        features: FEATURES,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HealthParams {
    #[serde(default)]
    deep: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HealthResponse {
    status: &'static str,
    provider: String,
    model: String,
    /// `"configured"` when an API key was found at startup.
    api_key: &'static str,
    /// Only present for `?deep=true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    reachable: Option<bool>,
    realtime: Vec<String>,
    code_execution: &'static str,
    timestamp: String,
}

pub(crate) async fn health_handler(
    State(state): State<SharedState>,
    Query(params): Query<HealthParams>,
) -> Json<HealthResponse> {
    let reachable = if params.deep {
        Some(match state.tutor.provider_reachable().await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "Provider health check failed");
                false
            }
        })
    } else {
        None
    };

    Json(HealthResponse {
        status: if reachable == Some(false) {
            "degraded"
        } else {
            "healthy"
        },
        provider: state.tutor.provider_name().to_string(),
        model: state.tutor.model().to_string(),
        api_key: if state.api_key_configured {
            "configured"
        } else {
            "not_configured"
        },
        reachable,
        realtime: state
            .tutor
            .realtime()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        code_execution: if state.runner.is_some() {
            "enabled"
        } else {
            "disabled"
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// ── Chat ──────────────────────────────────────────────────────────────────

/// Validated `/api/chat` body.
#[derive(Debug)]
pub(crate) struct ChatRequest {
    message: String,
    history: Vec<ChatTurn>,
    context: Option<ConversationContext>,
    time_travel: Option<TimeTravelContext>,
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatResponse {
    text: String,
    mode: ReplyMode,
    is_hint: bool,
    is_solution: bool,
    conversation_context: ConversationContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_travel_context: Option<TimeTravelContext>,
}

fn parse_json_object(body: &[u8]) -> Result<serde_json::Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(bad_request("Request body must be a JSON object")),
        Err(e) => Err(bad_request(format!("Invalid JSON body: {e}"))),
    }
}

/// Deserialize an optional field; absent and `null` are both `None`.
fn optional_field<T: serde::de::DeserializeOwned>(
    body: &serde_json::Map<String, Value>,
    name: &str,
) -> Result<Option<T>, ApiError> {
    match body.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| bad_request(format!("{name} is malformed: {e}"))),
    }
}

pub(crate) fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, ApiError> {
    let body = parse_json_object(body)?;

    let message = match body.get("message") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) => return Err(bad_request("message must not be empty")),
        Some(_) => return Err(bad_request("message must be a string")),
        None => return Err(bad_request("message is required")),
    };

    let history = match body.get("conversationHistory") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value::<ChatTurn>(item.clone())
                    .map_err(|e| bad_request(format!("conversationHistory[{i}] is malformed: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(bad_request("conversationHistory must be an array")),
    };

    Ok(ChatRequest {
        message,
        history,
        context: optional_field(&body, "conversationContext")?,
        time_travel: optional_field(&body, "timeTravelContext")?,
        session_id: optional_field(&body, "sessionId")?,
    })
}

pub(crate) async fn chat_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = parse_chat_request(&body)?;
    info!(
        session = request.session_id.as_deref().unwrap_or("-"),
        history = request.history.len(),
        "Chat request"
    );

    let turn = TurnRequest {
        message: request.message,
        history: request.history,
        context: request.context,
        time_travel: request.time_travel,
    };

    let result = state.tutor.respond(turn).await.map_err(|e| {
        error!(error = %e, "Chat turn failed");
        ApiError::Internal {
            error: "Failed to process chat request".into(),
            detail: e.detail(),
        }
    })?;

    Ok(Json(ChatResponse {
        text: result.reply.text,
        mode: result.reply.mode,
        is_hint: result.reply.is_hint,
        is_solution: result.reply.is_solution,
        conversation_context: result.context,
        time_travel_context: result.time_travel,
    }))
}

// ── Memory check ─────────────────────────────────────────────────────────

pub(crate) async fn check_memory_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<MemoryCheck>, ApiError> {
    let body = parse_json_object(&body)?;
    let request: MemoryCheckRequest = serde_json::from_value(Value::Object(body))
        .map_err(|e| bad_request(format!("Invalid memory check request: {e}")))?;
    if let Some(field) = request.blank_field() {
        return Err(bad_request(format!("{field} must not be empty")));
    }

    info!(topic = ?request.current_topic, "Memory check request");
    let check = state.tutor.check_memory(&request).await.map_err(|e| {
        warn!(error = %e, "Memory check failed");
        ApiError::Internal {
            error: "Failed to check memory".into(),
            detail: e.detail(),
        }
    })?;
    Ok(Json(check))
}

// ── Code execution ───────────────────────────────────────────────────────

pub(crate) fn parse_execute_request(body: &[u8]) -> Result<ExecuteRequest, ApiError> {
    let body = parse_json_object(body)?;
    let request: ExecuteRequest = serde_json::from_value(Value::Object(body))
        .map_err(|e| bad_request(format!("Invalid execute request: {e}")))?;
    if request.code.trim().is_empty() {
        return Err(bad_request("code must not be empty"));
    }
    if request.language.trim().is_empty() {
        return Err(bad_request("language must not be empty"));
    }
    Ok(request)
}

pub(crate) async fn execute_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<ExecuteResult>, ApiError> {
    let Some(runner) = state.runner.as_ref() else {
        return Err(ApiError::Forbidden("Code execution is disabled".into()));
    };
    let request = parse_execute_request(&body)?;

    info!(language = %request.language, bytes = request.code.len(), "Execute request");
    let result = runner.execute(&request).await.map_err(|e| {
        error!(error = %e, "Code execution failed");
        ApiError::Internal {
            error: "Code execution failed".into(),
            detail: e.to_string(),
        }
    })?;
    Ok(Json(result))
}
