//! # Method Router and Dispatcher
//!
//! The orchestration entry point for one method call. Control flow is a
//! straight line with terminal exits:
//!
//! ```text
//! raw bytes → JSON value → envelope validation → auth gate
//!           → method lookup → argument validation → handler → envelope
//! ```
//!
//! Each exit maps to exactly one [`ApiError`] kind and response code; the
//! boundary here performs the single exhaustive match that turns errors into
//! the uniform response envelope (`response` or `error`, plus `code`, never
//! both). Handlers never re-enter the dispatcher, and a panicking handler is
//! contained so one failing request cannot take down the serving loop.
//!
//! Each request also accumulates a logging [`Context`]: the request id plus
//! whatever the validated schema derives (`has`, `nclients`). The context is
//! logged after the response is built and never enters the client-visible
//! body.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::auth::check_auth;
use crate::errors::ApiError;
use crate::request::{ClientsInterestsRequest, Context, MethodRequest, OnlineScoreRequest};
use crate::scoring::{get_interests, get_score, ADMIN_SCORE, ScoreQuery};
use crate::store::Store;

/// The header carrying a caller-chosen request id, echoed into the log
/// context. Absent, the dispatcher generates an opaque one.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

//////////////////////////////////////////// MethodResponse ///////////////////////////////////////

/// The uniform response envelope: exactly one of `response` or `error`,
/// plus the response code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodResponse {
    /// The handler's payload, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    /// The failure message or standard phrase, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The response code, duplicated from the HTTP status.
    pub code: u16,
}

impl MethodResponse {
    /// Wraps a successful handler payload.
    pub fn ok(payload: Value) -> Self {
        Self {
            response: Some(payload),
            error: None,
            code: 200,
        }
    }

    /// Wraps a terminal failure.
    pub fn failure(err: &ApiError) -> Self {
        Self {
            response: None,
            error: Some(err.client_message()),
            code: err.code(),
        }
    }
}

////////////////////////////////////////////// Handlers ///////////////////////////////////////////

type MethodHandler = fn(&MethodRequest, &mut Context, &dyn Store) -> Result<Value, ApiError>;

fn route(method: &str) -> Option<MethodHandler> {
    match method {
        "online_score" => Some(online_score),
        "clients_interests" => Some(clients_interests),
        _ => None,
    }
}

/// Handles `online_score`: validates the arguments schema, merges its
/// context, and returns `{"score": ...}`.
///
/// Administrative callers get the fixed sentinel score without touching the
/// store.
fn online_score(
    envelope: &MethodRequest,
    ctx: &mut Context,
    store: &dyn Store,
) -> Result<Value, ApiError> {
    let request = OnlineScoreRequest::from_args(&envelope.arguments());
    request.validate_fields()?;
    ctx.extend(request.context());

    if envelope.is_admin() {
        return Ok(serde_json::json!({"score": ADMIN_SCORE}));
    }
    let query = ScoreQuery {
        first_name: request.first_name(),
        last_name: request.last_name(),
        phone: request.phone(),
        email: request.email(),
        birthday: request.birthday(),
        gender: request.gender(),
    };
    let score = get_score(store, &query)?;
    Ok(serde_json::json!({"score": score}))
}

/// Handles `clients_interests`: validates the arguments schema, merges its
/// context, and returns a mapping from each client id (as a string key) to
/// that client's interests.
fn clients_interests(
    envelope: &MethodRequest,
    ctx: &mut Context,
    store: &dyn Store,
) -> Result<Value, ApiError> {
    let request = ClientsInterestsRequest::from_args(&envelope.arguments());
    request.validate_fields()?;
    ctx.extend(request.context());

    let mut interests = Map::new();
    for client_id in request.client_ids() {
        let found = get_interests(store, client_id)?;
        interests.insert(client_id.to_string(), Value::from(found));
    }
    Ok(Value::Object(interests))
}

////////////////////////////////////////////// Dispatch ///////////////////////////////////////////

/// Runs one parsed method call through the validation/auth/dispatch chain.
///
/// The body must already be parsed JSON; parse failures are the transport
/// layer's 400. Everything past parsing funnels through here so the inline
/// tests can exercise the full state machine without a socket.
pub fn handle_method(
    body: &Value,
    ctx: &mut Context,
    store: &dyn Store,
) -> Result<Value, ApiError> {
    let args = body.as_object().ok_or_else(|| {
        ApiError::InvalidRequest("request body must be a JSON object".to_string())
    })?;
    let envelope = MethodRequest::from_args(args);
    envelope.validate_fields()?;
    if !check_auth(&envelope) {
        return Err(ApiError::Forbidden);
    }
    let handler = route(envelope.method()).ok_or_else(|| {
        ApiError::InvalidRequest(format!("method '{}' is not supported", envelope.method()))
    })?;
    handler(&envelope, ctx, store)
}

fn generate_request_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut hasher = Sha256::new();
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(nanos.to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..32].to_string()
}

async fn method_post(
    axum::extract::State(store): axum::extract::State<Arc<dyn Store>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<MethodResponse>) {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(generate_request_id);
    let mut ctx = Context::new();
    ctx.insert("request_id".to_string(), Value::from(request_id.clone()));

    let outcome = match serde_json::from_slice::<Value>(&body) {
        Err(e) => Err(ApiError::MalformedInput(e.to_string())),
        Ok(parsed) => {
            // Contain handler panics at the dispatch boundary: the serving
            // loop must outlive any single failing request.
            std::panic::catch_unwind(AssertUnwindSafe(|| {
                handle_method(&parsed, &mut ctx, store.as_ref())
            }))
            .unwrap_or_else(|_| Err(ApiError::Internal("handler panicked".to_string())))
        }
    };

    let response = match outcome {
        Ok(payload) => MethodResponse::ok(payload),
        Err(ref err) => {
            if let ApiError::Internal(detail) = err {
                tracing::error!(request_id = %request_id, %detail, "unexpected failure");
            }
            MethodResponse::failure(err)
        }
    };
    let context = Value::Object(ctx);
    tracing::info!(
        request_id = %request_id,
        code = response.code,
        %context,
        "method call"
    );

    let status =
        StatusCode::from_u16(response.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response))
}

async fn unknown_route() -> (StatusCode, Json<MethodResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(MethodResponse::failure(&ApiError::UnknownRoute)),
    )
}

/// Creates the method-call router with the single `POST /method` endpoint
/// and an envelope-shaped 404 fallback.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use scoring::{InMemoryStore, create_method_router};
/// let store: Arc<dyn scoring::Store> = Arc::new(InMemoryStore::new());
/// let router = create_method_router(store);
/// ```
pub fn create_method_router(store: Arc<dyn Store>) -> Router {
    Router::new()
        .route("/method", post(method_post))
        .fallback(unknown_route)
        .with_state(store)
}
