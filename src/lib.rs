//! # Scoring: Validated JSON Method-Call Dispatch
//!
//! This crate implements a small network service that accepts JSON-encoded
//! method calls, validates their arguments against declarative schemas,
//! authenticates the caller, and dispatches to one of two business handlers:
//! an online-score computation and a client-interests lookup.
//!
//! ## Core Concepts
//!
//! ### Fields
//! A field is a named, typed validation unit with a required/nullable policy
//! and a format check. Field definitions are immutable descriptors shared
//! read-only across requests; values live in per-request storage so no state
//! can leak between concurrent calls.
//!
//! ### Schemas
//! A schema is an ordered set of fields defining one request's shape: the
//! top-level envelope (`account`, `login`, `token`, `arguments`, `method`)
//! and the per-method argument schemas. Validation walks declaration order,
//! fails fast on the first violation, and then applies any cross-field
//! business rule. Each validated schema derives a small `context` mapping
//! used for logging, never for the client-visible body.
//!
//! ### Auth Gate
//! Ordinary callers authenticate with a SHA-512 token over account + login +
//! a shared secret; the administrative identity uses a token bucketed to the
//! current clock hour. A failed check is a forbidden outcome, never an error.
//!
//! ### Store
//! Handlers reach their data through an opaque key-value [`Store`] with a
//! durable plane (hard errors) and a cache plane (degrades to a miss).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ HTTP API Layer (Axum, POST /method)     │
//! ├─────────────────────────────────────────┤
//! │ Dispatcher (parse → validate → auth     │
//! │             → route → handler)          │
//! ├─────────────────────────────────────────┤
//! │ Request Schemas (envelope + arguments)  │
//! ├─────────────────────────────────────────┤
//! │ Field Validation (presence + format)    │
//! ├─────────────────────────────────────────┤
//! │ Store (trait-based abstraction)         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage Examples
//!
//! ### Validating a Request Schema
//!
//! ```rust
//! use scoring::OnlineScoreRequest;
//! use serde_json::json;
//!
//! let args = json!({"phone": "79175002040", "email": "stupnikov@otus.ru"});
//! let request = OnlineScoreRequest::from_args(args.as_object().unwrap());
//! assert!(request.validate_fields().is_ok());
//! assert_eq!(request.context()["has"], json!(["email", "phone"]));
//!
//! // A single unpaired field is well-formed but insufficient.
//! let args = json!({"first_name": "a"});
//! let request = OnlineScoreRequest::from_args(args.as_object().unwrap());
//! assert!(request.validate_fields().is_err());
//! ```
//!
//! ### Dispatching a Method Call
//!
//! ```rust
//! use scoring::{handle_method, user_token, Context, InMemoryStore};
//! use serde_json::json;
//!
//! let store = InMemoryStore::new();
//! let mut ctx = Context::new();
//! let body = json!({
//!     "account": "horns&hoofs",
//!     "login": "h&f",
//!     "token": user_token("horns&hoofs", "h&f"),
//!     "method": "online_score",
//!     "arguments": {"phone": "79175002040", "email": "stupnikov@otus.ru"},
//! });
//! let payload = handle_method(&body, &mut ctx, &store).unwrap();
//! assert_eq!(payload, json!({"score": 3.0}));
//! ```

#![deny(missing_docs)]
mod auth;
mod dispatch;
mod errors;
mod field;
mod request;
mod scoring;
mod store;

/// Command-line interface utilities for program termination and output
/// formatting, shared by the scoring binaries.
pub mod cli_utils;

/// HTTP client utilities for posting method calls to a running daemon.
pub mod http_utils;

pub use auth::{ADMIN_SALT, SALT, admin_token_now, check_auth, user_token};
pub use dispatch::{MethodResponse, REQUEST_ID_HEADER, create_method_router, handle_method};
pub use errors::{ApiError, StoreError};
pub use field::{
    DATE_FORMAT, FEMALE, FieldDef, FieldKind, MALE, MAX_AGE_YEARS, UNKNOWN, ValidationError,
};
pub use request::{
    ADMIN_LOGIN, ClientsInterestsRequest, Context, MethodRequest, OnlineScoreRequest,
};
pub use scoring::{ADMIN_SCORE, SCORE_CACHE_TTL, ScoreQuery, get_interests, get_score};
pub use store::{InMemoryStore, Retry, Store};
