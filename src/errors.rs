//! Error types for scoring operations.

use crate::field::ValidationError;

/// Errors that terminate a method call, mapped one-to-one onto response codes.
///
/// The dispatch boundary performs a single exhaustive match over this enum to
/// pick the response code and the client-visible message. Internal detail is
/// never echoed for internal errors; clients see the standard phrase only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request body was unreadable or not valid JSON (400).
    MalformedInput(String),
    /// The top-level path is not served (404).
    UnknownRoute,
    /// The envelope or method arguments failed validation, or the method name
    /// is not in the router table (422).
    InvalidRequest(String),
    /// The auth gate rejected the supplied token (403).
    Forbidden,
    /// Anything unexpected, including store failures that were not already
    /// translated (500).
    Internal(String),
}

impl ApiError {
    /// The response code this error maps to.
    pub fn code(&self) -> u16 {
        match self {
            Self::MalformedInput(_) => 400,
            Self::Forbidden => 403,
            Self::UnknownRoute => 404,
            Self::InvalidRequest(_) => 422,
            Self::Internal(_) => 500,
        }
    }

    /// The standard phrase for this error's response code.
    pub fn phrase(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::UnknownRoute => "Not Found",
            Self::InvalidRequest(_) => "Invalid Request",
            Self::Internal(_) => "Internal Server Error",
        }
    }

    /// The message placed in the response envelope's `error` key.
    ///
    /// Validation failures carry their human-readable message; everything
    /// else gets the standard phrase so internals never leak to clients.
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidRequest(msg) if !msg.is_empty() => msg.clone(),
            _ => self.phrase().to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedInput(msg) => write!(f, "Malformed input: {}", msg),
            Self::UnknownRoute => write!(f, "Unknown route"),
            Self::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            Self::Forbidden => write!(f, "Forbidden"),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::InvalidRequest(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

/// Errors that can occur during store operations.
///
/// Only the plain `get`/`set` paths surface these; the cache paths degrade to
/// a miss instead so that a cache outage never fails an otherwise-valid
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached after the retry budget was exhausted.
    Unavailable(String),
    /// A stored payload could not be decoded.
    Serialization(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            Self::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}
