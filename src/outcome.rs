// Outcome model: the value returned by `ApiClient::dispatch`.
// A successful call yields a `GeneratedFile`; every failure is one variant
// of `DispatchError`. Nothing here performs I/O.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Result of one dispatch. Callers match on it; it never needs `?`.
pub type Outcome = std::result::Result<GeneratedFile, DispatchError>;

/// What the service reports after generating the workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub file_path: String,
    pub message: String,
}

/// Body of a non-2xx response. JSON bodies are surfaced as decoded values,
/// anything else as the raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetails {
    Json(Value),
    Text(String),
}

impl ErrorDetails {
    /// Decode a response body, falling back to the raw text.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => ErrorDetails::Json(value),
            Err(_) => ErrorDetails::Text(body.to_string()),
        }
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorDetails::Json(value) => write!(f, "{}", value),
            ErrorDetails::Text(text) => f.write_str(text),
        }
    }
}

/// Every way a dispatch can fail. None of these are retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("no project path was provided")]
    InvalidInput,

    #[error("service answered with HTTP {code}: {details}")]
    Http { code: u16, details: ErrorDetails },

    #[error("could not decode the service response as JSON: {raw}")]
    Decode { raw: String },

    #[error("service reported a failure: {message}")]
    ServerReported { message: String },

    #[error("could not connect to the service: {0}")]
    Connection(String),

    #[error("the request exceeded the wait limit: {0}")]
    Timeout(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl DispatchError {
    /// Short heading used by the console renderer.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::InvalidInput => "Invalid input",
            DispatchError::Http { .. } => "HTTP error",
            DispatchError::Decode { .. } => "Decode error",
            DispatchError::ServerReported { .. } => "Service error",
            DispatchError::Connection(_) => "Connection error",
            DispatchError::Timeout(_) => "Timeout",
            DispatchError::Transport(_) => "Request error",
            DispatchError::Unexpected(_) => "Unexpected error",
        }
    }
}
