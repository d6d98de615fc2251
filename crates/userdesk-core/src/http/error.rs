//! Failure inputs and the normalized error shape
//!
//! [`Failure`] is everything that can go wrong inside a call: a local type
//! problem, a transport failure (with or without a response), or anything
//! else. [`NormalizedError`] is the single shape callers ever see.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Status used for local type errors detected before any network round-trip
pub const STATUS_TYPE_ERROR: u16 = 1000;
/// Status used for transport errors with neither request nor response context
pub const STATUS_REQUEST_SETUP_ERROR: u16 = 1001;
/// Status used for failures that are not transport errors at all
pub const STATUS_UNCLASSIFIED_ERROR: u16 = 1002;

/// Message carried by every cancellation
pub const CANCELED_MESSAGE: &str = "canceled";

/// Message used for 409 responses regardless of what the transport said
pub const CONFLICT_MESSAGE: &str =
    "There was a request conflict with the current state of the target resource";

/// Name of a status code, for the codes the normalizer has rules about
pub fn status_name(status: u16) -> Option<&'static str> {
    match status {
        400 => Some("Bad Request"),
        401 => Some("Unauthorized"),
        403 => Some("Forbidden"),
        404 => Some("Not Found"),
        409 => Some("Conflict"),
        500 => Some("Internal Server Error"),
        502 => Some("Bad Gateway"),
        503 => Some("Service Unavailable"),
        504 => Some("Gateway Timeout"),
        _ => None,
    }
}

/// A value of the wrong shape, caught locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeError {
    pub message: String,
}

impl TypeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeError: {}", self.message)
    }
}

impl std::error::Error for TypeError {}

/// The response half of a transport failure
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseContext {
    pub status: u16,
    pub status_text: String,
    /// Response body, parsed as JSON when possible, otherwise a JSON string
    pub body: Value,
}

/// The request half of a transport failure
///
/// A request that never got a response has no meaningful status, so both
/// fields are usually `0` and empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub status: u16,
    pub status_text: String,
}

/// A failure reported by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError {
    pub message: String,
    pub request: Option<RequestContext>,
    pub response: Option<ResponseContext>,
}

impl TransportError {
    /// Failure before anything was sent
    pub fn setup(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            request: None,
            response: None,
        }
    }

    /// Request went out but no response came back
    pub fn without_response(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            request: Some(RequestContext::default()),
            response: None,
        }
    }

    /// Server answered with a non-success status
    pub fn with_response(status: u16, status_text: impl Into<String>, body: Value) -> Self {
        Self {
            message: format!("Request failed with status code {}", status),
            request: Some(RequestContext::default()),
            response: Some(ResponseContext {
                status,
                status_text: status_text.into(),
                body,
            }),
        }
    }

    /// Cancellation observed before dispatch
    pub fn canceled_before_dispatch() -> Self {
        Self::setup(CANCELED_MESSAGE)
    }

    /// Cancellation of an exchange that was already on the wire
    pub fn canceled_in_flight() -> Self {
        Self::without_response(CANCELED_MESSAGE)
    }

    /// Map a `reqwest` error onto request/response context
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_builder() {
            Self::setup(error.to_string())
        } else {
            Self::without_response(error.to_string())
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

/// Anything that can make a call fail, before normalization
#[derive(Debug)]
pub enum Failure {
    /// Malformed value detected locally
    Type(TypeError),
    /// Failure reported by the transport
    Transport(TransportError),
    /// An arbitrary error that is not a transport error
    Other(anyhow::Error),
    /// An arbitrary rejected value
    Value(Value),
}

impl From<TypeError> for Failure {
    fn from(err: TypeError) -> Self {
        Failure::Type(err)
    }
}

impl From<TransportError> for Failure {
    fn from(err: TransportError) -> Self {
        Failure::Transport(err)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Failure::Other(err)
    }
}

/// Which branch of the taxonomy a [`NormalizedError`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Status 1000
    LocalType,
    /// Real HTTP status from the server
    Response,
    /// Request issued, no response received
    RequestWithoutResponse,
    /// Status 1001 or 1002
    Unclassified,
}

/// Detail of a [`NormalizedError`]: usually text, sometimes the type error itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    Text(String),
    TypeError(TypeError),
}

impl ErrorMessage {
    pub fn as_text(&self) -> &str {
        match self {
            ErrorMessage::Text(text) => text,
            ErrorMessage::TypeError(err) => &err.message,
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMessage::Text(text) => f.write_str(text),
            ErrorMessage::TypeError(err) => write!(f, "{}", err),
        }
    }
}

impl PartialEq<&str> for ErrorMessage {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, ErrorMessage::Text(text) if text == other)
    }
}

/// Canonical failure shape returned by every adapter call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedError {
    pub status: u16,
    pub status_text: String,
    pub message: ErrorMessage,
    #[serde(skip_serializing, default = "default_kind")]
    kind: ErrorKind,
}

fn default_kind() -> ErrorKind {
    ErrorKind::Unclassified
}

impl NormalizedError {
    pub fn new(
        kind: ErrorKind,
        status: u16,
        status_text: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            message: ErrorMessage::Text(message.into()),
            kind,
        }
    }

    /// Status 1000 error carrying the original type error
    pub fn type_error(err: TypeError) -> Self {
        Self {
            status: STATUS_TYPE_ERROR,
            status_text: "TypeError".to_string(),
            message: ErrorMessage::TypeError(err),
            kind: ErrorKind::LocalType,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The message as plain text
    pub fn message_text(&self) -> &str {
        self.message.as_text()
    }

    /// Whether the call ended because it was canceled
    pub fn is_canceled(&self) -> bool {
        self.message == CANCELED_MESSAGE
    }
}

impl fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status_text.is_empty() {
            write!(f, "[{}] {}", self.status, self.message)
        } else {
            write!(f, "[{} {}] {}", self.status, self.status_text, self.message)
        }
    }
}

impl std::error::Error for NormalizedError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_names() {
        assert_eq!(status_name(401), Some("Unauthorized"));
        assert_eq!(status_name(504), Some("Gateway Timeout"));
        assert_eq!(status_name(418), None);
        assert_eq!(status_name(200), None);
    }

    #[test]
    fn test_transport_constructors() {
        let err = TransportError::with_response(502, "Bad Gateway", json!(null));
        assert_eq!(err.message, "Request failed with status code 502");
        assert!(err.request.is_some());
        assert_eq!(err.response.as_ref().map(|r| r.status), Some(502));

        let err = TransportError::canceled_before_dispatch();
        assert!(err.request.is_none() && err.response.is_none());

        let err = TransportError::canceled_in_flight();
        assert_eq!(err.request, Some(RequestContext::default()));
        assert_eq!(err.message, CANCELED_MESSAGE);
    }

    #[test]
    fn test_normalized_error_serializes_camel_case() {
        let err = NormalizedError::new(ErrorKind::Response, 404, "Not Found", "gone");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value, json!({"status": 404, "statusText": "Not Found", "message": "gone"}));
    }

    #[test]
    fn test_type_error_message() {
        let err = NormalizedError::type_error(TypeError::new("relative URL without a base"));
        assert_eq!(err.status, STATUS_TYPE_ERROR);
        assert_eq!(err.kind(), ErrorKind::LocalType);
        assert_eq!(err.message_text(), "relative URL without a base");
        assert_eq!(err.to_string(), "[1000 TypeError] TypeError: relative URL without a base");
        assert!(!err.is_canceled());
    }

    #[test]
    fn test_canceled_detection() {
        let err = NormalizedError::new(ErrorKind::RequestWithoutResponse, 0, "", CANCELED_MESSAGE);
        assert!(err.is_canceled());
        assert_eq!(err.to_string(), "[0] canceled");
    }
}
