//! Error normalization
//!
//! Turns any [`Failure`] into a [`NormalizedError`]. Classification is total:
//! every input produces an error, first matching rule wins:
//!
//! 1. local type error → 1000 / `TypeError`
//! 2. transport error with a response → the real status, with per-status
//!    message rules
//! 3. transport error with a request but no response → request status/text
//! 4. transport error with neither → 1001 / `Error`
//! 5. anything else → 1002 / `Error`
//!
//! Cancellation is not special-cased; it lands in 3 or 4 with the message
//! `canceled`.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::error::{
    status_name, ErrorKind, Failure, NormalizedError, ResponseContext, TransportError,
    CONFLICT_MESSAGE, STATUS_REQUEST_SETUP_ERROR, STATUS_UNCLASSIFIED_ERROR,
};
use crate::ports::KeyValueStore;

/// Result of classifying a failure
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub error: NormalizedError,
    /// The stored credentials are no longer valid and must be dropped
    pub forget_credentials: bool,
}

/// Classify a failure without performing any side effect
pub fn classify(failure: &Failure) -> Classification {
    let error = match failure {
        Failure::Type(err) => NormalizedError::type_error(err.clone()),
        Failure::Transport(err) => return classify_transport(err),
        Failure::Other(err) => NormalizedError::new(
            ErrorKind::Unclassified,
            STATUS_UNCLASSIFIED_ERROR,
            "Error",
            err.to_string(),
        ),
        Failure::Value(value) => NormalizedError::new(
            ErrorKind::Unclassified,
            STATUS_UNCLASSIFIED_ERROR,
            "Error",
            error_message_of(value),
        ),
    };

    Classification {
        error,
        forget_credentials: false,
    }
}

fn classify_transport(err: &TransportError) -> Classification {
    if let Some(response) = &err.response {
        return classify_response(err, response);
    }

    let error = match &err.request {
        Some(request) => NormalizedError::new(
            ErrorKind::RequestWithoutResponse,
            request.status,
            request.status_text.clone(),
            err.message.clone(),
        ),
        None => NormalizedError::new(
            ErrorKind::Unclassified,
            STATUS_REQUEST_SETUP_ERROR,
            "Error",
            err.message.clone(),
        ),
    };

    Classification {
        error,
        forget_credentials: false,
    }
}

fn classify_response(err: &TransportError, response: &ResponseContext) -> Classification {
    let mut message = err.message.clone();
    let mut forget_credentials = false;
    let name = status_name(response.status);

    if name == Some("Conflict") {
        message = CONFLICT_MESSAGE.to_string();
    }

    match name {
        Some(name @ "Unauthorized") => {
            message = format!("{} credential", name);
            forget_credentials = true;
        }
        Some(name @ "Gateway Timeout") => {
            message = name.to_string();
        }
        Some("Internal Server Error") => {
            if let Some(body_message) = response.body.get("message") {
                message = match body_message {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
            }
        }
        _ => {}
    }

    Classification {
        error: NormalizedError::new(
            ErrorKind::Response,
            response.status,
            response.status_text.clone(),
            message,
        ),
        forget_credentials,
    }
}

/// Best-effort human message for an arbitrary value
///
/// Uses a string `message` field when the value has one, otherwise the JSON
/// rendering of the value, otherwise its debug rendering.
pub fn error_message_of<T>(value: &T) -> String
where
    T: Serialize + fmt::Debug + ?Sized,
{
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => match map.get("message") {
            Some(Value::String(message)) => message.clone(),
            _ => Value::Object(map).to_string(),
        },
        Ok(other) => other.to_string(),
        Err(_) => format!("{:?}", value),
    }
}

/// Normalizer bound to the credential store it may have to clear
#[derive(Clone)]
pub struct ErrorNormalizer {
    store: Arc<dyn KeyValueStore>,
    token_key: String,
}

impl ErrorNormalizer {
    pub fn new(store: Arc<dyn KeyValueStore>, token_key: impl Into<String>) -> Self {
        Self {
            store,
            token_key: token_key.into(),
        }
    }

    /// Classify `failure` and apply its side effects
    pub fn normalize(&self, failure: Failure) -> NormalizedError {
        let Classification {
            error,
            forget_credentials,
        } = classify(&failure);

        if forget_credentials {
            tracing::warn!(status = error.status, "Credential rejected, clearing stored token");
            if let Err(e) = self.store.remove_item(&self.token_key) {
                tracing::error!(error = %e, "Failed to clear stored token");
            }
        }

        error
    }
}

impl fmt::Debug for ErrorNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorNormalizer")
            .field("token_key", &self.token_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::error::{TypeError, CANCELED_MESSAGE, STATUS_TYPE_ERROR};
    use crate::ports::MemoryStore;
    use serde_json::json;

    fn response_failure(status: u16, status_text: &str, body: Value) -> Failure {
        Failure::Transport(TransportError::with_response(status, status_text, body))
    }

    #[test]
    fn test_type_error() {
        let c = classify(&Failure::Type(TypeError::new("expected an array")));
        assert_eq!(c.error.status, STATUS_TYPE_ERROR);
        assert_eq!(c.error.status_text, "TypeError");
        assert_eq!(c.error.kind(), ErrorKind::LocalType);
        assert!(!c.forget_credentials);
    }

    #[test]
    fn test_unauthorized() {
        let c = classify(&response_failure(401, "Unauthorized", json!({})));
        assert_eq!(c.error.status, 401);
        assert_eq!(c.error.status_text, "Unauthorized");
        assert_eq!(c.error.message_text(), "Unauthorized credential");
        assert!(c.forget_credentials);
    }

    #[test]
    fn test_conflict_message_is_fixed() {
        let mut err = TransportError::with_response(409, "Conflict", json!({"message": "dup"}));
        err.message = "something else entirely".to_string();

        let c = classify(&Failure::Transport(err));
        assert_eq!(c.error.message_text(), CONFLICT_MESSAGE);
    }

    #[test]
    fn test_gateway_timeout() {
        let c = classify(&response_failure(504, "Gateway Timeout", json!("upstream")));
        assert_eq!(c.error.message_text(), "Gateway Timeout");
    }

    #[test]
    fn test_server_error_uses_body_message() {
        let c = classify(&response_failure(500, "Internal Server Error", json!({"message": "db down"})));
        assert_eq!(c.error.message_text(), "db down");

        let c = classify(&response_failure(500, "Internal Server Error", json!({"detail": "x"})));
        assert_eq!(c.error.message_text(), "Request failed with status code 500");

        let c = classify(&response_failure(500, "Internal Server Error", json!("plain text")));
        assert_eq!(c.error.message_text(), "Request failed with status code 500");
    }

    #[test]
    fn test_unmapped_status_keeps_transport_message() {
        let c = classify(&response_failure(418, "I'm a teapot", json!(null)));
        assert_eq!(c.error.status, 418);
        assert_eq!(c.error.status_text, "I'm a teapot");
        assert_eq!(c.error.message_text(), "Request failed with status code 418");
        assert_eq!(c.error.kind(), ErrorKind::Response);
    }

    #[test]
    fn test_mapped_status_without_rule_keeps_message() {
        let c = classify(&response_failure(403, "Forbidden", json!({"message": "nope"})));
        assert_eq!(c.error.message_text(), "Request failed with status code 403");
    }

    #[test]
    fn test_request_without_response() {
        let c = classify(&Failure::Transport(TransportError::without_response("connection refused")));
        assert_eq!(c.error.status, 0);
        assert_eq!(c.error.status_text, "");
        assert_eq!(c.error.message_text(), "connection refused");
        assert_eq!(c.error.kind(), ErrorKind::RequestWithoutResponse);
    }

    #[test]
    fn test_cancellation_paths() {
        let before = classify(&Failure::Transport(TransportError::canceled_before_dispatch()));
        assert_eq!(before.error.status, STATUS_REQUEST_SETUP_ERROR);
        assert_eq!(before.error.status_text, "Error");
        assert!(before.error.is_canceled());

        let during = classify(&Failure::Transport(TransportError::canceled_in_flight()));
        assert_eq!(during.error.status, 0);
        assert_eq!(during.error.message_text(), CANCELED_MESSAGE);
    }

    #[test]
    fn test_other_failures() {
        let c = classify(&Failure::Other(anyhow::anyhow!("disk on fire")));
        assert_eq!(c.error.status, STATUS_UNCLASSIFIED_ERROR);
        assert_eq!(c.error.status_text, "Error");
        assert_eq!(c.error.message_text(), "disk on fire");

        let c = classify(&Failure::Value(json!({"message": "from value"})));
        assert_eq!(c.error.message_text(), "from value");

        let c = classify(&Failure::Value(json!({"code": 7})));
        assert_eq!(c.error.message_text(), r#"{"code":7}"#);
    }

    #[derive(Debug)]
    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cycle detected"))
        }
    }

    #[test]
    fn test_message_extraction_fallbacks() {
        assert_eq!(error_message_of(&json!({"message": 5})), r#"{"message":5}"#);
        assert_eq!(error_message_of("text"), r#""text""#);
        assert_eq!(error_message_of(&42), "42");
        assert_eq!(error_message_of(&Unserializable), "Unserializable");
    }

    #[test]
    fn test_normalize_clears_token_on_401() {
        let store = Arc::new(MemoryStore::new());
        store.set_item("token", "\"abc\"").unwrap();
        store.set_item("xClientIdentifier", "\"desk\"").unwrap();

        let normalizer = ErrorNormalizer::new(store.clone(), "token");
        let err = normalizer.normalize(response_failure(401, "Unauthorized", json!({})));

        assert_eq!(err.status, 401);
        assert_eq!(store.get_item("token").unwrap(), None);
        assert!(store.get_item("xClientIdentifier").unwrap().is_some());
    }

    #[test]
    fn test_normalize_leaves_token_otherwise() {
        let store = Arc::new(MemoryStore::new());
        store.set_item("token", "\"abc\"").unwrap();

        let normalizer = ErrorNormalizer::new(store.clone(), "token");
        normalizer.normalize(response_failure(403, "Forbidden", json!({})));
        assert!(store.get_item("token").unwrap().is_some());
    }
}
