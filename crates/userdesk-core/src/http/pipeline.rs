//! Request and failure stages run by the adapter
//!
//! Request stages see every outgoing request before dispatch and may mutate
//! it or reject it. Failure stages observe every normalized error before the
//! call rejects.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{AsHeaderName, HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use url::Url;

use super::error::{Failure, NormalizedError, TypeError};
use crate::ports::{KeyValueStore, Location};
use crate::storage::get_storage_item;

pub const CLIENT_IDENTIFIER_HEADER: HeaderName = HeaderName::from_static("x-client-identifier");
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A request as seen by the stages, before it is handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    /// Names compare case-insensitively
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl OutgoingRequest {
    pub fn new(method: Method, url: Url) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        Self {
            method,
            url,
            headers,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Set a header, replacing any value under the same name in any case
    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<(), Failure> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| TypeError::new(format!("Invalid value for header '{}': {}", name, e)))?;
        self.headers.insert(name, value);
        Ok(())
    }
}

/// A transformation applied to every outgoing request
pub trait RequestStage: Send + Sync {
    fn apply(&self, request: OutgoingRequest) -> Result<OutgoingRequest, Failure>;
}

/// An observer of every normalized failure
pub trait FailureStage: Send + Sync {
    fn on_failure(&self, error: &NormalizedError);
}

/// Attaches the client identifier and bearer token from storage
///
/// Routes whose second segment is the bypass segment are left untouched.
pub struct CredentialStage {
    store: Arc<dyn KeyValueStore>,
    location: Arc<dyn Location>,
    client_tag: String,
    bypass_segment: String,
    token_key: String,
    client_identifier_key: String,
}

impl CredentialStage {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        location: Arc<dyn Location>,
        client_tag: impl Into<String>,
        bypass_segment: impl Into<String>,
    ) -> Self {
        Self {
            store,
            location,
            client_tag: client_tag.into(),
            bypass_segment: bypass_segment.into(),
            token_key: super::config::DEFAULT_TOKEN_KEY.to_string(),
            client_identifier_key: super::config::DEFAULT_CLIENT_IDENTIFIER_KEY.to_string(),
        }
    }

    pub fn with_keys(mut self, token_key: impl Into<String>, client_identifier_key: impl Into<String>) -> Self {
        self.token_key = token_key.into();
        self.client_identifier_key = client_identifier_key.into();
        self
    }

    fn is_bypassed(&self) -> bool {
        self.location.hash().split('/').nth(1) == Some(self.bypass_segment.as_str())
    }

    fn read(&self, key: &str) -> Option<String> {
        match get_storage_item(self.store.as_ref(), key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring unreadable stored credential");
                None
            }
        }
    }
}

impl RequestStage for CredentialStage {
    fn apply(&self, mut request: OutgoingRequest) -> Result<OutgoingRequest, Failure> {
        if self.is_bypassed() {
            tracing::debug!(route = %self.location.hash(), "Bypass route, credentials not attached");
            return Ok(request);
        }

        if let Some(identifier) = self.read(&self.client_identifier_key) {
            request.set_header(
                CLIENT_IDENTIFIER_HEADER,
                &format!("{};{}", self.client_tag, identifier),
            )?;
        }

        if let Some(token) = self.read(&self.token_key) {
            request.set_header(AUTHORIZATION, &format!("Bearer {}", token))?;
        }

        Ok(request)
    }
}

impl fmt::Debug for CredentialStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStage")
            .field("client_tag", &self.client_tag)
            .field("bypass_segment", &self.bypass_segment)
            .finish_non_exhaustive()
    }
}

/// Sends the application back to its root when a resource is gone
pub struct RedirectOnNotFound {
    location: Arc<dyn Location>,
}

impl RedirectOnNotFound {
    pub fn new(location: Arc<dyn Location>) -> Self {
        Self { location }
    }
}

impl FailureStage for RedirectOnNotFound {
    fn on_failure(&self, error: &NormalizedError) {
        if error.status == 404 {
            tracing::warn!("Resource not found, redirecting to application root");
            self.location.redirect_to_root();
        }
    }
}
