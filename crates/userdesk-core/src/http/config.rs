//! Adapter and per-request configuration

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::abort::AbortSignal;
use crate::{Error, Result};

/// Environment variable selecting the application mode
pub const MODE_ENV_VAR: &str = "USERDESK_ENV";

/// Origin of the local development server
pub const DEVELOPMENT_ORIGIN: &str = "http://localhost:5173";

/// Product tag prefixed to the client identifier header
pub const DEFAULT_CLIENT_TAG: &str = "VT-Portal";

/// Route segment under which credentials are never attached
pub const DEFAULT_BYPASS_SEGMENT: &str = "push-data";

pub const DEFAULT_TOKEN_KEY: &str = "token";
pub const DEFAULT_CLIENT_IDENTIFIER_KEY: &str = "xClientIdentifier";

/// Where the application is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    Development,
    #[default]
    Production,
}

impl AppMode {
    /// Read the mode from `USERDESK_ENV`, honouring a `.env` file
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        std::env::var(MODE_ENV_VAR)
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    /// `development` (any case) selects development, anything else production
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("development") {
            AppMode::Development
        } else {
            AppMode::Production
        }
    }
}

/// Configuration fixed at adapter construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub mode: AppMode,
    /// Same-origin root used in production
    pub origin: String,
    pub client_tag: String,
    pub bypass_segment: String,
    pub token_key: String,
    pub client_identifier_key: String,
    /// Applied to calls that do not set their own timeout
    #[serde(with = "optional_secs")]
    pub timeout: Option<Duration>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            mode: AppMode::default(),
            origin: "http://localhost".to_string(),
            client_tag: DEFAULT_CLIENT_TAG.to_string(),
            bypass_segment: DEFAULT_BYPASS_SEGMENT.to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            client_identifier_key: DEFAULT_CLIENT_IDENTIFIER_KEY.to_string(),
            timeout: None,
        }
    }
}

impl AdapterConfig {
    /// Defaults with the mode taken from the environment
    pub fn from_env() -> Self {
        Self {
            mode: AppMode::from_env(),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: AppMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Base URL every relative request path is resolved against
    pub fn base_url(&self) -> Result<Url> {
        let origin = match self.mode {
            AppMode::Development => DEVELOPMENT_ORIGIN,
            AppMode::Production => self.origin.as_str(),
        };

        let mut base = Url::parse(origin).map_err(|e| Error::Configuration {
            message: format!("Invalid origin '{}': {}", origin, e),
            source: Some(e.into()),
        })?;
        if base.cannot_be_a_base() {
            return Err(Error::configuration(format!("Origin '{}' cannot be a base URL", origin)));
        }
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);
        Ok(base)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.token_key.is_empty() || self.client_identifier_key.is_empty() {
            return Err(Error::configuration("Storage keys cannot be empty"));
        }
        if matches!(self.timeout, Some(timeout) if timeout.is_zero()) {
            return Err(Error::configuration("Timeout cannot be zero"));
        }
        Ok(())
    }
}

mod optional_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<f64>::deserialize(deserializer)?;
        match secs {
            Some(secs) if secs.is_finite() && secs >= 0.0 => Ok(Some(Duration::from_secs_f64(secs))),
            Some(secs) => Err(serde::de::Error::custom(format!("invalid timeout: {}", secs))),
            None => Ok(None),
        }
    }
}

/// Options for a single call
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Only read by [`HttpAdapter::request`](super::HttpAdapter::request)
    pub method: Option<Method>,
    /// Only read by [`HttpAdapter::request`](super::HttpAdapter::request)
    pub url: Option<String>,
    /// Names compare case-insensitively
    pub headers: HeaderMap,
    /// First header that could not be built; the call fails with a type error
    pub invalid_header: Option<String>,
    pub query: Vec<(String, String)>,
    /// Only read by [`HttpAdapter::request`](super::HttpAdapter::request)
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
    /// Caller-owned cancellation, independent of `abort_request`
    pub signal: Option<AbortSignal>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Add a header, replacing any earlier value under the same name in any case
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        let parsed = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| format!("Invalid header name '{}': {}", name, e))
            .and_then(|header| {
                HeaderValue::from_str(value.as_ref())
                    .map(|value| (header, value))
                    .map_err(|e| format!("Invalid value for header '{}': {}", name, e))
            });

        match parsed {
            Ok((header, value)) => {
                self.headers.insert(header, value);
            }
            Err(message) => {
                self.invalid_header.get_or_insert(message);
            }
        }
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}
