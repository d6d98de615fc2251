//! The HTTP adapter every network call goes through
//!
//! One adapter owns one transport, the request/failure pipeline and the
//! "current" abort controller. Every call resolves to a
//! [`NormalizedResponse`] or rejects with a [`NormalizedError`].
//!
//! # Cancellation
//!
//! Each call installs a fresh [`AbortController`] as the adapter's current
//! controller. [`HttpAdapter::abort_request`] aborts whichever controller is
//! current, so only the most recently *started* call can be canceled that
//! way. A call that needs to be canceled independently carries its own
//! signal in [`RequestConfig::signal`].

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::abort::{either_aborted, AbortController, AbortSignal};
use super::config::{AdapterConfig, RequestConfig};
use super::error::{Failure, NormalizedError, TransportError, TypeError};
use super::headers::{extract_headers, ResponseHeaders};
use super::normalizer::ErrorNormalizer;
use super::pipeline::{
    CredentialStage, FailureStage, OutgoingRequest, RedirectOnNotFound, RequestStage,
};
use crate::ports::{KeyValueStore, Location, MemoryLocation, MemoryStore};
use crate::{Error, Result};

static GLOBAL: OnceLock<Arc<HttpAdapter>> = OnceLock::new();

/// Result of every successful call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResponse<T> {
    /// The url argument exactly as the caller passed it
    pub url: String,
    pub status: u16,
    /// Canonical reason phrase for `status`, empty for unregistered codes.
    /// A custom phrase sent by the server is not preserved.
    pub status_text: String,
    pub header: ResponseHeaders,
    pub body: T,
}

/// What came back from the wire before it is shaped for the caller
struct RawExchange {
    status: u16,
    status_text: String,
    headers: HeaderMap,
    body: Value,
}

/// Mediates all outbound HTTP traffic
pub struct HttpAdapter {
    client: ReqwestClient,
    base_url: Url,
    config: AdapterConfig,
    request_stages: Vec<Arc<dyn RequestStage>>,
    failure_stages: Vec<Arc<dyn FailureStage>>,
    normalizer: ErrorNormalizer,
    current: Mutex<AbortController>,
}

impl HttpAdapter {
    pub fn builder() -> HttpAdapterBuilder {
        HttpAdapterBuilder::default()
    }

    /// The process-wide adapter, created from the environment on first
    /// access unless one was installed with [`HttpAdapter::install_global`]
    pub fn global() -> Result<Arc<HttpAdapter>> {
        if let Some(adapter) = GLOBAL.get() {
            return Ok(adapter.clone());
        }

        tracing::debug!("Initializing default HTTP adapter");
        let adapter = Arc::new(HttpAdapter::builder().build()?);
        // A concurrent initializer may have won; keep whichever landed first
        Ok(GLOBAL.get_or_init(|| adapter).clone())
    }

    /// Install the process-wide adapter
    ///
    /// Fails, handing the adapter back, once a global adapter exists.
    pub fn install_global(adapter: Arc<HttpAdapter>) -> std::result::Result<(), Arc<HttpAdapter>> {
        GLOBAL.set(adapter)
    }

    fn assemble(
        client: ReqwestClient,
        base_url: Url,
        config: AdapterConfig,
        store: Arc<dyn KeyValueStore>,
        location: Arc<dyn Location>,
        extra_request_stages: Vec<Arc<dyn RequestStage>>,
        extra_failure_stages: Vec<Arc<dyn FailureStage>>,
    ) -> Self {
        let credentials = CredentialStage::new(
            store.clone(),
            location.clone(),
            config.client_tag.clone(),
            config.bypass_segment.clone(),
        )
        .with_keys(config.token_key.clone(), config.client_identifier_key.clone());

        let mut request_stages: Vec<Arc<dyn RequestStage>> = vec![Arc::new(credentials)];
        request_stages.extend(extra_request_stages);

        let mut failure_stages: Vec<Arc<dyn FailureStage>> =
            vec![Arc::new(RedirectOnNotFound::new(location))];
        failure_stages.extend(extra_failure_stages);

        let normalizer = ErrorNormalizer::new(store, config.token_key.clone());

        Self {
            client,
            base_url,
            config,
            request_stages,
            failure_stages,
            normalizer,
            // Pre-allocated so that aborting before any call is a no-op
            current: Mutex::new(AbortController::new()),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Abort the most recently started call
    pub fn abort_request(&self) {
        tracing::debug!("Aborting current request");
        self.current_controller().abort();
    }

    fn current_controller(&self) -> MutexGuard<'_, AbortController> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn install_controller(&self) -> AbortSignal {
        let controller = AbortController::new();
        let signal = controller.signal();
        *self.current_controller() = controller;
        signal
    }

    /// Send a request described entirely by `config`
    ///
    /// A missing url targets the base URL and is reported as `""`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        config: RequestConfig,
    ) -> std::result::Result<NormalizedResponse<T>, NormalizedError> {
        let method = config.method.clone().unwrap_or(Method::GET);
        let url = config.url.clone().unwrap_or_default();
        let body = config.body.clone();
        self.dispatch(method, url, Ok(body), config).await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        config: RequestConfig,
    ) -> std::result::Result<NormalizedResponse<T>, NormalizedError> {
        self.dispatch(Method::GET, url.to_string(), Ok(None), config).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        config: RequestConfig,
    ) -> std::result::Result<NormalizedResponse<T>, NormalizedError> {
        self.dispatch(Method::POST, url.to_string(), encode_body(body), config).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        config: RequestConfig,
    ) -> std::result::Result<NormalizedResponse<T>, NormalizedError> {
        self.dispatch(Method::PUT, url.to_string(), encode_body(body), config).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        config: RequestConfig,
    ) -> std::result::Result<NormalizedResponse<T>, NormalizedError> {
        self.dispatch(Method::PATCH, url.to_string(), encode_body(body), config).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        config: RequestConfig,
    ) -> std::result::Result<NormalizedResponse<T>, NormalizedError> {
        self.dispatch(Method::DELETE, url.to_string(), Ok(None), config).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        body: std::result::Result<Option<Value>, Failure>,
        config: RequestConfig,
    ) -> std::result::Result<NormalizedResponse<T>, NormalizedError> {
        // Captured before the first suspension point
        let signal = self.install_controller();

        let outcome = match body {
            Ok(body) => self.execute::<T>(&method, &url, body, &config, &signal).await,
            Err(failure) => Err(failure),
        };

        match outcome {
            Ok(response) => {
                tracing::info!(%method, url = %url, status = response.status, "Request succeeded");
                Ok(response)
            }
            Err(failure) => Err(self.reject(&method, &url, failure)),
        }
    }

    fn reject(&self, method: &Method, url: &str, failure: Failure) -> NormalizedError {
        let error = self.normalizer.normalize(failure);

        if error.is_canceled() {
            tracing::info!(%method, url, "Request canceled");
        } else {
            tracing::warn!(
                %method,
                url,
                status = error.status,
                status_text = %error.status_text,
                message = %error.message,
                "Request failed"
            );
        }

        for stage in &self.failure_stages {
            stage.on_failure(&error);
        }
        error
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &Method,
        url: &str,
        body: Option<Value>,
        config: &RequestConfig,
        signal: &AbortSignal,
    ) -> std::result::Result<NormalizedResponse<T>, Failure> {
        if signal.is_aborted() || config.signal.as_ref().is_some_and(AbortSignal::is_aborted) {
            return Err(TransportError::canceled_before_dispatch().into());
        }

        let target = self
            .base_url
            .join(url)
            .map_err(|e| TypeError::new(format!("Invalid URL '{}': {}", url, e)))?;

        if let Some(message) = &config.invalid_header {
            return Err(TypeError::new(message.clone()).into());
        }

        let mut outgoing = OutgoingRequest::new(method.clone(), target);
        for (name, value) in &config.headers {
            outgoing.headers.insert(name.clone(), value.clone());
        }
        outgoing.query = config.query.clone();
        outgoing.body = body;

        for stage in &self.request_stages {
            outgoing = stage.apply(outgoing)?;
        }

        let timeout = config.timeout.or(self.config.timeout);
        let request = self.build_request(outgoing, timeout)?;

        tracing::debug!(%method, url = %request.url(), "Dispatching request");

        let exchange = self.exchange(request, timeout);
        let raw = tokio::select! {
            biased;
            _ = either_aborted(signal, config.signal.as_ref()) => {
                return Err(TransportError::canceled_in_flight().into());
            }
            result = exchange => result?,
        };

        if !(200..300).contains(&raw.status) {
            return Err(TransportError::with_response(raw.status, raw.status_text, raw.body).into());
        }

        let body = serde_json::from_value::<T>(raw.body).map_err(|e| {
            TypeError::new(format!("Response body does not match the expected shape: {}", e))
        })?;

        Ok(NormalizedResponse {
            url: url.to_string(),
            status: raw.status,
            status_text: raw.status_text,
            header: extract_headers(&raw.headers),
            body,
        })
    }

    fn build_request(
        &self,
        outgoing: OutgoingRequest,
        timeout: Option<Duration>,
    ) -> std::result::Result<reqwest::Request, Failure> {
        let mut builder = self
            .client
            .request(outgoing.method, outgoing.url)
            .headers(outgoing.headers);

        if !outgoing.query.is_empty() {
            builder = builder.query(&outgoing.query);
        }
        if let Some(body) = &outgoing.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| TypeError::new(format!("Request body is not serializable: {}", e)))?;
            builder = builder.body(bytes);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| Failure::Transport(TransportError::from_reqwest(&e)))
    }

    async fn exchange(
        &self,
        request: reqwest::Request,
        timeout: Option<Duration>,
    ) -> std::result::Result<RawExchange, Failure> {
        let to_failure = |e: reqwest::Error| -> Failure {
            match timeout {
                Some(timeout) if e.is_timeout() => TransportError::without_response(format!(
                    "timeout of {}ms exceeded",
                    timeout.as_millis()
                ))
                .into(),
                _ => TransportError::from_reqwest(&e).into(),
            }
        };

        let response = self.client.execute(request).await.map_err(to_failure)?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(to_failure)?;

        Ok(RawExchange {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: decode_body(&bytes),
        })
    }
}

impl fmt::Debug for HttpAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpAdapter")
            .field("base_url", &self.base_url.as_str())
            .field("config", &self.config)
            .field("request_stages", &self.request_stages.len())
            .field("failure_stages", &self.failure_stages.len())
            .finish_non_exhaustive()
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> std::result::Result<Option<Value>, Failure> {
    serde_json::to_value(body)
        .map(Some)
        .map_err(|e| TypeError::new(format!("Request body is not serializable: {}", e)).into())
}

/// JSON when the payload parses, a JSON string otherwise, null when empty
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Builder for [`HttpAdapter`]
#[derive(Default)]
pub struct HttpAdapterBuilder {
    config: Option<AdapterConfig>,
    store: Option<Arc<dyn KeyValueStore>>,
    location: Option<Arc<dyn Location>>,
    client: Option<ReqwestClient>,
    request_stages: Vec<Arc<dyn RequestStage>>,
    failure_stages: Vec<Arc<dyn FailureStage>>,
}

impl HttpAdapterBuilder {
    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn location(mut self, location: Arc<dyn Location>) -> Self {
        self.location = Some(location);
        self
    }

    /// Use a prebuilt transport
    pub fn client(mut self, client: ReqwestClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Run after the credential stage
    pub fn request_stage(mut self, stage: Arc<dyn RequestStage>) -> Self {
        self.request_stages.push(stage);
        self
    }

    /// Run after the not-found redirect
    pub fn failure_stage(mut self, stage: Arc<dyn FailureStage>) -> Self {
        self.failure_stages.push(stage);
        self
    }

    pub fn build(self) -> Result<HttpAdapter> {
        let config = self.config.unwrap_or_else(AdapterConfig::from_env);
        config.validate()?;
        let base_url = config.base_url()?;

        let client = match self.client {
            Some(client) => client,
            None => ReqwestClient::builder().build().map_err(|e| Error::HttpClient {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
            })?,
        };

        let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let location = self.location.unwrap_or_else(|| Arc::new(MemoryLocation::default()));

        tracing::debug!(base_url = %base_url, mode = ?config.mode, "HTTP adapter configured");

        Ok(HttpAdapter::assemble(
            client,
            base_url,
            config,
            store,
            location,
            self.request_stages,
            self.failure_stages,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::config::AppMode;
    use crate::http::error::{ErrorKind, STATUS_REQUEST_SETUP_ERROR, STATUS_TYPE_ERROR};

    fn adapter() -> HttpAdapter {
        HttpAdapter::builder()
            .config(AdapterConfig::default().with_mode(AppMode::Production).with_origin("http://127.0.0.1:9"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_rejects_invalid_origin() {
        let result = HttpAdapter::builder()
            .config(AdapterConfig::default().with_origin("nope"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_base_url_fixed_at_construction() {
        let adapter = HttpAdapter::builder()
            .config(AdapterConfig::default().with_mode(AppMode::Development))
            .build()
            .unwrap();
        assert_eq!(adapter.base_url().as_str(), "http://localhost:5173/");
    }

    #[test]
    fn test_abort_before_any_call_is_noop() {
        adapter().abort_request();
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(br#"{"a":1}"#), serde_json::json!({"a": 1}));
        assert_eq!(decode_body(b"plain"), Value::String("plain".to_string()));
    }

    #[tokio::test]
    async fn test_unserializable_body_is_type_error() {
        use std::collections::HashMap;

        // Maps with non-string keys cannot become JSON objects
        let mut body = HashMap::new();
        body.insert((1, 2), "x");

        let err = adapter()
            .post::<Value, _>("/api/users", &body, RequestConfig::new())
            .await
            .unwrap_err();
        assert_eq!(err.status, STATUS_TYPE_ERROR);
        assert_eq!(err.kind(), ErrorKind::LocalType);
    }

    #[tokio::test]
    async fn test_invalid_header_is_type_error() {
        let err = adapter()
            .get::<Value>("/api/users", RequestConfig::new().header("bad header", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.status, STATUS_TYPE_ERROR);
        assert_eq!(err.status_text, "TypeError");
    }

    #[tokio::test]
    async fn test_pre_aborted_signal_cancels_before_dispatch() {
        let controller = AbortController::new();
        controller.abort();

        let err = adapter()
            .get::<Value>("/api/users", RequestConfig::new().signal(controller.signal()))
            .await
            .unwrap_err();
        assert_eq!(err.status, STATUS_REQUEST_SETUP_ERROR);
        assert!(err.is_canceled());
    }
}
