//! HTTP adapter for backend API communication
//!
//! This module provides:
//! - A single adapter instance mediating every call (verbs plus a raw `request`)
//! - Credential injection from the key-value store
//! - Per-call cancellation and `abort_request` for the latest call
//! - Error classification into one normalized shape
//! - Typed response header extraction

pub mod abort;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod normalizer;
pub mod pipeline;

pub use abort::{AbortController, AbortSignal};
pub use client::{HttpAdapter, HttpAdapterBuilder, NormalizedResponse};
pub use config::{AdapterConfig, AppMode, RequestConfig};
pub use error::{
    ErrorKind, ErrorMessage, Failure, NormalizedError, TransportError, TypeError,
    CANCELED_MESSAGE, STATUS_REQUEST_SETUP_ERROR, STATUS_TYPE_ERROR, STATUS_UNCLASSIFIED_ERROR,
};
pub use headers::{extract_headers, parse_count, HeaderField, ResponseHeaders, TOTAL_COUNT_HEADER};
pub use normalizer::{classify, error_message_of, ErrorNormalizer};
pub use pipeline::{CredentialStage, FailureStage, OutgoingRequest, RedirectOnNotFound, RequestStage};

// Re-export commonly used types
pub use reqwest::{Method, StatusCode};
