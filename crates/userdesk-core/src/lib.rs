//! Userdesk Core - HTTP adapter and error normalization for the Userdesk client
//!
//! Every network call the application makes goes through one
//! [`HttpAdapter`]. Calls resolve to a [`NormalizedResponse`] or reject with
//! a [`NormalizedError`], whatever went wrong underneath.
//!
//! # Main Components
//!
//! - **HTTP Adapter**: verbs, credential injection, cancellation
//! - **Error Normalizer**: one error shape with fixed sentinel statuses
//! - **Header Extractor**: typed response headers
//! - **Storage**: JSON-encoded key-value helpers over pluggable stores
//! - **Services**: the users API and its state slice
//!
//! # Example
//!
//! ```no_run
//! use userdesk_core::{HttpAdapter, RequestConfig};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = HttpAdapter::global()?;
//!     let users = http.get::<serde_json::Value>("/api/users", RequestConfig::new()).await?;
//!     println!("{} {}", users.status, users.body);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod http;
pub mod notify;
pub mod ports;
pub mod services;
pub mod storage;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use http::{
    AbortController, AbortSignal, AdapterConfig, AppMode, ErrorKind, ErrorMessage, HeaderField,
    HttpAdapter, NormalizedError, NormalizedResponse, RequestConfig, ResponseHeaders,
};
pub use notify::{handle_api_error, Handled, Notifier, Severity, ToastId, ToastOptions};
pub use ports::{FileStore, KeyValueStore, Location, MemoryLocation, MemoryStore};
pub use services::{CreateUserParams, User, UserState, UsersService};
pub use storage::{get_storage_item, remove_storage_item, remove_storage_items, set_storage_item};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
