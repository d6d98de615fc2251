//! User-facing reporting of normalized API errors

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::NormalizedError;

/// How long the session-expired notice stays up
pub const SESSION_EXPIRED_DISMISS_AFTER: Duration = Duration::from_secs(2);

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired";

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
    Success,
    Loading,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Success => "success",
            Severity::Loading => "loading",
        };
        f.write_str(name)
    }
}

/// Presentation options for a single toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastOptions {
    /// Dismiss automatically after this long; `None` keeps it up
    #[serde(default, with = "optional_millis")]
    pub auto_close: Option<Duration>,
    pub close_on_click: bool,
    pub close_button: bool,
}

impl Default for ToastOptions {
    fn default() -> Self {
        Self {
            auto_close: Some(Duration::from_secs(5)),
            close_on_click: true,
            close_button: true,
        }
    }
}

impl ToastOptions {
    /// Stays up until dismissed programmatically
    pub fn sticky() -> Self {
        Self {
            auto_close: None,
            close_on_click: false,
            close_button: false,
        }
    }
}

mod optional_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

/// Handle to a displayed toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToastId(pub u64);

/// Somewhere toasts can be shown
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str, options: ToastOptions) -> ToastId;

    fn dismiss(&self, id: ToastId);
}

/// What [`handle_api_error`] did with an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// A toast was shown
    Toast(ToastId),
    /// Only a log line was written
    Logged,
}

/// Report a failed API call to the user
///
/// Expired sessions get a sticky warning that is taken down after
/// [`SESSION_EXPIRED_DISMISS_AFTER`]. Server errors are shown and logged as
/// errors. Cancellations are logged and nothing else. Everything else is
/// shown as information.
pub fn handle_api_error(error: &NormalizedError, notifier: &Arc<dyn Notifier>) -> Handled {
    match error.status {
        401 => {
            let id = notifier.notify(Severity::Warn, SESSION_EXPIRED_MESSAGE, ToastOptions::sticky());
            schedule_dismiss(notifier.clone(), id, SESSION_EXPIRED_DISMISS_AFTER);
            Handled::Toast(id)
        }
        500 | 504 => {
            tracing::error!(status = error.status, message = %error.message, "Server error");
            let id = notifier.notify(Severity::Error, error.message_text(), ToastOptions::default());
            Handled::Toast(id)
        }
        _ if error.is_canceled() => {
            tracing::info!(status = error.status, "Request canceled by the user");
            Handled::Logged
        }
        _ => {
            tracing::info!(status = error.status, message = %error.message, "Request failed");
            let id = notifier.notify(Severity::Info, error.message_text(), ToastOptions::default());
            Handled::Toast(id)
        }
    }
}

fn schedule_dismiss(notifier: Arc<dyn Notifier>, id: ToastId, after: Duration) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                tokio::time::sleep(after).await;
                notifier.dismiss(id);
            });
        }
        Err(_) => {
            tracing::debug!(?id, "No async runtime, toast dismissed immediately");
            notifier.dismiss(id);
        }
    }
}
