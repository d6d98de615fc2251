//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use std::io;
use std::path::PathBuf;
use userdesk_core::NormalizedError;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from userdesk-core library
    #[error("Core error: {0}")]
    Core(#[from] userdesk_core::Error),

    /// A backend call failed
    ///
    /// `reported` is set once the failure has already been shown to the user.
    #[error("Request failed: {error}")]
    Api {
        error: NormalizedError,
        reported: bool,
    },

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {}", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// A failed call that has already been shown to the user
    pub fn reported(error: NormalizedError) -> Self {
        Self::Api {
            error,
            reported: true,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(_) => 2,
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::Api { error, .. } if error.is_canceled() => 130,
            Self::Api { .. } => 10,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Whether the user has already seen this error
    pub fn is_reported(&self) -> bool {
        matches!(self, Self::Api { reported: true, .. })
    }
}

impl From<NormalizedError> for Error {
    fn from(error: NormalizedError) -> Self {
        Self::Api {
            error,
            reported: false,
        }
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use userdesk_core::ErrorKind;

    #[test]
    fn test_exit_codes() {
        let canceled = NormalizedError::new(ErrorKind::RequestWithoutResponse, 0, "", "canceled");
        assert_eq!(Error::reported(canceled).exit_code(), 130);

        let conflict = NormalizedError::new(ErrorKind::Response, 409, "Conflict", "conflict");
        assert_eq!(Error::from(conflict).exit_code(), 10);

        assert_eq!(Error::config("bad").exit_code(), 5);
    }

    #[test]
    fn test_reported_flag() {
        let error = NormalizedError::new(ErrorKind::Response, 500, "Internal Server Error", "boom");
        assert!(Error::reported(error.clone()).is_reported());
        assert!(!Error::from(error).is_reported());
        assert!(!Error::other("x").is_reported());
        assert!(Error::config("bad origin").should_show_help());
        assert!(!Error::other("x").should_show_help());
    }

    #[test]
    fn test_format_error_plain() {
        let error = NormalizedError::new(ErrorKind::Response, 418, "I'm a teapot", "short and stout");
        assert_eq!(
            format_error(&Error::from(error), false),
            "Error: Request failed: [418 I'm a teapot] short and stout"
        );
    }
}
