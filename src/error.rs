//! Error types for botdesk
//!
//! This module defines all error types used throughout the console,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for botdesk operations
///
/// Covers the failure taxonomy of the console: missing session, missing
/// chatbot assignment, backend failures (already normalized to a message),
/// local form validation, plus the plumbing errors of configuration and I/O.
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No active session is available
    #[error("No active session")]
    NoSession,

    /// The signed-in identity has no `chatbotId` metadata
    #[error("No chatbot assigned to this user")]
    NoChatbotAssigned,

    /// Backend call failed; the payload is the normalized message
    ///
    /// Displayed verbatim so callers never see transport detail.
    #[error("{0}")]
    Api(String),

    /// A required form field is missing or malformed
    #[error("{0}")]
    Validation(String),

    /// Session provider errors (login, user lookup, sign-out)
    #[error("Session error: {0}")]
    Session(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client errors outside the normalized API path
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Interactive prompt errors
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

/// Result type alias for botdesk operations
///
/// Uses `anyhow::Error` so context can be attached while the typed
/// [`ConsoleError`] remains reachable through `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;

/// Extract the user-facing message from an error
///
/// Normalized API and validation errors yield their bare message; anything
/// else falls back to its display form.
///
/// # Examples
///
/// ```
/// use botdesk::error::{user_message, ConsoleError};
///
/// let err: anyhow::Error = ConsoleError::Api("db down".to_string()).into();
/// assert_eq!(user_message(&err), "db down");
/// ```
pub fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ConsoleError>() {
        Some(console_err) => console_err.to_string(),
        None => err.to_string(),
    }
}
