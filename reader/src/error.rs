//! Failure kinds of the two page operations.

use thiserror::Error;

/// Checks done locally before any request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no file selected")]
    NoFileSelected,
    #[error("question is empty")]
    EmptyQuestion,
    #[error("a question is already waiting for its answer")]
    RequestInFlight,
}

/// A request to the reader server that did not produce the expected body.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Non-2xx response; `message` is the payload's `error` field.
    #[error("server rejected request ({status}): {}", .message.as_deref().unwrap_or("no error message"))]
    Rejected { status: u16, message: Option<String> },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Parse(#[from] serde_json::Error),
}

impl RequestError {
    /// Text shown to the user for this failure.
    ///
    /// A rejection shows the server's message verbatim; transport and parse
    /// failures show their own message. `fallback` covers a missing or empty
    /// message in either case.
    pub fn user_message(&self, fallback: &str) -> String {
        let message = match self {
            RequestError::Rejected { message, .. } => message.clone().unwrap_or_default(),
            other => other.to_string(),
        };

        if message.is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}
