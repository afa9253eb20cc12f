//! Error types returned by every request operation.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced while building, sending, or reading an API call.
///
/// A call either returns the full response body or exactly one of these.
/// Nothing is retried internally; callers decide their own policy from
/// [`Error::status`].
#[derive(Error, Debug)]
pub enum Error {
    /// The selected base URL could not be parsed into an absolute URL.
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The base URL parsed but has no path to replace (e.g. `mailto:`).
    #[error("URL '{0}' cannot be used as a base URL")]
    NotABaseUrl(String),

    /// The request or its TLS-configured client could not be constructed.
    #[error("failed to build request: {0}")]
    Request(#[source] reqwest::Error),

    /// Network or TLS failure before a response was received.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// A response arrived with a status outside the 2xx range.
    #[error("HTTP status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The response body could not be read to the end.
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    /// The token source answered with something that is not a token.
    #[error("invalid token response: {0}")]
    Token(#[from] serde_json::Error),

    /// Environment or certificate configuration was unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns the HTTP status carried by a [`Error::Status`] error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if no response was obtained from the server.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Result type for request operations.
pub type Result<T> = std::result::Result<T, Error>;
