//! Error types for vyscrape.

use std::io;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Upper bound on how much unparsed output is carried inside an error.
pub const EXCERPT_LIMIT: usize = 512;

/// Main error type for vyscrape operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Interactive channel errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Errors locating or parsing the JSON payload
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    /// A required input (host, uploaded file) was not supplied
    #[error("Missing input: {what}")]
    MissingInput { what: &'static str },

    /// Invalid configuration in the scraper builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Transport layer errors (resolution, connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Host name could not be resolved to an address
    #[error("Failed to resolve '{host}': {source}")]
    Resolution {
        host: String,
        #[source]
        source: io::Error,
    },

    /// TCP connect or SSH handshake failed
    #[error("Connection failed to {host}:{port}: {reason}")]
    ConnectionFailed {
        host: String,
        port: u16,
        reason: String,
    },

    /// Connect did not complete within the connect timeout
    #[error("Connection to {host}:{port} timed out after {timeout:?}")]
    ConnectTimeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    /// Credentials were rejected
    #[error("Authentication failed for user '{user}' on {host}")]
    AuthenticationFailed { user: String, host: String },

    /// SSH protocol error after the connection was established
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),
}

/// Channel layer errors (shell, send, read).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Failed to set up the PTY or shell on the session
    #[error("Failed to invoke shell: {0}")]
    ShellRequestFailed(russh::Error),

    /// Sending input to the shell failed
    #[error("Failed to send {input:?}: {source}")]
    SendFailed {
        input: String,
        #[source]
        source: russh::Error,
    },

    /// Channel closed before any input could be sent
    #[error("Channel closed")]
    Closed,
}

/// Errors turning collected terminal output into a JSON document.
#[derive(Error, Debug)]
pub enum PayloadError {
    /// No `{ ... }` candidate in the collected output
    #[error("No JSON payload found in output: {excerpt:?}")]
    NotFound { excerpt: String },

    /// A candidate was found but it is not valid JSON
    #[error("Malformed JSON payload ({source}): {excerpt:?}")]
    Malformed {
        excerpt: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PayloadError {
    /// The bounded excerpt of unparsed text carried by this error.
    pub fn excerpt(&self) -> &str {
        match self {
            Self::NotFound { excerpt } | Self::Malformed { excerpt, .. } => excerpt,
        }
    }
}

/// Coarse error classification reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Resolution,
    Connect,
    Authentication,
    Session,
    NoPayloadFound,
    MalformedPayload,
    MissingInput,
    InvalidConfig,
}

impl ErrorKind {
    /// HTTP-style status distinguishing this kind for the serving layer.
    pub fn status_code(self) -> u16 {
        match self {
            Self::Resolution | Self::MissingInput | Self::InvalidConfig => 400,
            Self::Authentication => 401,
            Self::Connect | Self::Session | Self::NoPayloadFound | Self::MalformedPayload => 500,
        }
    }
}

/// Serializable error summary for the caller-facing surface.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub status: u16,
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(TransportError::Resolution { .. }) => ErrorKind::Resolution,
            Self::Transport(
                TransportError::ConnectionFailed { .. } | TransportError::ConnectTimeout { .. },
            ) => ErrorKind::Connect,
            Self::Transport(TransportError::AuthenticationFailed { .. }) => {
                ErrorKind::Authentication
            }
            Self::Transport(TransportError::Ssh(_)) | Self::Channel(_) => ErrorKind::Session,
            Self::Payload(PayloadError::NotFound { .. }) => ErrorKind::NoPayloadFound,
            Self::Payload(PayloadError::Malformed { .. }) => ErrorKind::MalformedPayload,
            Self::MissingInput { .. } => ErrorKind::MissingInput,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
        }
    }

    /// Build the structured report for this error.
    pub fn report(&self) -> ErrorReport {
        let kind = self.kind();
        ErrorReport {
            status: kind.status_code(),
            kind,
            message: self.to_string(),
        }
    }
}

/// Cut `text` down to at most [`EXCERPT_LIMIT`] bytes without splitting a char.
pub(crate) fn excerpt(text: &str) -> String {
    if text.len() <= EXCERPT_LIMIT {
        return text.to_string();
    }
    let mut end = EXCERPT_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Result type alias using vyscrape's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_short_text_unchanged() {
        assert_eq!(excerpt("{not json}"), "{not json}");
    }

    #[test]
    fn test_excerpt_respects_char_boundary() {
        let text = "é".repeat(EXCERPT_LIMIT);
        let cut = excerpt(&text);
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= EXCERPT_LIMIT + 3);
    }

    #[test]
    fn test_kind_and_status() {
        let err: Error = TransportError::AuthenticationFailed {
            user: "vyos".into(),
            host: "fw1".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.report().status, 401);

        let err = Error::MissingInput { what: "host" };
        assert_eq!(err.kind(), ErrorKind::MissingInput);
        assert_eq!(err.kind().status_code(), 400);

        let err: Error = PayloadError::NotFound {
            excerpt: String::new(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NoPayloadFound);
        assert_eq!(err.report().status, 500);
    }

    #[test]
    fn test_report_serializes_kind_kebab_case() {
        let err: Error = TransportError::Resolution {
            host: "nope.invalid".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses"),
        }
        .into();
        let json = serde_json::to_value(err.report()).unwrap();
        assert_eq!(json["kind"], "resolution");
        assert_eq!(json["status"], 400);
        assert!(json["message"].as_str().unwrap().contains("nope.invalid"));
    }
}
