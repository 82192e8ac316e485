use conduit_config::CredentialsError;
use thiserror::Error;

use crate::protocol::openai::WireErrorResponse;

/// Failure of a call against an upstream endpoint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    /// Credential rejected by the endpoint (HTTP 401)
    #[error("{0}")]
    Authorization(String),

    /// Endpoint rejected the request as malformed (HTTP 400)
    #[error("{0}")]
    BadRequest(String),

    /// Endpoint is throttling the caller (HTTP 429)
    #[error("{0}")]
    RateLimit(String),

    /// Endpoint failed on its side (HTTP 5xx)
    #[error("{0}")]
    ServerUnavailable(String),

    /// Network-level failure before any status was available
    #[error("{0}")]
    Connection(String),

    /// Anything else, including request construction and parse failures
    #[error("{0}")]
    Invocation(String),
}

impl InvokeError {
    /// Descriptive message carried by the error
    pub fn message(&self) -> &str {
        match self {
            Self::Authorization(m)
            | Self::BadRequest(m)
            | Self::RateLimit(m)
            | Self::ServerUnavailable(m)
            | Self::Connection(m)
            | Self::Invocation(m) => m,
        }
    }

    /// Stable machine-readable name of the failure class
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Authorization(_) => "authorization_error",
            Self::BadRequest(_) => "bad_request_error",
            Self::RateLimit(_) => "rate_limit_error",
            Self::ServerUnavailable(_) => "server_unavailable_error",
            Self::Connection(_) => "connection_error",
            Self::Invocation(_) => "invocation_error",
        }
    }

    /// Whether the failure class is transient
    ///
    /// Advisory only; nothing in this crate retries.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit(_) | Self::ServerUnavailable(_) | Self::Connection(_))
    }
}

/// Map a non-2xx status and its body to an [`InvokeError`]
///
/// The message is the body's `error.message` when present, else `HTTP {status}`.
pub fn classify_status(status: u16, body: &str) -> InvokeError {
    let message = serde_json::from_str::<WireErrorResponse>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .and_then(|detail| detail.message)
        .unwrap_or_else(|| format!("HTTP {status}"));

    match status {
        401 => InvokeError::Authorization(message),
        400 => InvokeError::BadRequest(message),
        429 => InvokeError::RateLimit(message),
        s if s >= 500 => InvokeError::ServerUnavailable(message),
        _ => InvokeError::Invocation(message),
    }
}

impl From<reqwest::Error> for InvokeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            Self::Connection(format!("Connection failed: {e}"))
        } else if e.is_timeout() {
            Self::Connection(format!("Request timeout: {e}"))
        } else {
            Self::Invocation(format!("Request failed: {e}"))
        }
    }
}

/// Any error an adapter can return
#[derive(Debug, Error)]
pub enum LlmError {
    /// Call failed at or after the network boundary
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    /// Credentials rejected before any call was made, or by the self-test
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
}
