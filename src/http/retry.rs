//! Error classification and backoff policy for backend requests.

use std::time::Duration;

/// Default number of retry attempts after the initial request.
pub const DEFAULT_RETRIES: usize = 3;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for multipart uploads (voice files take longer).
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Every failure a request can end in.
///
/// `Status` with a 4xx status is a client error: the request will not succeed
/// on retry and is surfaced immediately. Everything else (network failure,
/// timeout, 5xx, malformed body) is transient and subject to the retry policy.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx HTTP response, with the message and optional machine-readable
    /// code parsed from the JSON error body.
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// Connection failure, timeout, or other transport-level error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body was not valid JSON of the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Local session storage failed.
    #[error("session storage error: {0}")]
    Session(String),
}

impl ApiError {
    /// HTTP status of the response, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Machine-readable error code from the response body, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Status { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// True for HTTP 4xx responses, which are never retried.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(s) if (400..500).contains(&s))
    }

    /// True when the backend reported the session token invalid or expired.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401) || self.code() == Some("token_expired")
    }

    /// Message suitable for showing to the user.
    ///
    /// Known error codes map to specific guidance; other HTTP errors surface
    /// the backend's message; everything else gets a generic retry suggestion.
    pub fn user_message(&self) -> String {
        match self.code() {
            Some("token_expired") => "Your session has expired. Please log in again.".to_string(),
            Some("insufficient_credits") => {
                "Insufficient credits. Please upgrade your plan or wait for credit refresh."
                    .to_string()
            }
            Some("rate_limit_exceeded") => {
                "Too many requests. Please wait a moment before trying again.".to_string()
            }
            _ => match self {
                ApiError::Status { message, .. } if message.starts_with("Insufficient credits") => {
                    "Insufficient credits. Please upgrade your plan or wait for credit refresh."
                        .to_string()
                }
                ApiError::Status { message, .. } => message.clone(),
                _ => "An unexpected error occurred. Please try again.".to_string(),
            },
        }
    }
}

/// Delay before re-issuing a failed request: 2^attempt seconds, where attempt
/// is zero-based.
pub fn backoff_delay(attempt: usize) -> Duration {
    Duration::from_secs(2u64.pow(attempt as u32))
}
