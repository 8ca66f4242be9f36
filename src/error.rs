use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified failure kinds for API calls.
///
/// The transport assigns a kind once, at the response boundary; the cache
/// layer passes errors through unchanged and never caches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Transport-level failure: DNS, connect, TLS, broken connection.
    Network,
    /// The request exceeded the configured deadline.
    Timeout,
    /// HTTP 401: missing or invalid credentials.
    Auth,
    /// HTTP 403: authenticated but not allowed.
    Permission,
    /// HTTP 404.
    NotFound,
    /// HTTP 400/422, or a response body that does not match the wire contract.
    Validation,
    /// HTTP 5xx.
    Server,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// Map an HTTP status code to a kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorKind::Auth,
            403 => ErrorKind::Permission,
            404 => ErrorKind::NotFound,
            400 | 422 => ErrorKind::Validation,
            408 => ErrorKind::Timeout,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Auth => "AUTH",
            ErrorKind::Permission => "PERMISSION",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Server => "SERVER",
            ErrorKind::Unknown => "UNKNOWN",
        }
    }
}

/// Error value returned by every fallible API operation.
///
/// Deliberately `Clone`: when concurrent callers share one in-flight fetch,
/// each waiter receives the same failure. Source errors that are not `Clone`
/// (e.g. `reqwest::Error`) are flattened to a message at the transport
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} error: {message}", .kind.as_str())]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    /// HTTP status, when the failure came from a response.
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Classify a failed HTTP response.
    pub fn from_response(status: u16, body_excerpt: impl Into<String>) -> Self {
        Self::new(ErrorKind::from_status(status), body_excerpt).with_status(status)
    }

    /// Auth and permission failures are terminal for the current session;
    /// callers should not retry them.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::Auth | ErrorKind::Permission)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            ApiError::network(err.to_string())
        } else if err.is_decode() {
            ApiError::validation(format!("response body did not match contract: {err}"))
        } else if let Some(status) = err.status() {
            ApiError::from_response(status.as_u16(), err.to_string())
        } else {
            ApiError::unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::validation(format!("malformed response body: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Auth);
        assert_eq!(ErrorKind::from_status(403), ErrorKind::Permission);
        assert_eq!(ErrorKind::from_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_status(400), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_status(422), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_status(500), ErrorKind::Server);
        assert_eq!(ErrorKind::from_status(503), ErrorKind::Server);
        assert_eq!(ErrorKind::from_status(418), ErrorKind::Unknown);
    }

    #[test]
    fn display_carries_kind_and_message() {
        let err = ApiError::from_response(401, "token expired");
        assert_eq!(err.to_string(), "AUTH error: token expired");
        assert_eq!(err.status, Some(401));
        assert!(err.is_auth_failure());
    }

    #[test]
    fn clone_preserves_classification() {
        let err = ApiError::from_response(503, "upstream unavailable");
        let cloned = err.clone();
        assert_eq!(cloned, err);
        assert_eq!(cloned.kind, ErrorKind::Server);
    }

    #[test]
    fn serde_json_errors_become_validation() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ApiError = parse_err.into();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
