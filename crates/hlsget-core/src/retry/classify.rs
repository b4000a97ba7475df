//! Classify HTTP status and curl errors into retry policy error kinds.

use super::error::FetchError;
use super::policy::ErrorKind;

/// Classify an HTTP status code. Every non-success status is a retryable
/// failure; the kind only distinguishes statuses for logging.
pub fn classify_http_status(code: u32) -> ErrorKind {
    ErrorKind::Http(code.min(u16::MAX as u32) as u16)
}

/// Classify a curl error: timeouts are separated out, everything else is a
/// transport-level failure (and still retryable).
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    ErrorKind::Transport
}

/// Classify a fetch error into an `ErrorKind`.
pub fn classify(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::Curl(ce) => classify_curl_error(ce),
        FetchError::Http(code) => classify_http_status(*code),
        FetchError::Storage(_) => ErrorKind::Storage,
    }
}
