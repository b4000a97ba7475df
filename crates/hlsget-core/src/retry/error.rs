//! Segment fetch error type for retry classification.

use thiserror::Error;

/// Error returned by a single fetch attempt (curl failure, HTTP error, or
/// local storage failure). Kept as an enum so callers can classify and decide
/// retries before converting to anyhow.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, TLS, etc.).
    #[error(transparent)]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Creating or writing the destination file failed. Not retried.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
}
