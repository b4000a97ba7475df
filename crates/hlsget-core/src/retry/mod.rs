//! Retry and backoff policy.
//!
//! Encapsulates error classification (timeouts, connection failures, HTTP
//! statuses) and the linear backoff decision so every fetch site shares a
//! consistent policy. A failed attempt is retried for any transport error or
//! non-success status; only local storage failures are terminal immediately.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
