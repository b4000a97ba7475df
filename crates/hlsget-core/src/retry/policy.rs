use std::time::Duration;

/// High-level classification of a fetch error for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read/low-speed abort).
    Timeout,
    /// Network-level failure (connection reset, DNS, TLS, truncated body).
    Transport,
    /// HTTP response carried a non-success status.
    Http(u16),
    /// Local disk failure; retrying the request cannot help.
    Storage,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Linear backoff policy: the delay after the `a`-th failed attempt is
/// `a × base_delay` (so retries wait 1, 2, 3… units). Total attempts are
/// bounded by `max_retries + 1`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first one fails.
    pub max_retries: u32,
    /// Backoff unit.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Compute the decision after attempt `attempt` (1-based) failed with
    /// `kind`. Returns `NoRetry` once `max_retries` retries have been spent
    /// or when the error is not transient.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if kind == ErrorKind::Storage {
            return RetryDecision::NoRetry;
        }
        if attempt > self.max_retries {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.base_delay.saturating_mul(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_retry_for_storage() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(1, ErrorKind::Storage), RetryDecision::NoRetry);
    }

    #[test]
    fn http_status_is_retried_even_for_4xx() {
        let p = RetryPolicy::default();
        assert!(matches!(
            p.decide(1, ErrorKind::Http(404)),
            RetryDecision::RetryAfter(_)
        ));
        assert!(matches!(
            p.decide(1, ErrorKind::Http(500)),
            RetryDecision::RetryAfter(_)
        ));
    }

    #[test]
    fn backoff_is_linear() {
        let p = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
        };
        assert_eq!(
            p.decide(1, ErrorKind::Timeout),
            RetryDecision::RetryAfter(Duration::from_secs(1))
        );
        assert_eq!(
            p.decide(2, ErrorKind::Transport),
            RetryDecision::RetryAfter(Duration::from_secs(2))
        );
        assert_eq!(
            p.decide(3, ErrorKind::Http(503)),
            RetryDecision::RetryAfter(Duration::from_secs(3))
        );
    }

    #[test]
    fn respects_max_retries() {
        let p = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(10),
        };
        assert!(matches!(
            p.decide(1, ErrorKind::Transport),
            RetryDecision::RetryAfter(_)
        ));
        assert!(matches!(
            p.decide(2, ErrorKind::Transport),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(p.decide(3, ErrorKind::Transport), RetryDecision::NoRetry);
    }
}
