//! Shared curl request options and in-memory text fetches.
//!
//! Uses the curl crate (libcurl). Segment bodies stream to disk in
//! `fetch::segment`; playlists and pages are small, so [`fetch_text`]
//! collects them in memory.

use std::time::Duration;

use crate::config::ToolConfig;
use crate::retry::FetchError;

/// Per-request options applied to every curl handle.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub user_agent: String,
    pub referer: Option<String>,
    pub connect_timeout: Duration,
    /// Abort if throughput drops below `low_speed_limit` bytes/sec...
    pub low_speed_limit: u32,
    /// ...for this long.
    pub low_speed_time: Duration,
    /// Hard per-request timeout; safety net for completely stuck transfers.
    pub request_timeout: Duration,
}

impl HttpOptions {
    pub fn from_tool(cfg: &ToolConfig) -> Self {
        Self {
            user_agent: cfg.user_agent.clone(),
            referer: None,
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            low_speed_limit: cfg.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(cfg.low_speed_time_secs),
            request_timeout: Duration::from_secs(cfg.request_timeout_secs),
        }
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Apply these options to a handle: redirects, timeouts, headers.
    pub fn apply(&self, easy: &mut curl::easy::Easy) -> Result<(), curl::Error> {
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.low_speed_limit(self.low_speed_limit)?;
        easy.low_speed_time(self.low_speed_time)?;
        easy.timeout(self.request_timeout)?;
        easy.useragent(&self.user_agent)?;
        if let Some(referer) = &self.referer {
            easy.referer(referer)?;
        }
        Ok(())
    }
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self::from_tool(&ToolConfig::default())
    }
}

/// Performs a GET and returns the body as text.
///
/// Follows redirects; a non-2xx status is an error. Runs in the calling
/// thread.
pub fn fetch_text(opts: &HttpOptions, url: &str) -> Result<String, FetchError> {
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    opts.apply(&mut easy)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Http(code));
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_derive_from_tool_config() {
        let mut cfg = ToolConfig::default();
        cfg.connect_timeout_secs = 7;
        cfg.user_agent = "agent-under-test".to_string();
        let opts = HttpOptions::from_tool(&cfg);
        assert_eq!(opts.connect_timeout, Duration::from_secs(7));
        assert_eq!(opts.user_agent, "agent-under-test");
        assert!(opts.referer.is_none());
    }

    #[test]
    fn with_referer_sets_header_value() {
        let opts = HttpOptions::default().with_referer("https://example.com/");
        assert_eq!(opts.referer.as_deref(), Some("https://example.com/"));
    }
}
