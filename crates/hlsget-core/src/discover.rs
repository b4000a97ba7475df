//! Locate an m3u8 playlist URL starting from a playback page.
//!
//! Scans the fetched page text (including inline scripts) for an absolute
//! `.m3u8` URL, then follows `<iframe>` embeds. The walk carries an explicit
//! visited-URL set and a depth bound so redirect loops between pages can
//! never recurse forever.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::http::{fetch_text, HttpOptions};
use crate::retry::FetchError;

static M3U8_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(https?://[^\s'"<>()]+\.m3u8[^\s'"<>()]*)"#).unwrap());

static IFRAME_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<iframe[^>]*?\ssrc\s*=\s*["']([^"']+)["']"#).unwrap());

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("failed to fetch page {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("invalid page URL {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("no m3u8 link found on {url}")]
    NotFound { url: String },
}

/// Finds an m3u8 playlist URL reachable from `page_url`, following at most
/// `max_depth` iframe hops.
pub fn discover_playlist_url(
    opts: &HttpOptions,
    page_url: &str,
    max_depth: u32,
) -> Result<String, DiscoverError> {
    let mut visited: HashSet<String> = HashSet::new();
    let found = scan_page(opts, page_url, max_depth, &mut visited)?;
    found.ok_or_else(|| DiscoverError::NotFound {
        url: page_url.to_string(),
    })
}

/// One page of the walk. Returns Ok(None) when this branch has no playlist
/// link; iframe fetch failures only end their own branch.
fn scan_page(
    opts: &HttpOptions,
    page_url: &str,
    depth_left: u32,
    visited: &mut HashSet<String>,
) -> Result<Option<String>, DiscoverError> {
    if !visited.insert(page_url.to_string()) {
        tracing::debug!(url = page_url, "already visited, skipping");
        return Ok(None);
    }

    tracing::info!(url = page_url, "analyzing playback page");
    let page_opts = opts.clone().with_referer(page_url);
    let text = fetch_text(&page_opts, page_url).map_err(|source| DiscoverError::Fetch {
        url: page_url.to_string(),
        source,
    })?;

    if let Some(m) = M3U8_URL_RE.find(&text) {
        tracing::info!(url = m.as_str(), "found m3u8 link");
        return Ok(Some(m.as_str().to_string()));
    }

    if depth_left == 0 {
        tracing::debug!(url = page_url, "iframe depth bound reached");
        return Ok(None);
    }

    let base = Url::parse(page_url).map_err(|source| DiscoverError::Url {
        url: page_url.to_string(),
        source,
    })?;
    for cap in IFRAME_SRC_RE.captures_iter(&text) {
        let src = &cap[1];
        let iframe_url = match base.join(src) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!(src, error = %e, "skipping unparseable iframe src");
                continue;
            }
        };
        tracing::info!(url = %iframe_url, "following iframe");
        match scan_page(opts, iframe_url.as_str(), depth_left - 1, visited) {
            Ok(Some(found)) => return Ok(Some(found)),
            Ok(None) => {}
            Err(e) => {
                // A dead embed should not kill the sibling branches.
                tracing::warn!(url = %iframe_url, error = %e, "iframe branch failed");
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn m3u8_regex_extracts_plain_and_query_urls() {
        let page = r#"<video src="https://cdn.example.com/live/stream.m3u8?token=abc"></video>"#;
        let m = M3U8_URL_RE.find(page).unwrap();
        assert_eq!(
            m.as_str(),
            "https://cdn.example.com/live/stream.m3u8?token=abc"
        );

        let script = "var src = 'http://cdn.example.com/v/index.m3u8';";
        assert_eq!(
            M3U8_URL_RE.find(script).unwrap().as_str(),
            "http://cdn.example.com/v/index.m3u8"
        );
    }

    #[test]
    fn m3u8_regex_ignores_relative_links() {
        assert!(M3U8_URL_RE.find("src=\"/relative/stream.m3u8\"").is_none());
    }

    #[test]
    fn iframe_regex_captures_src() {
        let page = r#"<IFRAME width="640" SRC='/embed/player?id=1'></iframe>"#;
        let cap = IFRAME_SRC_RE.captures(page).unwrap();
        assert_eq!(&cap[1], "/embed/player?id=1");
    }

    #[test]
    fn iframe_regex_requires_quoted_src() {
        assert!(IFRAME_SRC_RE.captures("<iframe></iframe>").is_none());
    }
}
