//! Fetch and parse playlists, descending through variant playlists to a flat
//! segment list.

use thiserror::Error;
use url::Url;

use super::select::select_variant;
use super::{SegmentDescriptor, VariantDescriptor};
use crate::http::{fetch_text, HttpOptions};
use crate::retry::FetchError;

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("failed to fetch playlist {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to parse playlist {url}: {reason}")]
    Parse { url: String, reason: String },
    #[error("invalid URL {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("variant playlist has no renditions: {url}")]
    NoVariants { url: String },
    #[error("playlist has no segments: {url}")]
    NoSegments { url: String },
    #[error("variant recursion exceeded {depth} hops (cyclic playlist reference?)")]
    VariantDepthExceeded { depth: u32 },
}

/// One parse result: either the renditions of a variant playlist or the
/// segments of a media playlist.
#[derive(Debug)]
enum Parsed {
    Variants(Vec<VariantDescriptor>),
    Segments(Vec<SegmentDescriptor>),
}

/// Resolves `playlist_url` to the flat, ordered segment list.
///
/// A variant playlist is descended by selecting the highest-bandwidth
/// rendition and re-fetching, at most `max_depth` hops; the bound turns a
/// cyclic or self-referential variant chain into an explicit error instead
/// of unbounded recursion.
pub fn resolve_segments(
    opts: &HttpOptions,
    playlist_url: &str,
    max_depth: u32,
) -> Result<Vec<SegmentDescriptor>, PlaylistError> {
    let mut url = parse_url(playlist_url)?;

    for _hop in 0..=max_depth {
        tracing::debug!(url = %url, "fetching playlist");
        let text = fetch_text(opts, url.as_str()).map_err(|source| PlaylistError::Fetch {
            url: url.to_string(),
            source,
        })?;

        match parse_step(&url, &text)? {
            Parsed::Segments(segments) => {
                if segments.is_empty() {
                    return Err(PlaylistError::NoSegments {
                        url: url.to_string(),
                    });
                }
                tracing::info!(url = %url, segments = segments.len(), "resolved media playlist");
                return Ok(segments);
            }
            Parsed::Variants(variants) => {
                for v in &variants {
                    tracing::info!(
                        bandwidth = v.bandwidth.unwrap_or(0),
                        resolution = v.resolution.as_deref().unwrap_or("unknown"),
                        "available rendition"
                    );
                }
                let chosen = select_variant(&variants).ok_or_else(|| PlaylistError::NoVariants {
                    url: url.to_string(),
                })?;
                let next = join_url(&url, &chosen.uri)?;
                tracing::info!(
                    bandwidth = chosen.bandwidth.unwrap_or(0),
                    url = %next,
                    "selected highest-bandwidth rendition"
                );
                url = next;
            }
        }
    }

    Err(PlaylistError::VariantDepthExceeded { depth: max_depth })
}

/// Parses one playlist document fetched from `url`, mapping rendition and
/// segment URIs to absolute URLs.
fn parse_step(url: &Url, text: &str) -> Result<Parsed, PlaylistError> {
    let (_, playlist) =
        m3u8_rs::parse_playlist(text.as_bytes()).map_err(|e| PlaylistError::Parse {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    match playlist {
        m3u8_rs::Playlist::MasterPlaylist(master) => {
            let variants = master
                .variants
                .iter()
                .map(|v| VariantDescriptor {
                    uri: v.uri.clone(),
                    bandwidth: Some(v.bandwidth),
                    resolution: v
                        .resolution
                        .as_ref()
                        .map(|r| format!("{}x{}", r.width, r.height)),
                })
                .collect();
            Ok(Parsed::Variants(variants))
        }
        m3u8_rs::Playlist::MediaPlaylist(media) => {
            let segments = media
                .segments
                .iter()
                .enumerate()
                .map(|(index, s)| {
                    Ok(SegmentDescriptor {
                        index,
                        uri: join_url(url, &s.uri)?.into(),
                    })
                })
                .collect::<Result<Vec<_>, PlaylistError>>()?;
            Ok(Parsed::Segments(segments))
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, PlaylistError> {
    Url::parse(raw).map_err(|source| PlaylistError::Url {
        url: raw.to_string(),
        source,
    })
}

/// Resolves a possibly-relative playlist or segment URI against its base.
fn join_url(base: &Url, uri: &str) -> Result<Url, PlaylistError> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        parse_url(uri)
    } else {
        base.join(uri).map_err(|source| PlaylistError::Url {
            url: uri.to_string(),
            source,
        })
    }
}
