//! End-to-end run orchestration: discover the playlist, resolve it to a flat
//! segment list, fetch with the bounded pool, close gaps, assemble.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;

use thiserror::Error;
use url::Url;

use crate::assemble::{assemble, AssembleError, Strategy};
use crate::config::{JobConfig, ToolConfig};
use crate::discover::{discover_playlist_url, DiscoverError};
use crate::fetch::run_batch;
use crate::http::HttpOptions;
use crate::playlist::{resolve_segments, PlaylistError};
use crate::progress::{ProgressStats, ProgressTracker};
use crate::reconcile::{reconcile_with, scan_missing, IncompleteError};
use crate::retry::RetryPolicy;

/// Summary of a successful run.
#[derive(Debug)]
pub struct RunReport {
    /// Resolved media playlist URL.
    pub playlist_url: String,
    /// Total segments in the playlist.
    pub segment_count: usize,
    /// Gap-closing rounds run after the first pass.
    pub reconcile_rounds: u32,
    /// Final artifact path.
    pub output_path: PathBuf,
    /// Strategy that assembled the artifact.
    pub assembled_with: Strategy,
    /// Size of the artifact in bytes.
    pub bytes_written: u64,
}

/// A run failure, carrying the stage that produced it. Per-segment failures
/// never surface here; they are retried or isolated inside the batches.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Discover(#[from] DiscoverError),
    #[error(transparent)]
    Playlist(#[from] PlaylistError),
    #[error("failed to create output directory {dir}: {source}")]
    OutputDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Reconciliation gave up with segments still missing. A best-effort
    /// artifact is still assembled around the gaps when possible; its path is
    /// carried for manual recovery.
    #[error("download incomplete: {incomplete}")]
    Incomplete {
        incomplete: IncompleteError,
        partial_output: Option<PathBuf>,
    },
    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

/// Runs one job to completion: playlist resolution, first fetch pass,
/// bounded reconciliation, assembly.
///
/// Progress events stream to `stats_tx` while batches run; the sender is
/// dropped on return so a consumer loop terminates with it.
pub fn run(
    tool: &ToolConfig,
    job: &JobConfig,
    stats_tx: Option<mpsc::Sender<ProgressStats>>,
) -> Result<RunReport, RunError> {
    let opts = HttpOptions::from_tool(tool);

    let playlist_url = if is_playlist_url(&job.url) {
        job.url.clone()
    } else {
        discover_playlist_url(
            &opts.clone().with_referer(job.url.clone()),
            &job.url,
            tool.discover_depth,
        )?
    };

    // CDNs commonly gate segment requests on a Referer from their own origin.
    let seg_opts = opts.with_referer(origin_of(&playlist_url)?);
    let segments = resolve_segments(&seg_opts, &playlist_url, tool.variant_depth)?;

    fs::create_dir_all(&job.output_dir).map_err(|source| RunError::OutputDir {
        dir: job.output_dir.clone(),
        source,
    })?;

    let policy = RetryPolicy {
        max_retries: job.max_retries,
        base_delay: tool.retry_base_delay(),
    };
    let tracker = ProgressTracker::new(segments.len());
    let already_present = segments.len() - scan_missing(&segments, &job.output_dir).len();
    if already_present > 0 {
        tracing::info!(already_present, "resuming into a partially fetched directory");
        tracker.preload(already_present);
        if let Some(tx) = &stats_tx {
            let _ = tx.send(tracker.snapshot());
        }
    }

    tracing::info!(
        segments = segments.len(),
        workers = job.max_workers,
        retries = job.max_retries,
        "starting download"
    );
    let reconcile_result = reconcile_with(
        &segments,
        &job.output_dir,
        tool.reconcile_rounds,
        |missing| {
            run_batch(
                missing,
                &job.output_dir,
                &seg_opts,
                &policy,
                job.max_workers,
                &tracker,
                stats_tx.as_ref(),
            )
        },
    );

    let output_path = job.output_dir.join(&job.output_file);
    match reconcile_result {
        Ok(report) => {
            let assembled = assemble(
                &output_path,
                &segments,
                &job.output_dir,
                &tool.remux_program,
            )?;
            tracing::info!(output = %output_path.display(), "run complete");
            Ok(RunReport {
                playlist_url,
                segment_count: segments.len(),
                reconcile_rounds: report.rounds,
                output_path,
                assembled_with: assembled.strategy,
                bytes_written: assembled.bytes_written,
            })
        }
        Err(incomplete) => {
            // Assemble what we have anyway; the gaps are already known and
            // the segment files stay on disk either way.
            tracing::warn!(
                missing = incomplete.missing.len(),
                "assembling a best-effort artifact around the gaps"
            );
            let partial_output = match assemble(
                &output_path,
                &segments,
                &job.output_dir,
                &tool.remux_program,
            ) {
                Ok(_) => Some(output_path),
                Err(e) => {
                    tracing::warn!(error = %e, "best-effort assembly also failed");
                    None
                }
            };
            Err(RunError::Incomplete {
                incomplete,
                partial_output,
            })
        }
    }
}

/// A URL that already points at a playlist skips page discovery.
fn is_playlist_url(url: &str) -> bool {
    url.contains(".m3u8")
}

/// Scheme + host root of a URL, used as the Referer for segment requests.
fn origin_of(url: &str) -> Result<String, PlaylistError> {
    let mut parsed = Url::parse(url).map_err(|source| PlaylistError::Url {
        url: url.to_string(),
        source,
    })?;
    parsed.set_path("/");
    parsed.set_query(None);
    parsed.set_fragment(None);
    Ok(parsed.to_string())
}
