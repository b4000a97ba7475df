//! Bounded reconciliation: detect segments missing from local storage and
//! re-dispatch exactly those, a limited number of rounds.
//!
//! Completeness is judged by file existence alone (no size or content
//! validation); a segment file that exists is never re-fetched, so re-running
//! against a complete directory performs zero fetches.

use std::path::Path;

use thiserror::Error;

use crate::fetch::BatchResult;
use crate::paths;
use crate::playlist::SegmentDescriptor;

/// Reconciliation gave up with segments still missing after the round bound.
#[derive(Debug, Error)]
#[error("{count} segments unresolved after {rounds} reconcile rounds: {missing:?}", count = .missing.len())]
pub struct IncompleteError {
    /// Indices still absent on disk, ascending.
    pub missing: Vec<usize>,
    /// Gap-closing rounds that were run after the initial pass.
    pub rounds: u32,
}

/// Accounting for a completed reconciliation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileReport {
    /// Segment fetches dispatched across all rounds.
    pub dispatched: usize,
    /// Gap-closing rounds run after the initial pass.
    pub rounds: u32,
}

/// Returns the descriptors whose segment file is absent under `dir`,
/// preserving index order.
pub fn scan_missing(segments: &[SegmentDescriptor], dir: &Path) -> Vec<SegmentDescriptor> {
    segments
        .iter()
        .filter(|seg| !paths::segment_path(dir, seg.index).exists())
        .cloned()
        .collect()
}

/// Runs the initial dispatch plus up to `max_rounds` gap-closing rounds.
///
/// Each round scans for missing files first and resubmits exactly those, so
/// segments already on disk are never dispatched. The loop carries an
/// explicit round counter; when the bound is exhausted with files still
/// missing, the unresolved indices are returned instead of looping further.
pub fn reconcile_with<R>(
    segments: &[SegmentDescriptor],
    dir: &Path,
    max_rounds: u32,
    mut run: R,
) -> Result<ReconcileReport, IncompleteError>
where
    R: FnMut(&[SegmentDescriptor]) -> BatchResult,
{
    let mut report = ReconcileReport::default();

    let missing = scan_missing(segments, dir);
    if missing.is_empty() {
        tracing::info!("all segment files already present, nothing to fetch");
        return Ok(report);
    }
    report.dispatched += missing.len();
    run(&missing);

    for round in 1..=max_rounds {
        let missing = scan_missing(segments, dir);
        if missing.is_empty() {
            return Ok(report);
        }
        tracing::info!(
            round,
            missing = missing.len(),
            "re-dispatching missing segments"
        );
        report.rounds = round;
        report.dispatched += missing.len();
        run(&missing);
    }

    let missing = scan_missing(segments, dir);
    if missing.is_empty() {
        Ok(report)
    } else {
        Err(IncompleteError {
            missing: missing.iter().map(|seg| seg.index).collect(),
            rounds: report.rounds,
        })
    }
}
