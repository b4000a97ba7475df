//! Primary assembly: raw byte concatenation in index order.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::paths;
use crate::playlist::SegmentDescriptor;

use super::{AssembleReport, Strategy};

/// Creates `output` and appends each present segment file verbatim, walking
/// indices in ascending order. An absent segment is logged and skipped, so
/// the artifact is best-effort with no content substituted for the gap. Only
/// an I/O-level failure aborts the strategy.
pub fn concat_segments(
    output: &Path,
    segments: &[SegmentDescriptor],
    dir: &Path,
) -> io::Result<AssembleReport> {
    let mut out = File::create(output)?;
    let mut bytes_written = 0u64;
    let mut missing = Vec::new();

    for seg in segments {
        let path = paths::segment_path(dir, seg.index);
        if !path.exists() {
            tracing::warn!(index = seg.index, "segment file missing, leaving a gap");
            missing.push(seg.index);
            continue;
        }
        let mut input = File::open(&path)?;
        bytes_written += io::copy(&mut input, &mut out)?;
    }

    out.sync_all()?;
    Ok(AssembleReport {
        strategy: Strategy::Concat,
        bytes_written,
        missing,
    })
}
