//! Assembly of fetched segments into the final artifact.
//!
//! An ordered list of strategies is tried in sequence: raw byte concatenation
//! in index order first, then an external stream-copy remux driven by a
//! concat manifest. Raw concatenation of transport-stream segments is usually
//! valid but not universally so; the remux path covers the rest. Segment
//! files are never deleted here, so a failed run leaves everything behind for
//! manual recovery.

mod concat;
mod manifest;
mod remux;

pub use concat::concat_segments;
pub use manifest::write_manifest;
pub use remux::{remux_concat, RemuxError};

use std::fmt;
use std::path::Path;

use crate::playlist::SegmentDescriptor;

/// An assembly strategy, in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Append present segment files verbatim, in index order.
    Concat,
    /// Stream-copy concatenation via the external remux tool.
    Remux,
}

const STRATEGIES: &[Strategy] = &[Strategy::Concat, Strategy::Remux];

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Concat => write!(f, "concat"),
            Strategy::Remux => write!(f, "remux"),
        }
    }
}

/// Outcome of a successful assembly.
#[derive(Debug)]
pub struct AssembleReport {
    /// Strategy that produced the artifact.
    pub strategy: Strategy,
    /// Size of the artifact in bytes.
    pub bytes_written: u64,
    /// Indices whose segment file was absent (the artifact has gaps).
    pub missing: Vec<usize>,
}

/// Failure of one strategy.
#[derive(Debug)]
pub enum StrategyError {
    Io(std::io::Error),
    Remux(RemuxError),
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyError::Io(e) => write!(f, "I/O: {}", e),
            StrategyError::Remux(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StrategyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StrategyError::Io(e) => Some(e),
            StrategyError::Remux(e) => Some(e),
        }
    }
}

/// Every strategy failed; each failure is kept with the strategy that
/// produced it.
#[derive(Debug)]
pub struct AssembleError {
    pub failures: Vec<(Strategy, StrategyError)>,
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all assembly strategies failed:")?;
        for (strategy, error) in &self.failures {
            write!(f, " [{}: {}]", strategy, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AssembleError {}

/// Assembles the segments under `dir` into `output`, trying each strategy in
/// order until one succeeds. The remux fallback runs only when concatenation
/// fails at the I/O level; missing segments merely leave gaps.
pub fn assemble(
    output: &Path,
    segments: &[SegmentDescriptor],
    dir: &Path,
    remux_program: &str,
) -> Result<AssembleReport, AssembleError> {
    let mut failures: Vec<(Strategy, StrategyError)> = Vec::new();

    for &strategy in STRATEGIES {
        let outcome = match strategy {
            Strategy::Concat => {
                concat_segments(output, segments, dir).map_err(StrategyError::Io)
            }
            Strategy::Remux => {
                remux_concat(output, segments, dir, remux_program).map_err(StrategyError::Remux)
            }
        };
        match outcome {
            Ok(report) => {
                tracing::info!(
                    strategy = %strategy,
                    bytes = report.bytes_written,
                    missing = report.missing.len(),
                    "assembly succeeded"
                );
                return Ok(report);
            }
            Err(error) => {
                tracing::warn!(strategy = %strategy, error = %error, "assembly strategy failed");
                failures.push((strategy, error));
            }
        }
    }

    Err(AssembleError { failures })
}
