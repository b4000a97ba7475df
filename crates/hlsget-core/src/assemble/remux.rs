//! Fallback assembly: external stream-copy remux driven by the concat
//! manifest. The tool is opaque; only its exit status is consumed.

use std::path::Path;
use std::process::Command;

use thiserror::Error;

use crate::paths;
use crate::playlist::SegmentDescriptor;

use super::{AssembleReport, Strategy};

/// Failure modes of the remux fallback, the run's final unrecoverable stage.
#[derive(Debug, Error)]
pub enum RemuxError {
    #[error("failed to write concat manifest: {0}")]
    Manifest(#[source] std::io::Error),
    #[error("concat manifest lists no segment files")]
    EmptyManifest,
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {code:?}: {stderr}")]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Writes the manifest and invokes
/// `<program> -y -f concat -safe 0 -i <manifest> -c copy <output>`.
pub fn remux_concat(
    output: &Path,
    segments: &[SegmentDescriptor],
    dir: &Path,
    program: &str,
) -> Result<AssembleReport, RemuxError> {
    let (manifest, entries) =
        super::manifest::write_manifest(dir, segments).map_err(RemuxError::Manifest)?;
    if entries == 0 {
        return Err(RemuxError::EmptyManifest);
    }

    tracing::info!(program, manifest = %manifest.display(), entries, "invoking remux tool");
    let result = Command::new(program)
        .arg("-y")
        .args(["-f", "concat", "-safe", "0", "-i"])
        .arg(&manifest)
        .args(["-c", "copy"])
        .arg(output)
        .output()
        .map_err(|source| RemuxError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !result.status.success() {
        return Err(RemuxError::Exit {
            program: program.to_string(),
            code: result.status.code(),
            stderr: stderr_tail(&result.stderr),
        });
    }

    let bytes_written = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    let missing = segments
        .iter()
        .filter(|seg| !paths::segment_path(dir, seg.index).exists())
        .map(|seg| seg.index)
        .collect();

    Ok(AssembleReport {
        strategy: Strategy::Remux,
        bytes_written,
        missing,
    })
}

/// Last chunk of the tool's stderr, enough to diagnose without flooding logs.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim_end();
    match trimmed.char_indices().nth_back(799) {
        Some((idx, _)) => trimmed[idx..].to_string(),
        None => trimmed.to_string(),
    }
}
