//! On-disk layout of a download job.
//!
//! One file per segment under the output directory, named by index, plus the
//! concat manifest used by the remux fallback. Paths are derived purely from
//! the index so concurrent workers never contend on a destination.

use std::path::{Path, PathBuf};

/// File name of the concat manifest consumed by the remux fallback.
pub const MANIFEST_FILENAME: &str = "filelist.txt";

/// File name for the segment at `index` (0-based, no zero padding).
pub fn segment_filename(index: usize) -> String {
    format!("segment_{}.ts", index)
}

/// Full path of the segment file at `index` under `dir`.
pub fn segment_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(segment_filename(index))
}

/// Full path of the concat manifest under `dir`.
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILENAME)
}

/// In-progress path for a download: appends `.part` to the final name.
/// The final path appears only via rename once the fetch completed, so file
/// existence stays a trustworthy completeness signal.
pub fn part_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".part");
    PathBuf::from(os)
}
