//! Concat manifest for the remux fallback.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::paths;
use crate::playlist::SegmentDescriptor;

/// Writes `<dir>/filelist.txt` listing every present segment file, one
/// `file '<path>'` line per segment in ascending index order. Returns the
/// manifest path and how many entries were written.
pub fn write_manifest(
    dir: &Path,
    segments: &[SegmentDescriptor],
) -> io::Result<(PathBuf, usize)> {
    let path = paths::manifest_path(dir);
    let mut out = BufWriter::new(File::create(&path)?);
    let mut entries = 0usize;

    for seg in segments {
        let seg_path = paths::segment_path(dir, seg.index);
        if !seg_path.exists() {
            continue;
        }
        writeln!(
            out,
            "file '{}'",
            escape_quotes(&seg_path.display().to_string())
        )?;
        entries += 1;
    }

    out.flush()?;
    Ok((path, entries))
}

/// Escapes single quotes for the concat demuxer's quoted-path syntax.
fn escape_quotes(path: &str) -> String {
    path.replace('\'', r"'\''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn descriptors(n: usize) -> Vec<SegmentDescriptor> {
        (0..n)
            .map(|index| SegmentDescriptor {
                index,
                uri: format!("http://example.com/seg{}.ts", index),
            })
            .collect()
    }

    #[test]
    fn lists_present_segments_in_ascending_order() {
        let dir = tempfile::tempdir().unwrap();
        for i in [0usize, 1, 3] {
            fs::write(paths::segment_path(dir.path(), i), b"x").unwrap();
        }

        let (path, entries) = write_manifest(dir.path(), &descriptors(4)).unwrap();
        assert_eq!(entries, 3);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("file '"));
        assert!(lines[0].ends_with("segment_0.ts'"));
        assert!(lines[1].ends_with("segment_1.ts'"));
        assert!(lines[2].ends_with("segment_3.ts'"));
    }

    #[test]
    fn escapes_single_quotes_in_paths() {
        assert_eq!(escape_quotes("/tmp/it's/seg.ts"), r"/tmp/it'\''s/seg.ts");
        assert_eq!(escape_quotes("/plain/seg.ts"), "/plain/seg.ts");
    }
}
