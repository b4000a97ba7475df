//! Single-segment streaming HTTP GET to a local file.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::http::HttpOptions;
use crate::paths;
use crate::retry::FetchError;

/// Downloads one segment: GET `url`, streaming the body to disk chunk by
/// chunk as curl delivers it (the segment is never buffered in memory).
///
/// The body streams into `<dest>.part`, which is renamed to `dest` only on
/// success; a failed or aborted attempt removes the partial file, so the
/// final path never exists for an incomplete segment. Each retry re-issues
/// the full GET over a fresh truncated `.part` file, making per-index
/// overwrite idempotent. Any transport error and any non-2xx status returns
/// a retryable `FetchError`; a local write failure is `FetchError::Storage`
/// and is terminal.
pub fn fetch_segment(opts: &HttpOptions, url: &str, dest: &Path) -> Result<(), FetchError> {
    let part = paths::part_path(dest);
    match stream_to(opts, url, &part) {
        Ok(()) => {
            std::fs::rename(&part, dest)?;
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(&part);
            Err(e)
        }
    }
}

fn stream_to(opts: &HttpOptions, url: &str, part: &Path) -> Result<(), FetchError> {
    let mut out = File::create(part)?;
    let mut storage_error: Option<std::io::Error> = None;

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    opts.apply(&mut easy)?;

    let perform_result = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match out.write_all(data) {
            Ok(()) => Ok(data.len()),
            Err(e) => {
                // Abort the transfer; curl reports a write error which is
                // mapped back to the stashed io::Error below.
                storage_error = Some(e);
                Ok(0)
            }
        })?;
        transfer.perform()
    };
    if let Err(e) = perform_result {
        if e.is_write_error() {
            if let Some(io_err) = storage_error.take() {
                return Err(FetchError::Storage(io_err));
            }
        }
        return Err(FetchError::Curl(e));
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Http(code));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolvable_host_is_a_curl_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("segment_0.ts");
        let mut opts = HttpOptions::default();
        opts.connect_timeout = std::time::Duration::from_millis(500);
        opts.request_timeout = std::time::Duration::from_secs(2);
        let err = fetch_segment(&opts, "http://invalid.invalid/seg.ts", &dest).unwrap_err();
        assert!(matches!(err, FetchError::Curl(_)));
    }

    #[test]
    fn failed_fetch_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("segment_0.ts");
        let mut opts = HttpOptions::default();
        opts.connect_timeout = std::time::Duration::from_millis(500);
        opts.request_timeout = std::time::Duration::from_secs(2);
        let _ = fetch_segment(&opts, "http://invalid.invalid/seg.ts", &dest);
        assert!(!dest.exists(), "final path must not exist after a failure");
        assert!(
            !paths::part_path(&dest).exists(),
            "partial file must be cleaned up"
        );
    }

    #[test]
    fn unwritable_destination_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no-such-subdir").join("segment_0.ts");
        let err = fetch_segment(&HttpOptions::default(), "http://127.0.0.1:1/x", &dest)
            .unwrap_err();
        assert!(matches!(err, FetchError::Storage(_)));
    }
}
