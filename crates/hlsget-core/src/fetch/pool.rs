//! Bounded worker pool: runs one fetch task per segment with a fixed
//! concurrency ceiling and joins the whole batch.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::mpsc;
use std::sync::Mutex;

use crate::http::HttpOptions;
use crate::paths;
use crate::playlist::SegmentDescriptor;
use crate::progress::{ProgressStats, ProgressTracker};
use crate::retry::{run_with_retry, FetchError, RetryPolicy};

use super::segment;

/// A segment that exhausted its retries during one batch.
#[derive(Debug)]
pub struct FailedSegment {
    pub index: usize,
    pub error: FetchError,
}

/// Outcome of one dispatch round: which segments ended in terminal failure.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Segments dispatched in this round.
    pub attempted: usize,
    /// Segments that exhausted their retries, with the final error each saw.
    pub failed: Vec<FailedSegment>,
}

impl BatchResult {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Terminally failed indices, ascending.
    pub fn failed_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.failed.iter().map(|f| f.index).collect();
        indices.sort_unstable();
        indices
    }
}

/// Runs `fetch` once per segment with at most `max_workers` invocations in
/// flight. Blocks until every segment has reached a terminal state; a failed
/// segment never aborts its siblings. No completion-order guarantee.
///
/// This is the seam the curl-backed [`run_batch`] builds on; tests pass an
/// instrumented closure here to observe concurrency and attempt counts.
pub fn run_batch_with<F>(
    segments: &[SegmentDescriptor],
    max_workers: usize,
    fetch: F,
) -> BatchResult
where
    F: Fn(&SegmentDescriptor) -> Result<(), FetchError> + Sync,
{
    if segments.is_empty() {
        return BatchResult::default();
    }

    let work: Mutex<VecDeque<SegmentDescriptor>> =
        Mutex::new(segments.iter().cloned().collect());
    let (tx, rx) = mpsc::channel::<(usize, Result<(), FetchError>)>();
    let num_workers = max_workers.max(1).min(segments.len());

    let mut failed = Vec::new();
    std::thread::scope(|s| {
        for _ in 0..num_workers {
            let tx = tx.clone();
            let work = &work;
            let fetch = &fetch;
            s.spawn(move || loop {
                let seg = match work.lock().unwrap().pop_front() {
                    Some(seg) => seg,
                    None => break,
                };
                let res = fetch(&seg);
                let _ = tx.send((seg.index, res));
            });
        }
        drop(tx);

        for (index, res) in rx {
            if let Err(error) = res {
                tracing::warn!(index, error = %error, "segment failed terminally");
                failed.push(FailedSegment { index, error });
            }
        }
    });

    BatchResult {
        attempted: segments.len(),
        failed,
    }
}

/// Curl-backed batch: each segment is fetched to its index-keyed path under
/// `dir` with retry and backoff; each success bumps the shared completed
/// counter and emits a progress event to `stats_tx` (if any).
pub fn run_batch(
    segments: &[SegmentDescriptor],
    dir: &Path,
    opts: &HttpOptions,
    policy: &RetryPolicy,
    max_workers: usize,
    tracker: &ProgressTracker,
    stats_tx: Option<&mpsc::Sender<ProgressStats>>,
) -> BatchResult {
    run_batch_with(segments, max_workers, |seg| {
        let dest = paths::segment_path(dir, seg.index);
        run_with_retry(policy, || segment::fetch_segment(opts, &seg.uri, &dest))?;
        let stats = tracker.complete_one();
        if let Some(tx) = stats_tx {
            let _ = tx.send(stats);
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn descriptors(n: usize) -> Vec<SegmentDescriptor> {
        (0..n)
            .map(|index| SegmentDescriptor {
                index,
                uri: format!("http://example.com/seg{}.ts", index),
            })
            .collect()
    }

    #[test]
    fn empty_batch_is_complete() {
        let result = run_batch_with(&[], 4, |_| Ok(()));
        assert_eq!(result.attempted, 0);
        assert!(result.is_complete());
    }

    #[test]
    fn every_segment_is_fetched_exactly_once() {
        let calls = AtomicUsize::new(0);
        let result = run_batch_with(&descriptors(25), 4, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(calls.load(Ordering::SeqCst), 25);
        assert_eq!(result.attempted, 25);
        assert!(result.is_complete());
    }

    #[test]
    fn failures_are_isolated_and_collected() {
        let result = run_batch_with(&descriptors(6), 3, |seg| {
            if seg.index % 2 == 1 {
                Err(FetchError::Http(404))
            } else {
                Ok(())
            }
        });
        assert_eq!(result.attempted, 6);
        assert_eq!(result.failed_indices(), vec![1, 3, 5]);
    }

    #[test]
    fn in_flight_fetches_never_exceed_the_ceiling() {
        let in_flight = AtomicUsize::new(0);
        let high_water = AtomicUsize::new(0);
        let result = run_batch_with(&descriptors(16), 3, |_| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            high_water.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(10));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(result.is_complete());
        let peak = high_water.load(Ordering::SeqCst);
        assert!(peak <= 3, "in-flight peak {} exceeded ceiling", peak);
        assert!(peak >= 2, "pool never actually ran concurrently");
    }

    #[test]
    fn worker_count_is_clamped_to_batch_size() {
        let calls = AtomicUsize::new(0);
        let result = run_batch_with(&descriptors(2), 64, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(result.is_complete());
    }
}
