//! Two-phase fan-out/fan-in runner.
//!
//! Per-page work is CPU-bound (text assembly, OCR, stitching), so each page
//! runs on tokio's blocking pool and at most `concurrency` pages are in
//! flight. [`run_phase`] returns only once every page has finished; that
//! return is the barrier the calibrator and the ranker rely on, since both
//! need all pages.
//!
//! Workers receive owned input and share nothing mutable. Results come back
//! in input order regardless of completion order.

use crate::error::OutlineError;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// The two per-page phases of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Line assembly, broken-text detection, OCR.
    Assemble,
    /// Stage A + stage B fragment merging.
    Merge,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Assemble => "assemble",
            Phase::Merge => "merge",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run `work` over every `(page, item)` pair and wait for all of them.
///
/// `page` is the 1-based page number, used only to label errors. If any item
/// fails, the phase fails: the error of the earliest failing page is returned
/// as [`OutlineError::PhaseFailed`]. A panicking worker becomes
/// [`OutlineError::Internal`].
pub async fn run_phase<I, O, F>(
    phase: Phase,
    items: Vec<(usize, I)>,
    concurrency: usize,
    work: F,
) -> Result<Vec<O>, OutlineError>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> Result<O, OutlineError> + Send + Sync + 'static,
{
    let start = Instant::now();
    let total = items.len();
    let work = Arc::new(work);

    let mut results: Vec<(usize, Result<O, OutlineError>)> =
        stream::iter(items.into_iter().enumerate().map(|(slot, (page, item))| {
            let work = Arc::clone(&work);
            async move {
                let joined = tokio::task::spawn_blocking(move || work(item)).await;
                let result = match joined {
                    Ok(r) => r.map_err(|e| label(phase, page, e)),
                    Err(e) => Err(OutlineError::Internal(format!(
                        "{phase} worker for page {page} panicked: {e}"
                    ))),
                };
                (slot, result)
            }
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(slot, _)| *slot);
    let outputs = results
        .into_iter()
        .map(|(_, r)| r)
        .collect::<Result<Vec<O>, OutlineError>>()?;

    debug!(
        "{} phase: {} pages in {}ms",
        phase,
        total,
        start.elapsed().as_millis()
    );
    Ok(outputs)
}

fn label(phase: Phase, page: usize, err: OutlineError) -> OutlineError {
    match err {
        already @ OutlineError::PhaseFailed { .. } => already,
        other => OutlineError::PhaseFailed {
            phase: phase.to_string(),
            page,
            detail: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn results_keep_input_order() {
        let items: Vec<(usize, u64)> = (1..=6).map(|p| (p, (7 - p) as u64)).collect();
        let out = run_phase(Phase::Merge, items, 3, |delay| {
            std::thread::sleep(Duration::from_millis(delay * 5));
            Ok(delay * 10)
        })
        .await
        .unwrap();
        assert_eq!(out, vec![60, 50, 40, 30, 20, 10]);
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let live = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (l, p) = (Arc::clone(&live), Arc::clone(&peak));
        let items: Vec<(usize, ())> = (1..=8).map(|p| (p, ())).collect();
        run_phase(Phase::Assemble, items, 2, move |_| {
            let now = l.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(10));
            l.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn one_failure_fails_the_phase() {
        let items: Vec<(usize, usize)> = (1..=4).map(|p| (p, p)).collect();
        let err = run_phase(Phase::Assemble, items, 4, |page| {
            if page == 3 {
                Err(OutlineError::OcrFailed {
                    page,
                    detail: "unreadable".into(),
                })
            } else {
                Ok(page)
            }
        })
        .await
        .unwrap_err();
        match err {
            OutlineError::PhaseFailed { phase, page, detail } => {
                assert_eq!(phase, "assemble");
                assert_eq!(page, 3);
                assert!(detail.contains("unreadable"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn panicking_worker_is_internal_error() {
        let err = run_phase(Phase::Merge, vec![(1, ())], 1, |_| -> Result<(), OutlineError> {
            panic!("worker exploded")
        })
        .await
        .unwrap_err();
        assert!(matches!(err, OutlineError::Internal(_)));
    }

    #[tokio::test]
    async fn empty_input_is_ok() {
        let out: Vec<u8> = run_phase(Phase::Merge, Vec::<(usize, u8)>::new(), 8, Ok)
            .await
            .unwrap();
        assert!(out.is_empty());
    }
}
