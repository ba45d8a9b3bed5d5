//! Progress-callback trait for batch and per-document events.
//!
//! Inject an [`Arc<dyn OutlineProgressCallback>`] via
//! [`crate::config::OutlineConfigBuilder::progress_callback`] to be told when
//! a batch starts, when each document starts/finishes, and how it went. The
//! CLI uses this to drive its progress bar; library users can forward the
//! events anywhere.
//!
//! # Example
//!
//! ```rust
//! use pdf_outline::{OutlineConfig, OutlineProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl OutlineProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, name: &str, entries: usize, elapsed_ms: u64) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{name}: {entries} headings in {elapsed_ms}ms");
//!     }
//! }
//!
//! let config = OutlineConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by [`crate::batch`] and [`crate::convert`] as documents are processed.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// callback is stored in a cloneable config shared with worker tasks.
pub trait OutlineProgressCallback: Send + Sync {
    /// Called once before the first document of a batch.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before a document is opened.
    fn on_document_start(&self, name: &str) {
        let _ = name;
    }

    /// Called after a document's outline was produced.
    ///
    /// # Arguments
    /// * `name`       : file name of the document
    /// * `entries`    : number of outline entries (title excluded)
    /// * `elapsed_ms` : wall-clock time for this document
    fn on_document_complete(&self, name: &str, entries: usize, elapsed_ms: u64) {
        let _ = (name, entries, elapsed_ms);
    }

    /// Called when a document failed; the batch continues.
    fn on_document_error(&self, name: &str, error: &str) {
        let _ = (name, error);
    }

    /// Called once after every document of a batch was attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl OutlineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::OutlineConfig`].
pub type ProgressCallback = Arc<dyn OutlineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        batch_total: AtomicUsize,
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        successes: AtomicUsize,
    }

    impl OutlineProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_documents: usize) {
            self.batch_total.store(total_documents, Ordering::SeqCst);
        }

        fn on_document_start(&self, _name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _name: &str, _entries: usize, _elapsed_ms: u64) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_error(&self, _name: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total_documents: usize, success_count: usize) {
            self.successes.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_document_start("a.pdf");
        cb.on_document_complete("a.pdf", 3, 10);
        cb.on_document_error("b.pdf", "corrupt");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        let cb: Arc<dyn OutlineProgressCallback> = Arc::new(TrackingCallback::default());
        cb.on_batch_start(1);

        tracker.on_batch_start(3);
        tracker.on_document_start("a.pdf");
        tracker.on_document_complete("a.pdf", 5, 120);
        tracker.on_document_start("b.pdf");
        tracker.on_document_error("b.pdf", "not a pdf");
        tracker.on_batch_complete(3, 1);

        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.successes.load(Ordering::SeqCst), 1);
    }
}
