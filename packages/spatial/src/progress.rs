//! Progress reporting for per-school proximity queries.
//!
//! [`associate`](crate::associate) runs one radius query per school and
//! reports each finished query through a [`ProgressCallback`]. The engine
//! does not render anything itself; binaries plug in a terminal progress
//! bar, and library callers pass [`NullProgress`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receives progress updates from a spatial join.
///
/// Must be `Send + Sync`: with the `parallel` feature, schools are
/// queried from rayon worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Number of schools that will be queried.
    fn set_total(&self, total: u64);

    /// `delta` more schools have been queried.
    fn inc(&self, delta: u64);

    /// The join is done; `msg` summarizes the result.
    fn finish(&self, msg: String);
}

/// Discards all updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn finish(&self, _msg: String) {}
}

/// Shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

/// Counts updates without rendering them.
#[derive(Debug, Default)]
pub struct CountingProgress {
    total: AtomicU64,
    done: AtomicU64,
}

impl CountingProgress {
    /// Total announced by the last [`ProgressCallback::set_total`].
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Units reported through [`ProgressCallback::inc`].
    #[must_use]
    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }
}

impl ProgressCallback for CountingProgress {
    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
    }

    fn inc(&self, delta: u64) {
        self.done.fetch_add(delta, Ordering::Relaxed);
    }

    fn finish(&self, msg: String) {
        log::debug!("{msg}");
    }
}
