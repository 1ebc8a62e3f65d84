//! Cancellation and progress handle shared between a running crawl and its host

use crate::output::CrawlProgress;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Cloneable handle used to stop a crawl and observe its counters
///
/// Stopping is cooperative: fetch and download tasks check the flag before
/// issuing a request, and a request already in flight is allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CrawlHandle {
    stopped: Arc<AtomicBool>,
    progress: Arc<Mutex<CrawlProgress>>,
}

impl CrawlHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the crawl stop at its next checkpoint
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Snapshot of the run counters
    pub fn progress(&self) -> CrawlProgress {
        self.progress
            .lock()
            .map(|p| p.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub(crate) fn update_progress(&self, update: impl FnOnce(&mut CrawlProgress)) {
        let mut guard = self
            .progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        update(&mut guard);
    }
}
