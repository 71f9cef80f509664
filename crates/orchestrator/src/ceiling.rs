#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

/// How many of the leading resources a cycle is allowed to fetch.
///
/// Grows by one per cycle so that every reload touches one resource the
/// transport has not seen yet, which makes cache warm-up observable. The
/// value never decreases.
#[derive(Debug, Default)]
pub struct FetchCeiling(AtomicUsize);

impl FetchCeiling {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one and return the new value. Saturates at `usize::MAX`.
    pub fn increment_and_get(&self) -> usize {
        let prev = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(1))
            })
            // the closure never returns None
            .unwrap_or_else(|current| current);
        prev.saturating_add(1)
    }

    pub fn current(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// `min(current, total)`: the number of fetches a cycle dispatches.
    pub fn effective_fetch_count(&self, total: usize) -> usize {
        self.current().min(total)
    }
}
