//! Thread-safe accumulation of matches and counters

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Capped, synchronized list of matched paths
#[derive(Debug)]
pub struct MatchSet {
    paths: Mutex<Vec<PathBuf>>,
    found: AtomicUsize,
    cap:   usize,
}

impl MatchSet {
    /// Create an empty set that accepts at most `cap` paths
    #[must_use]
    pub const fn new(cap: usize) -> Self {
        Self { paths: Mutex::new(Vec::new()), found: AtomicUsize::new(0), cap }
    }

    /// Record a match; returns `false` once the cap is reached
    ///
    /// A slot is reserved with a bounded increment before the push, so the
    /// number of stored paths never exceeds the cap.
    pub fn push(&self, path: PathBuf) -> bool {
        let reserved = self
            .found
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < self.cap).then_some(n + 1))
            .is_ok();
        if reserved {
            self.paths.lock().unwrap_or_else(PoisonError::into_inner).push(path);
        }
        reserved
    }

    /// Whether no more matches will be accepted
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.found.load(Ordering::Acquire) >= self.cap
    }

    /// Drain the stored matches, sorted as plain strings and deduplicated
    #[must_use]
    pub fn take_sorted(&self) -> Vec<PathBuf> {
        let mut paths =
            std::mem::take(&mut *self.paths.lock().unwrap_or_else(PoisonError::into_inner));
        paths.sort_unstable_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        paths.dedup();
        paths
    }
}

/// Diagnostic counters of one search
#[derive(Debug, Default)]
pub struct Counters {
    /// Directory entries inspected
    pub scanned:        AtomicU64,
    /// Directories listed successfully
    pub dirs_listed:    AtomicU64,
    /// Subdirectories whose listing failed
    pub unreadable:     AtomicU64,
    /// Inline walks caused by a full queue
    pub overflow_walks: AtomicU64,
}

impl Counters {
    pub(crate) fn record_scanned(&self) {
        self.scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_listed(&self) {
        self.dirs_listed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unreadable(&self) {
        self.unreadable.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_overflow(&self) {
        self.overflow_walks.fetch_add(1, Ordering::Relaxed);
    }
}
