//! Parallel directory search
//!
//! The calling thread lists the root itself and seeds the queue with the
//! root's subdirectories. A fixed pool of workers drains the queue, each
//! listing one directory at a time and submitting the subdirectories it
//! finds. When a submit hits a full queue the submitting thread walks that
//! subtree inline. Once the pending barrier reaches zero the queue is closed
//! and the workers exit.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, info};

use crate::aggregate::{Counters, MatchSet};
use crate::cancel::CancelToken;
use crate::classify::Classifier;
use crate::error::{Error, Result};
use crate::queue::{Submit, WorkItem, WorkQueue};
use crate::types::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS, MAX_RESULTS, MatchTarget, SearchMode, SearchOutcome,
};

/// Tunables of a search run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Worker threads draining the queue
    pub workers:        usize,
    /// Directories the queue holds before submits overflow inline
    pub queue_capacity: usize,
    /// Hard cap on returned matches
    pub max_results:    usize,
    /// What the needle is compared against
    pub target:         MatchTarget,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            workers:        DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_results:    MAX_RESULTS,
            target:         MatchTarget::Name,
        }
    }
}

impl SearchOptions {
    /// Check that every limit is usable
    ///
    /// # Errors
    /// Returns `Error::InvalidOptions` if any count is zero.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidOptions("at least one worker is required"));
        }
        if self.queue_capacity == 0 {
            return Err(Error::InvalidOptions("queue capacity must be positive"));
        }
        if self.max_results == 0 {
            return Err(Error::InvalidOptions("result cap must be positive"));
        }
        Ok(())
    }
}

/// A configured search over one directory tree
#[derive(Debug, Clone)]
pub struct Search {
    root:             PathBuf,
    query:            String,
    mode:             SearchMode,
    skip_system_dirs: bool,
    options:          SearchOptions,
    cancel:           CancelToken,
}

impl Search {
    /// Search `root` for entries whose name contains `query`, ignoring case
    pub fn new(root: impl Into<PathBuf>, query: &str) -> Self {
        Self {
            root:             root.into(),
            query:            query.to_owned(),
            mode:             SearchMode::Both,
            skip_system_dirs: true,
            options:          SearchOptions::default(),
            cancel:           CancelToken::new(),
        }
    }

    /// Restrict which entry kinds may match
    #[must_use]
    pub const fn mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Prune system and hidden directories (on by default)
    #[must_use]
    pub const fn skip_system_dirs(mut self, skip: bool) -> Self {
        self.skip_system_dirs = skip;
        self
    }

    /// Replace all tunables
    #[must_use]
    pub const fn options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Number of worker threads
    #[must_use]
    pub const fn workers(mut self, workers: usize) -> Self {
        self.options.workers = workers;
        self
    }

    /// Capacity of the directory queue
    #[must_use]
    pub const fn queue_capacity(mut self, capacity: usize) -> Self {
        self.options.queue_capacity = capacity;
        self
    }

    /// Cap on returned matches
    #[must_use]
    pub const fn max_results(mut self, max: usize) -> Self {
        self.options.max_results = max;
        self
    }

    /// Compare the needle against the full path as well as the name
    #[must_use]
    pub const fn match_target(mut self, target: MatchTarget) -> Self {
        self.options.target = target;
        self
    }

    /// Use `token` to stop the search from another thread
    #[must_use]
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Root of the search
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run the search to completion, to the match cap, or until cancelled
    ///
    /// # Errors
    /// Returns error if:
    /// - The options are invalid
    /// - The root cannot be listed
    /// - A worker thread cannot be spawned
    pub fn run(&self) -> Result<SearchOutcome> {
        self.options.validate()?;
        let start = Instant::now();

        let shared = Arc::new(Shared {
            queue:      WorkQueue::new(self.options.queue_capacity),
            classifier: Classifier::new(
                &self.query,
                self.mode,
                self.skip_system_dirs,
                self.options.target,
            ),
            matches:    MatchSet::new(self.options.max_results),
            counters:   Counters::default(),
            cancel:     self.cancel.clone(),
        });

        info!(
            root = %self.root.display(),
            query = shared.classifier.needle(),
            mode = %self.mode,
            skip_system_dirs = self.skip_system_dirs,
            workers = self.options.workers,
            "Starting search"
        );

        // Held until seeding is done so the barrier cannot reach zero early.
        let seed = WorkItem::new(self.root.clone(), shared.queue.pending());
        let workers = spawn_workers(&shared, self.options.workers)?;

        let seeded = shared.seed(seed.path());
        drop(seed);

        shared.queue.pending().wait();
        shared.queue.close();
        join_workers(workers);

        if let Err(source) = seeded {
            return Err(Error::root(&self.root, source));
        }

        let outcome = shared.outcome(start);
        info!(
            matches = outcome.matches.len(),
            scanned = outcome.scanned,
            unreadable = outcome.unreadable,
            overflow_walks = outcome.overflow_walks,
            truncated = outcome.truncated,
            cancelled = outcome.cancelled,
            elapsed_ms = u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
            "Search finished"
        );
        Ok(outcome)
    }
}

/// Search `root` with default tunables
///
/// # Errors
/// Returns error if the root cannot be listed.
pub fn search(
    root: impl Into<PathBuf>,
    query: &str,
    mode: SearchMode,
    skip_system_dirs: bool,
) -> Result<SearchOutcome> {
    Search::new(root, query).mode(mode).skip_system_dirs(skip_system_dirs).run()
}

/// How subdirectories found in a listing are traversed
#[derive(Debug, Clone, Copy)]
enum Descend {
    /// Hand them to the queue
    Submit,
    /// Recurse on this thread
    Inline,
}

/// State shared by the workers and the calling thread
#[derive(Debug)]
struct Shared {
    queue:      WorkQueue,
    classifier: Classifier,
    matches:    MatchSet,
    counters:   Counters,
    cancel:     CancelToken,
}

impl Shared {
    fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || self.matches.is_full()
    }

    /// List the root and fan its subdirectories out to the pool
    fn seed(&self, root: &Path) -> std::io::Result<()> {
        let entries = fs::read_dir(root)?;
        self.counters.record_listed();
        self.scan_entries(entries, Descend::Submit);
        Ok(())
    }

    fn work(&self) {
        while let Some(item) = self.queue.recv() {
            // Drain without listing once nothing more can be recorded.
            if self.should_stop() {
                continue;
            }
            self.scan_dir(item.path(), Descend::Submit);
        }
    }

    fn submit(&self, dir: PathBuf) {
        if let Submit::Full(item) = self.queue.submit(dir) {
            self.counters.record_overflow();
            debug!(dir = %item.path().display(), "Queue full, walking inline");
            self.scan_dir(item.path(), Descend::Inline);
        }
    }

    fn scan_dir(&self, dir: &Path, descend: Descend) {
        if self.should_stop() {
            return;
        }
        match fs::read_dir(dir) {
            Ok(entries) => {
                self.counters.record_listed();
                self.scan_entries(entries, descend);
            },
            Err(e) => {
                self.counters.record_unreadable();
                debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
            },
        }
    }

    fn scan_entries(&self, entries: fs::ReadDir, descend: Descend) {
        for entry in entries {
            if self.should_stop() {
                return;
            }
            let Ok(entry) = entry else {
                continue;
            };
            self.counters.record_scanned();

            let path = entry.path();
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            let verdict = self.classifier.classify(&entry.file_name(), &path, is_dir);
            if verdict.prune {
                continue;
            }

            if is_dir {
                match descend {
                    Descend::Submit => self.submit(path.clone()),
                    Descend::Inline => self.scan_dir(&path, Descend::Inline),
                }
            }
            if verdict.is_match {
                self.matches.push(path);
            }
        }
    }

    fn outcome(&self, start: Instant) -> SearchOutcome {
        SearchOutcome {
            matches:        self.matches.take_sorted(),
            scanned:        self.counters.scanned.load(Ordering::Relaxed),
            elapsed:        start.elapsed(),
            truncated:      self.matches.is_full(),
            cancelled:      self.cancel.is_cancelled(),
            unreadable:     self.counters.unreadable.load(Ordering::Relaxed),
            overflow_walks: self.counters.overflow_walks.load(Ordering::Relaxed),
            dirs_listed:    self.counters.dirs_listed.load(Ordering::Relaxed),
        }
    }
}

/// Start the pool; on failure the already running workers are stopped
fn spawn_workers(shared: &Arc<Shared>, count: usize) -> Result<Vec<JoinHandle<()>>> {
    let mut handles = Vec::with_capacity(count);
    for id in 0..count {
        let worker = Arc::clone(shared);
        let spawned = thread::Builder::new()
            .name(format!("quickseek-worker-{id}"))
            .spawn(move || worker.work());
        match spawned {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                shared.queue.close();
                join_workers(handles);
                return Err(Error::Spawn(e));
            },
        }
    }
    Ok(handles)
}

/// Join the pool, re-raising the first worker panic on this thread
fn join_workers(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(panic) = handle.join() {
            std::panic::resume_unwind(panic);
        }
    }
}
