//! Common types and constants for `QuickSeek`

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum number of matches returned by one search
pub const MAX_RESULTS: usize = 10_000;

/// Default number of worker threads
pub const DEFAULT_WORKERS: usize = 16;

/// Default capacity of the pending-directory queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// Which entry kinds are eligible to match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SearchMode {
    /// Files and folders
    #[default]
    Both,
    /// Anything that is not a directory
    Files,
    /// Directories only
    Folders,
}

impl SearchMode {
    /// Whether an entry of the given kind may match in this mode
    #[must_use]
    pub const fn accepts(self, is_dir: bool) -> bool {
        match self {
            Self::Both => true,
            Self::Files => !is_dir,
            Self::Folders => is_dir,
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Both => "Both",
            Self::Files => "Files",
            Self::Folders => "Folders",
        })
    }
}

/// What the needle is compared against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchTarget {
    /// Entry name only
    #[default]
    Name,
    /// Entry name or the full path of the entry
    FullPath,
}

/// The result of a finished (or cancelled) search
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Matching paths, sorted and deduplicated
    pub matches:        Vec<PathBuf>,
    /// Number of directory entries inspected
    pub scanned:        u64,
    /// Wall-clock time of the search
    pub elapsed:        Duration,
    /// Whether the match cap was reached
    pub truncated:      bool,
    /// Whether the search was stopped through its cancel token
    pub cancelled:      bool,
    /// Subdirectories that could not be listed and were skipped
    pub unreadable:     u64,
    /// Times a full queue forced an inline walk
    pub overflow_walks: u64,
    /// Directories successfully listed
    pub dirs_listed:    u64,
}

impl SearchOutcome {
    /// Number of matches
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether nothing matched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

const _: () = {
    assert!(MAX_RESULTS > 0);
    assert!(DEFAULT_WORKERS > 0);
    assert!(DEFAULT_QUEUE_CAPACITY > 0);
};
