//! Per-entry pruning and matching decisions

use std::ffi::OsStr;
use std::path::Path;

use crate::types::{MatchTarget, SearchMode};

/// Lowercased directory names pruned when system directories are skipped
pub const SKIP_DIRS: &[&str] = &[
    "$recycle.bin",
    "system volume information",
    "windows",
    "program files",
    "program files (x86)",
    "programdata",
    ".git",
    "node_modules",
    ".cache",
    ".tmp",
    "__pycache__",
    ".vs",
    ".idea",
    ".gradle",
    "vendor",
    "dist",
    "obj",
    "bin",
];

/// Whether a lowercased directory name is a system or hidden directory
#[must_use]
pub fn is_system_dir(name_lower: &str) -> bool {
    name_lower.starts_with('.') || SKIP_DIRS.contains(&name_lower)
}

/// Decision for a single directory entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verdict {
    /// Directory must be neither matched nor descended into
    pub prune:    bool,
    /// Entry belongs in the results
    pub is_match: bool,
}

/// Pure classification rules shared by the worker pool and the inline walker
#[derive(Debug, Clone)]
pub struct Classifier {
    needle:           String,
    mode:             SearchMode,
    skip_system_dirs: bool,
    target:           MatchTarget,
}

impl Classifier {
    /// Create a classifier; the needle is case-folded here
    #[must_use]
    pub fn new(needle: &str, mode: SearchMode, skip_system_dirs: bool, target: MatchTarget) -> Self {
        Self { needle: needle.to_lowercase(), mode, skip_system_dirs, target }
    }

    /// The case-folded needle
    #[must_use]
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Classify one entry of a directory listing
    #[must_use]
    pub fn classify(&self, name: &OsStr, path: &Path, is_dir: bool) -> Verdict {
        let name_lower = name.to_string_lossy().to_lowercase();

        if is_dir && self.skip_system_dirs && is_system_dir(&name_lower) {
            return Verdict { prune: true, is_match: false };
        }

        let is_match = self.mode.accepts(is_dir) && self.contains_needle(&name_lower, path);
        Verdict { prune: false, is_match }
    }

    fn contains_needle(&self, name_lower: &str, path: &Path) -> bool {
        if name_lower.contains(&self.needle) {
            return true;
        }
        match self.target {
            MatchTarget::Name => false,
            MatchTarget::FullPath => {
                path.to_string_lossy().to_lowercase().contains(&self.needle)
            },
        }
    }
}
