//! Integration tests for the parallel search engine
//!
//! Fixtures are built under a fresh temporary directory. The temporary root
//! itself may have a hidden name, so properties about path segments are
//! checked on paths relative to the root.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use quickseek::classify::is_system_dir;
use quickseek::types::MAX_RESULTS;
use quickseek::{Error, Search, SearchMode, search};
use tempfile::TempDir;

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    File::create(path).unwrap();
}

fn mkdir(root: &Path, rel: &str) {
    fs::create_dir_all(root.join(rel)).unwrap();
}

/// A few hundred entries with matching names scattered across levels,
/// including inside directories that are pruned by default.
fn fixture() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    for i in 0..12 {
        for j in 0..4 {
            touch(root, &format!("proj_{i}/mod_{j}/alpha_{i}_{j}.rs"));
            touch(root, &format!("proj_{i}/mod_{j}/beta_{i}_{j}.txt"));
            mkdir(root, &format!("proj_{i}/mod_{j}/Alpha_dir_{j}"));
        }
        touch(root, &format!("proj_{i}/node_modules/alpha_dep/index.js"));
        touch(root, &format!("proj_{i}/.hidden/alpha_secret"));
        touch(root, &format!("proj_{i}/Target_ALPHA.md"));
    }
    touch(root, "vendor/alpha_vendored.c");
    touch(root, ".git/alpha_object");
    temp_dir
}

fn relative(root: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().map(|p| p.strip_prefix(root).unwrap().to_path_buf()).collect()
}

/// Sequential reference walk applying the same pruning rules
fn expected(root: &Path, needle: &str, mode: SearchMode, skip: bool) -> BTreeSet<PathBuf> {
    fn walk(dir: &Path, needle: &str, mode: SearchMode, skip: bool, out: &mut BTreeSet<PathBuf>) {
        for entry in fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            let is_dir = entry.file_type().unwrap().is_dir();
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if is_dir && skip && is_system_dir(&name) {
                continue;
            }
            if is_dir {
                walk(&entry.path(), needle, mode, skip, out);
            }
            if name.contains(needle) && mode.accepts(is_dir) {
                out.insert(entry.path());
            }
        }
    }
    let mut out = BTreeSet::new();
    walk(root, &needle.to_lowercase(), mode, skip, &mut out);
    out
}

#[test]
fn test_reference_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    touch(root, "abc/report.txt");
    touch(root, ".git/config");
    touch(root, "node_modules/pkg/index.js");
    mkdir(root, "ABC123");

    let outcome = search(root, "abc", SearchMode::Both, true).unwrap();

    assert_eq!(outcome.matches, [root.join("ABC123"), root.join("abc")]);
    assert!(!outcome.truncated);
    assert!(!outcome.cancelled);
}

#[test]
fn test_idempotent() {
    let temp_dir = fixture();
    let first = search(temp_dir.path(), "alpha", SearchMode::Both, true).unwrap();
    for _ in 0..5 {
        let again = search(temp_dir.path(), "alpha", SearchMode::Both, true).unwrap();
        assert_eq!(again.matches, first.matches);
        assert_eq!(again.scanned, first.scanned);
    }
}

#[test]
fn test_sorted_without_duplicates() {
    let temp_dir = fixture();
    let outcome = search(temp_dir.path(), "a", SearchMode::Both, false).unwrap();
    assert!(outcome.matches.windows(2).all(|w| w[0].as_os_str() < w[1].as_os_str()));
}

#[test]
fn test_mode_partitioning() {
    let temp_dir = fixture();
    let root = temp_dir.path();

    let files = search(root, "alpha", SearchMode::Files, true).unwrap();
    let folders = search(root, "alpha", SearchMode::Folders, true).unwrap();
    let both = search(root, "alpha", SearchMode::Both, true).unwrap();

    assert!(!files.is_empty());
    assert!(!folders.is_empty());
    assert!(files.matches.iter().all(|p| !p.is_dir()));
    assert!(folders.matches.iter().all(|p| p.is_dir()));

    let union: BTreeSet<_> = files.matches.iter().chain(&folders.matches).cloned().collect();
    let both: BTreeSet<_> = both.matches.into_iter().collect();
    assert_eq!(union, both);
}

#[test]
fn test_skip_set_enforced() {
    let temp_dir = fixture();
    let root = temp_dir.path();

    let outcome = search(root, "alpha", SearchMode::Both, true).unwrap();

    for path in relative(root, &outcome.matches) {
        for segment in path.iter() {
            let segment = segment.to_string_lossy().to_lowercase();
            assert!(!is_system_dir(&segment), "{} passed through a pruned dir", path.display());
        }
    }
}

#[test]
fn test_skip_disabled_reaches_pruned_dirs() {
    let temp_dir = fixture();
    let root = temp_dir.path();

    let outcome = search(root, "alpha", SearchMode::Files, false).unwrap();
    let matches = relative(root, &outcome.matches);

    assert!(matches.contains(&PathBuf::from(".git/alpha_object")));
    assert!(matches.contains(&PathBuf::from("vendor/alpha_vendored.c")));
    assert!(matches.contains(&PathBuf::from("proj_3/.hidden/alpha_secret")));
}

#[test]
fn test_no_false_negatives() {
    let temp_dir = fixture();
    let root = temp_dir.path();

    for (needle, mode, skip) in [
        ("alpha", SearchMode::Both, true),
        ("ALPHA", SearchMode::Files, false),
        ("mod_", SearchMode::Folders, true),
        ("_1", SearchMode::Both, false),
    ] {
        let outcome = search(root, needle, mode, skip).unwrap();
        let found: BTreeSet<_> = outcome.matches.into_iter().collect();
        assert_eq!(found, expected(root, needle, mode, skip), "needle {needle:?} mode {mode}");
    }
}

#[test]
fn test_cap_boundary() {
    const EXTRA: usize = 25;

    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    for i in 0..MAX_RESULTS + EXTRA {
        touch(root, &format!("bucket_{}/hit_{i}", i % 8));
    }

    let outcome = search(root, "hit", SearchMode::Files, true).unwrap();

    assert_eq!(outcome.len(), MAX_RESULTS);
    assert!(outcome.truncated);
}

#[test]
fn test_custom_cap_under_small_queue() {
    let temp_dir = fixture();
    let outcome = Search::new(temp_dir.path(), "alpha")
        .workers(4)
        .queue_capacity(1)
        .max_results(10)
        .run()
        .unwrap();

    assert_eq!(outcome.len(), 10);
    assert!(outcome.truncated);
}

#[test]
fn test_worker_counts_agree() {
    let temp_dir = fixture();
    let root = temp_dir.path();
    let reference = search(root, "alpha", SearchMode::Both, true).unwrap();

    for workers in [1, 2, 3, 5, 8, 16, 32, 64] {
        for capacity in [1, 2, 4096] {
            let outcome =
                Search::new(root, "alpha").workers(workers).queue_capacity(capacity).run().unwrap();
            assert_eq!(outcome.matches, reference.matches, "{workers} workers, capacity {capacity}");
            assert_eq!(outcome.scanned, reference.scanned);
        }
    }
}

#[test]
fn test_unreadable_root() {
    let temp_dir = TempDir::new().unwrap();
    let result = search(temp_dir.path().join("missing"), "x", SearchMode::Both, true);
    assert!(matches!(result, Err(Error::RootUnreadable { .. })));
}

#[cfg(unix)]
#[test]
fn test_unreadable_subtree_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    touch(root, "open/match_open");
    touch(root, "locked/match_locked");
    let locked = root.join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let outcome = search(root, "match", SearchMode::Files, true);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let outcome = outcome.unwrap();

    assert!(outcome.matches.contains(&root.join("open/match_open")));
    // Privileged users can still read the locked directory.
    if !outcome.matches.contains(&root.join("locked/match_locked")) {
        assert_eq!(outcome.unreadable, 1);
    }
}

#[test]
fn test_sorted_as_plain_strings() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    touch(root, "a/hit");
    touch(root, "a-hit");

    let outcome = search(root, "hit", SearchMode::Files, true).unwrap();

    // '-' sorts before '/', so the sibling file comes first.
    assert_eq!(outcome.matches, [root.join("a-hit"), root.join("a/hit")]);
}
