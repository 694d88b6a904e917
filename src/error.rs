//! Error types for `QuickSeek`

use std::path::PathBuf;

use arrayvec::ArrayString;
use thiserror::Error;

/// Maximum length of user-facing error messages
pub const MAX_ERROR_LENGTH: usize = 256;

/// Custom result type for `QuickSeek` operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for `QuickSeek`
///
/// Only the root listing can fail a search. Unreadable subdirectories are
/// counted in the outcome instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The search root could not be listed
    #[error("Error: cannot read {}: {}", .path.display(), .source)]
    RootUnreadable {
        /// The root that was requested
        path:   PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Search options out of range
    #[error("Error: invalid options: {0}")]
    InvalidOptions(&'static str),

    /// A worker thread could not be started
    #[error("Error: failed to spawn thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// IO operation failed
    #[error("Error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a root error from the failed listing
    pub fn root(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::RootUnreadable { path: path.into(), source }
    }

    /// Get a user-friendly error message with action items
    #[must_use]
    pub fn user_message(&self) -> ArrayString<MAX_ERROR_LENGTH> {
        let mut msg = ArrayString::new();
        let tip = match self {
            Self::RootUnreadable { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => "Tip: Check the search root for typos",
                std::io::ErrorKind::PermissionDenied => {
                    "Tip: Check directory permissions and try again"
                },
                _ => "Tip: The search root must be a readable directory",
            },
            Self::InvalidOptions(_) => "Tip: Workers, queue capacity and result cap must be > 0",
            Self::Spawn(_) => "Tip: Try again with fewer workers",
            Self::Io(_) => "Tip: Check file permissions and try again",
        };
        push_truncated(&mut msg, &self.to_string());
        push_truncated(&mut msg, "\n");
        push_truncated(&mut msg, tip);
        msg
    }
}

/// Append as much of `s` as fits, never splitting a character
fn push_truncated(buf: &mut ArrayString<MAX_ERROR_LENGTH>, s: &str) {
    for c in s.chars() {
        if buf.try_push(c).is_err() {
            break;
        }
    }
}
