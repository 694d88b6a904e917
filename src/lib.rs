//! `QuickSeek` - Parallel recursive file and folder name search.
//!
//! ```no_run
//! use quickseek::{Search, SearchMode};
//!
//! let outcome = Search::new("/home", "report").mode(SearchMode::Files).run()?;
//! for path in &outcome.matches {
//!     println!("{}", path.display());
//! }
//! # Ok::<(), quickseek::Error>(())
//! ```

#![deny(
    missing_debug_implementations,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]

pub mod aggregate;
pub mod allocator;
pub mod cancel;
pub mod classify;
pub mod engine;
pub mod error;
pub mod queue;
pub mod types;

pub use cancel::CancelToken;
pub use engine::{Search, SearchOptions, search};
pub use error::{Error, Result};
pub use types::{MatchTarget, SearchMode, SearchOutcome};
