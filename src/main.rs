#![deny(missing_debug_implementations, clippy::all, clippy::pedantic, clippy::nursery)]
//! `QuickSeek` - Parallel recursive file and folder name search.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use clap_cargo::style::CLAP_STYLING;
use quickseek::allocator::TrackingAllocator;
use quickseek::types::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS, MAX_RESULTS};
use quickseek::{CancelToken, MatchTarget, Result, Search, SearchMode, SearchOutcome};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static ALLOCATOR: TrackingAllocator = TrackingAllocator::new();

/// Environment variable overriding the log filter
const LOG_ENV: &str = "QUICKSEEK_LOG";

/// Exit status after Ctrl-C, as a shell would report it
const EXIT_INTERRUPTED: u8 = 130;

/// CLI arguments for `QuickSeek`
#[derive(Parser, Debug)]
#[command(author, version, about, styles = CLAP_STYLING)]
struct Cli {
    /// Text to look for in file and folder names, ignoring case
    query: String,

    /// Directory to search (defaults to the drive root)
    root: Option<PathBuf>,

    /// Which entries may match
    #[arg(short, long, value_enum, default_value_t = SearchMode::Both)]
    mode: SearchMode,

    /// Descend into system, dependency and hidden directories too
    #[arg(long)]
    no_skip: bool,

    /// Also match against the full path, not just the name
    #[arg(long)]
    full_path: bool,

    /// Number of worker threads
    #[arg(short = 'j', long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Directories queued before workers walk subtrees inline
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Stop after this many matches
    #[arg(long, default_value_t = MAX_RESULTS)]
    max_results: usize,

    /// Print only the number of matches
    #[arg(short, long)]
    count: bool,

    /// Log skipped directories and report search diagnostics
    #[arg(short, long)]
    verbose: bool,
}

/// Drive root used when no directory is given
fn default_root() -> PathBuf {
    if cfg!(windows) { PathBuf::from("C:\\") } else { PathBuf::from("/") }
}

/// Resolve the search root to an absolute path
fn resolve_root(root: Option<&Path>) -> Result<PathBuf> {
    match root {
        None => Ok(default_root()),
        Some(p) if p.as_os_str().is_empty() => Ok(default_root()),
        Some(p) if p.is_absolute() => Ok(p.to_path_buf()),
        Some(p) => Ok(std::env::current_dir()?.join(p)),
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("quickseek=debug,warn")
        } else {
            EnvFilter::new("quickseek=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Write matches to stdout, treating a closed pipe as the reader being done
fn print_matches(outcome: &SearchOutcome, count_only: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let written = if count_only {
        writeln!(out, "{}", outcome.len())
    } else {
        outcome.matches.iter().try_for_each(|path| writeln!(out, "{}", path.display()))
    };
    match written.and_then(|()| out.flush()) {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e.into()),
        _ => Ok(()),
    }
}

fn print_status(outcome: &SearchOutcome, max_results: usize, verbose: bool) {
    eprintln!(
        "Found {} matches in {:.2?} ({} entries scanned)",
        outcome.len(),
        outcome.elapsed,
        outcome.scanned
    );
    if outcome.truncated {
        eprintln!("Stopped at the {max_results} match limit; refine the query to see everything");
    }
    if outcome.cancelled {
        eprintln!("Search interrupted; results are partial");
    }
    if verbose {
        eprintln!("- Directories listed: {}", outcome.dirs_listed);
        eprintln!("- Unreadable directories skipped: {}", outcome.unreadable);
        eprintln!("- Inline walks on a full queue: {}", outcome.overflow_walks);
        eprintln!("- Peak memory usage: {} bytes", ALLOCATOR.peak());
    }
}

fn run(cli: &Cli) -> Result<SearchOutcome> {
    let root = resolve_root(cli.root.as_deref())?;

    let token = CancelToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    let target = if cli.full_path { MatchTarget::FullPath } else { MatchTarget::Name };

    ALLOCATOR.reset_peak();
    let outcome = Search::new(root, &cli.query)
        .mode(cli.mode)
        .skip_system_dirs(!cli.no_skip)
        .workers(cli.workers)
        .queue_capacity(cli.queue_capacity)
        .max_results(cli.max_results)
        .match_target(target)
        .cancel_token(token)
        .run()?;

    print_matches(&outcome, cli.count)?;
    print_status(&outcome, cli.max_results, cli.verbose);
    Ok(outcome)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(outcome) if outcome.cancelled => ExitCode::from(EXIT_INTERRUPTED),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        },
    }
}
