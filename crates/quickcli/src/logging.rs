//! Verbosity flag and tracing subscriber setup.

use clap::{Arg, ArgAction};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

/// Destination key of the `-v/--verbose` counter.
pub const VERBOSITY_ARG: &str = "verbosity";

/// The `-v/--verbose` counted flag added to logged applications.
pub fn verbosity_arg() -> Arg {
    Arg::new(VERBOSITY_ARG)
        .short('v')
        .long("verbose")
        .action(ArgAction::Count)
        .help("Increase verbosity level [default: 0]")
}

/// Maps a `-v` count to a log level.
///
/// | count | level |
/// |-------|-------|
/// | 0-1 | WARN |
/// | 2 | INFO |
/// | 3+ | DEBUG |
pub fn level_for_verbosity(verbosity: i64) -> LevelFilter {
    if verbosity > 2 {
        LevelFilter::DEBUG
    } else if verbosity > 1 {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    }
}

/// Installs the global subscriber at `level`.
///
/// `RUST_LOG`, when set and valid, takes precedence over `level`. Returns
/// false if a subscriber was already installed.
pub fn init_logging(level: LevelFilter) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .compact()
        .try_init()
        .is_ok()
}
