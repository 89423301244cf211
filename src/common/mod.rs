//! Commonly used code.

use byte_unit::{Byte, UnitType};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;

pub mod io;

/// Commonly used command line arguments.
#[derive(Parser, Debug, Default)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Args {
    /// Whether progress display should be suppressed.
    pub fn is_silent(&self) -> bool {
        self.verbose.log_level() < Some(log::Level::Info)
    }
}

/// Progress bar style for line-oriented input files of unknown length.
pub static PROGRESS_STYLE: Lazy<ProgressStyle> = Lazy::new(|| {
    ProgressStyle::with_template("[{elapsed_precise}] {spinner} {human_pos} lines ({per_sec})")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
});

/// Construct a progress bar for reading lines, hidden if `is_silent`.
pub fn line_progress(is_silent: bool) -> ProgressBar {
    let pb = if is_silent {
        ProgressBar::hidden()
    } else {
        ProgressBar::no_length()
    };
    pb.set_style(PROGRESS_STYLE.clone());
    pb
}

/// Helper to print the current memory resident set size via `tracing`.
pub fn trace_rss_now() {
    let rss = procfs::process::Process::myself()
        .and_then(|me| me.stat())
        .map(|stat| stat.rss * procfs::page_size());
    match rss.map(|rss| Byte::from_u128(rss as u128)) {
        Ok(Some(bytes)) => tracing::debug!(
            "RSS now: {}",
            bytes.get_appropriate_unit(UnitType::Binary)
        ),
        _ => tracing::debug!("RSS now: <unavailable>"),
    }
}

/// The version of `tinx` package.
#[cfg(not(test))]
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// This allows us to override the version to `0.0.0` in tests.
pub fn version() -> &'static str {
    #[cfg(test)]
    return "0.0.0";
    #[cfg(not(test))]
    return VERSION;
}

#[cfg(test)]
mod test {
    use clap_verbosity_flag::Verbosity;

    #[rstest::rstest]
    #[case(0, 0, false)]
    #[case(0, 1, true)]
    #[case(1, 0, false)]
    fn is_silent(#[case] verbose: u8, #[case] quiet: u8, #[case] expected: bool) {
        let args = super::Args {
            verbose: Verbosity::new(verbose, quiet),
        };

        assert_eq!(args.is_silent(), expected);
    }

    #[test]
    fn version_in_tests() {
        assert_eq!(super::version(), "0.0.0");
    }
}
