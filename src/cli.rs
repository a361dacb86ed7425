//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use guide_scraper::{
    DEFAULT_BASE_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_OUTPUT_DIR, RetryPolicy, ScrapeConfig,
    ScrapeError,
};

/// Default diagnostic log file.
pub const DEFAULT_LOG_FILE: &str = "guide-scraper.log";

/// Archive slideshow images from travel-guide location pages.
///
/// Each location page is fetched concurrently; every image in its
/// slideshow is saved as a JPEG named after the location and its position.
#[derive(Parser, Debug)]
#[command(name = "guide-scraper")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory images are written to
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Site root that locations are resolved against
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Location page to scrape, e.g. "scotland/edinburgh" (repeatable; replaces the built-in list)
    #[arg(short = 'l', long = "location")]
    pub locations: Vec<String>,

    /// Attempts per image when the server answers with a retryable status (1-10)
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_retries: u32,

    /// Seconds to wait between image attempts
    #[arg(long, default_value_t = 10)]
    pub retry_delay_secs: u64,

    /// Extra HTTP status treated as retryable for images, e.g. 503 (repeatable)
    #[arg(long = "retry-status", value_parser = clap::value_parser!(u16).range(100..=599))]
    pub retry_statuses: Vec<u16>,

    /// Upper bound on pages processed at once (default: all at once)
    #[arg(long)]
    pub max_concurrent_pages: Option<usize>,

    /// Let remaining pages finish after a page fails
    #[arg(long)]
    pub keep_going: bool,

    /// Diagnostic log file (request and response tracing at debug level)
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,
}

impl Args {
    /// Builds the run configuration from the parsed arguments.
    pub fn to_config(&self) -> Result<ScrapeConfig, ScrapeError> {
        let mut config = ScrapeConfig::default();
        config.set_base_url(&self.base_url)?;
        if !self.locations.is_empty() {
            config.locations.clone_from(&self.locations);
        }
        config.output_dir.clone_from(&self.output_dir);
        config.retry = RetryPolicy::new(self.max_retries, Duration::from_secs(self.retry_delay_secs))
            .with_retry_statuses(self.retry_statuses.iter().copied());
        config.max_concurrent_pages = self.max_concurrent_pages;
        config.fail_fast = !self.keep_going;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["guide-scraper"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.output_dir, PathBuf::from("data"));
        assert_eq!(args.base_url, DEFAULT_BASE_URL);
        assert!(args.locations.is_empty());
        assert_eq!(args.max_retries, 5);
        assert_eq!(args.retry_delay_secs, 10);
        assert!(args.retry_statuses.is_empty());
        assert!(args.max_concurrent_pages.is_none());
        assert!(!args.keep_going);
        assert_eq!(args.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["guide-scraper", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["guide-scraper", "--verbose", "--verbose"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["guide-scraper", "-q"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["guide-scraper", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["guide-scraper", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_location_is_repeatable() {
        let args =
            Args::try_parse_from(["guide-scraper", "-l", "wales", "--location", "scotland/edinburgh"])
                .unwrap();
        assert_eq!(args.locations, vec!["wales", "scotland/edinburgh"]);
    }

    #[test]
    fn test_cli_max_retries_range() {
        let args = Args::try_parse_from(["guide-scraper", "--max-retries", "10"]).unwrap();
        assert_eq!(args.max_retries, 10);

        let err = Args::try_parse_from(["guide-scraper", "--max-retries", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let err = Args::try_parse_from(["guide-scraper", "--max-retries", "11"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_retry_status_rejects_non_http_codes() {
        let err = Args::try_parse_from(["guide-scraper", "--retry-status", "42"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_to_config_defaults_match_library() {
        let args = Args::try_parse_from(["guide-scraper"]).unwrap();
        let config = args.to_config().unwrap();
        let defaults = ScrapeConfig::default();
        assert_eq!(config.base_url, defaults.base_url);
        assert_eq!(config.locations, defaults.locations);
        assert_eq!(config.retry, defaults.retry);
        assert!(config.fail_fast);
    }

    #[test]
    fn test_to_config_applies_overrides() {
        let args = Args::try_parse_from([
            "guide-scraper",
            "--base-url",
            "http://127.0.0.1:9000/guides",
            "-l",
            "wales",
            "-o",
            "/tmp/out",
            "--max-retries",
            "2",
            "--retry-delay-secs",
            "1",
            "--retry-status",
            "503",
            "--max-concurrent-pages",
            "3",
            "--keep-going",
        ])
        .unwrap();
        let config = args.to_config().unwrap();

        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:9000/guides/");
        assert_eq!(config.locations, vec!["wales"]);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.retry.max_attempts(), 2);
        assert_eq!(config.retry.delay(), Duration::from_secs(1));
        assert_eq!(config.retry.retry_statuses(), &[504, 503]);
        assert_eq!(config.max_concurrent_pages, Some(3));
        assert!(!config.fail_fast);
    }

    #[test]
    fn test_to_config_rejects_bad_base_url() {
        let args = Args::try_parse_from(["guide-scraper", "--base-url", "nope"]).unwrap();
        assert!(args.to_config().is_err());
    }
}
