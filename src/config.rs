//! Run configuration and the built-in location list.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::warn;
use url::Url;

use crate::download::{RetryPolicy, page_stem};
use crate::fetch::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::{PageTarget, ScrapeError};

/// Site the built-in locations belong to.
pub const DEFAULT_BASE_URL: &str = "https://www.lonelyplanet.com/";

/// Directory images are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// Pages scraped when no locations are given.
pub const DEFAULT_LOCATIONS: &[&str] = &[
    "england/london",
    "england",
    "scotland",
    "wales",
    "great-britain",
    "the-united-kingdom",
    "scotland/edinburgh",
];

/// Everything a scrape run needs.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Site root that locations are resolved against.
    pub base_url: Url,
    /// Page paths relative to `base_url`, in launch order.
    pub locations: Vec<String>,
    /// Where images are written.
    pub output_dir: PathBuf,
    /// Image retry behaviour.
    pub retry: RetryPolicy,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP whole-request timeout in seconds.
    pub read_timeout_secs: u64,
    /// Upper bound on concurrently running pages; `None` runs all at once.
    pub max_concurrent_pages: Option<usize>,
    /// Stop the run at the first page-level failure.
    pub fail_fast: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            locations: DEFAULT_LOCATIONS.iter().map(ToString::to_string).collect(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            retry: RetryPolicy::default(),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            max_concurrent_pages: None,
            fail_fast: true,
        }
    }
}

#[allow(clippy::expect_used)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")
}

impl ScrapeConfig {
    /// Sets the base URL, adding a trailing slash so locations join under it.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::MalformedUrl`] if `base` does not parse.
    pub fn set_base_url(&mut self, base: &str) -> Result<(), ScrapeError> {
        let mut url = Url::parse(base).map_err(|e| ScrapeError::malformed_url(base, e))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.base_url = url;
        Ok(())
    }

    /// Checks the configuration before any request is made.
    ///
    /// Two locations that map to the same file name stem are allowed but
    /// logged, since their images would overwrite each other.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidConfig`] for an empty location list, a
    /// base URL that cannot have paths joined onto it, or a zero page limit.
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.locations.is_empty() {
            return Err(ScrapeError::InvalidConfig("no locations to scrape".into()));
        }
        if self.base_url.cannot_be_a_base() {
            return Err(ScrapeError::InvalidConfig(format!(
                "base URL cannot be a base: {}",
                self.base_url
            )));
        }
        if self.max_concurrent_pages == Some(0) {
            return Err(ScrapeError::InvalidConfig(
                "max concurrent pages must be at least 1".into(),
            ));
        }

        let mut stems: HashMap<String, &str> = HashMap::new();
        for location in &self.locations {
            let stem = page_stem(location);
            if let Some(previous) = stems.insert(stem.clone(), location.as_str())
                && previous != location.as_str()
            {
                warn!(
                    first = previous,
                    second = %location,
                    stem = %stem,
                    "locations share an output file name stem"
                );
            }
        }
        Ok(())
    }

    /// Creates the output directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Write`] if the directory cannot be created.
    pub fn prepare_output_dir(&self) -> Result<(), ScrapeError> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| ScrapeError::write(&self.output_dir, e))
    }

    /// Resolves every location into a [`PageTarget`].
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::MalformedUrl`] for the first location that
    /// cannot be joined onto the base URL.
    pub fn targets(&self) -> Result<Vec<PageTarget>, ScrapeError> {
        self.locations
            .iter()
            .map(|location| PageTarget::new(&self.base_url, location))
            .collect()
    }
}
