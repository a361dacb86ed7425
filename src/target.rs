//! Page targets: one travel-guide page per pipeline.

use std::fmt;

use url::Url;

use crate::ScrapeError;

/// One page to scrape, identified by its path relative to the site root.
///
/// The OID (the relative path, e.g. `england/london`) is used in log lines
/// and output file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    oid: String,
    url: Url,
}

impl PageTarget {
    /// Builds a target by resolving `location` against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::MalformedUrl`] if the joined URL cannot be parsed.
    pub fn new(base: &Url, location: &str) -> Result<Self, ScrapeError> {
        let oid = location.trim_matches('/').to_string();
        let url = base
            .join(&oid)
            .map_err(|e| ScrapeError::malformed_url(location, e))?;
        Ok(Self { oid, url })
    }

    /// The page identifier.
    #[must_use]
    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// The absolute page URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for PageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.oid)
    }
}
