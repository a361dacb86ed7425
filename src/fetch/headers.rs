//! Browser-like request headers shared by page and image requests.
//!
//! The template is built once and never mutated; every request gets its own
//! copy with `Host` (and, for images, `Referer`) added.

use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION, HOST, HeaderMap, HeaderValue, REFERER,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use url::Url;

use crate::ScrapeError;

/// Desktop Firefox User-Agent sent with every request.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.1; WOW64; rv:40.0) Gecko/20100101 Firefox/40.1";

const ACCEPT_VALUE: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8";
/// Only gzip is decoded; deflate and br responses pass through undecoded.
const ACCEPT_ENCODING_VALUE: &str = "gzip, deflate, br";
const ACCEPT_LANGUAGE_VALUE: &str = "en-UK,en-US;q=0.8,en;q=0.6";
const CONNECTION_VALUE: &str = "keep-alive";
const UPGRADE_INSECURE_REQUESTS_VALUE: &str = "1";

/// Immutable header template.
#[derive(Debug, Clone)]
pub struct BrowserHeaders {
    template: HeaderMap,
}

impl Default for BrowserHeaders {
    fn default() -> Self {
        let mut template = HeaderMap::new();
        template.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        template.insert(ACCEPT_ENCODING, HeaderValue::from_static(ACCEPT_ENCODING_VALUE));
        template.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        template.insert(CONNECTION, HeaderValue::from_static(CONNECTION_VALUE));
        template.insert(
            UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static(UPGRADE_INSECURE_REQUESTS_VALUE),
        );
        template.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        Self { template }
    }
}

impl BrowserHeaders {
    /// Returns the shared template without per-request headers.
    #[must_use]
    pub fn template(&self) -> &HeaderMap {
        &self.template
    }

    /// Builds the header set for a request to `url`.
    ///
    /// `Host` is set explicitly from the URL; `Referer` is added when given.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidConfig`] if the URL has no host or a
    /// header value contains invalid characters.
    pub fn for_request(&self, url: &Url, referer: Option<&Url>) -> Result<HeaderMap, ScrapeError> {
        let mut headers = self.template.clone();
        let host = host_header(url)
            .ok_or_else(|| ScrapeError::InvalidConfig(format!("URL has no host: {url}")))?;
        headers.insert(HOST, header_value(&host)?);
        if let Some(referer) = referer {
            headers.insert(REFERER, header_value(referer.as_str())?);
        }
        Ok(headers)
    }
}

/// `host[:port]` as it should appear in the `Host` header.
#[must_use]
pub fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn header_value(value: &str) -> Result<HeaderValue, ScrapeError> {
    HeaderValue::from_str(value)
        .map_err(|e| ScrapeError::InvalidConfig(format!("invalid header value {value:?}: {e}")))
}
