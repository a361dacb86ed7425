//! Shared HTTP client and the page fetcher.
//!
//! [`HttpClient`] is created once by the process root and handed by
//! reference to every pipeline. It wraps a pooled `reqwest::Client`, so
//! cloning is cheap and concurrent use from many tasks is safe.
//!
//! Automatic decompression is off in reqwest: bodies reach
//! [`FetchResult::into_decoder`] exactly as the server sent them.
//!
//! Redirects are followed here rather than by reqwest, so every hop gets a
//! fresh header set whose `Host` matches that hop's URL.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{
    CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HOST, LOCATION, TRANSFER_ENCODING,
};
use reqwest::{Client, StatusCode, redirect};
use tracing::{debug, instrument, warn};
use url::Url;

use super::body::BodyDecoder;
use super::headers::BrowserHeaders;
use crate::{PageTarget, ScrapeError};

/// Default connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default whole-request timeout (5 minutes).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Redirect hops followed before the last 3xx response is returned as-is.
pub const MAX_REDIRECTS: usize = 10;

/// HTTP client shared by all page pipelines.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    headers: Arc<BrowserHeaders>,
}

impl HttpClient {
    /// Creates a client with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Client`] if the TLS backend cannot initialise.
    pub fn new() -> Result<Self, ScrapeError> {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a client with explicit timeouts in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Client`] if the TLS backend cannot initialise.
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .redirect(redirect::Policy::none())
            .build()
            .map_err(ScrapeError::Client)?;
        Ok(Self {
            client,
            headers: Arc::new(BrowserHeaders::default()),
        })
    }

    /// Fetches a page document.
    ///
    /// A non-200 status is returned as-is; only a missing response is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Transport`] when no response is received.
    #[instrument(skip(self, target), fields(oid = %target.oid()))]
    pub async fn fetch_page(&self, target: &PageTarget) -> Result<FetchResult, ScrapeError> {
        debug!(url = %target.url(), "loading page");
        self.get(target.url(), None).await
    }

    /// Issues a GET with the browser header set and an optional `Referer`.
    ///
    /// Redirects are followed up to [`MAX_REDIRECTS`] hops. The returned
    /// [`FetchResult::url`] is the URL that produced the final response.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Transport`] when no response is received and
    /// [`ScrapeError::InvalidConfig`] when a URL has no host.
    pub async fn get(&self, url: &Url, referer: Option<&Url>) -> Result<FetchResult, ScrapeError> {
        let mut current = url.clone();
        let mut hops = 0;
        loop {
            let response = self.send_once(&current, referer).await?;

            if let Some(next) = redirect_target(&current, &response) {
                if hops < MAX_REDIRECTS {
                    debug!(
                        from = %current,
                        to = %next,
                        status = response.status().as_u16(),
                        "following redirect"
                    );
                    hops += 1;
                    current = next;
                    continue;
                }
                warn!(url = %url, hops, "too many redirects");
            }
            return Ok(FetchResult {
                url: current,
                response,
            });
        }
    }

    async fn send_once(
        &self,
        url: &Url,
        referer: Option<&Url>,
    ) -> Result<reqwest::Response, ScrapeError> {
        let headers = self.headers.for_request(url, referer)?;
        log_request(url, &headers);

        let response = self
            .client
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| ScrapeError::transport(url.as_str(), e))?;

        log_response(&response);
        Ok(response)
    }
}

/// Resolves the `Location` of a redirect response against `current`.
fn redirect_target(current: &Url, response: &reqwest::Response) -> Option<Url> {
    let status = response.status();
    if !matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    ) {
        return None;
    }
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    match current.join(location) {
        Ok(next) => Some(next),
        Err(e) => {
            debug!(url = %current, location, error = %e, "unusable redirect location");
            None
        }
    }
}

/// A response whose body has not been read yet.
///
/// Dropping it without calling [`into_decoder`](Self::into_decoder)
/// releases the connection without reading the body.
#[derive(Debug)]
pub struct FetchResult {
    url: Url,
    response: reqwest::Response,
}

impl FetchResult {
    /// The URL that produced this response (after redirects).
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    /// Returns a response header as text, if present and valid.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.response.headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// The `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    /// Reads the body and wraps it in a [`BodyDecoder`].
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Transport`] if the body cannot be read and
    /// [`ScrapeError::Decode`] if a gzip body has a bad header.
    pub async fn into_decoder(self) -> Result<BodyDecoder, ScrapeError> {
        let encoding = self.header(CONTENT_ENCODING.as_str()).map(str::to_string);
        let url = self.url;
        let raw = self
            .response
            .bytes()
            .await
            .map_err(|e| ScrapeError::transport(url.as_str(), e))?;
        BodyDecoder::new(encoding.as_deref(), Vec::from(raw), url.as_str())
    }
}

fn log_request(url: &Url, headers: &reqwest::header::HeaderMap) {
    debug!(method = "GET", url = %url, "request");
    if let Some(host) = headers.get(HOST).and_then(|v| v.to_str().ok()) {
        debug!(host, "request host");
    }
    for (name, value) in headers {
        debug!(header = %name, value = ?value, "request header");
    }
}

fn log_response(response: &reqwest::Response) {
    let headers = response.headers();
    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    let transfer_encoding = headers
        .get(TRANSFER_ENCODING)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");
    debug!(
        url = %response.url(),
        status = response.status().as_u16(),
        content_length,
        transfer_encoding,
        "response"
    );
    for (name, value) in headers {
        debug!(header = %name, value = ?value, "response header");
    }
}
