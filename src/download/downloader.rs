//! Image downloader: fetch with retry, validate, re-encode as JPEG.
//!
//! Each image is requested with the page URL as `Referer`. A 504 response
//! is retried after a fixed pause (see [`RetryPolicy`]); any other non-200
//! status or a transport failure ends the image immediately. A successful
//! body must be `image/jpeg`; it is decoded and written back out at quality
//! 100 under a name derived from the page OID and the image index.
//!
//! Image failures are logged and returned as [`DownloadOutcome::Failed`];
//! they never abort the page.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::filename::output_path;
use super::retry::{RetryDecision, RetryPolicy, StatusClass};
use crate::ScrapeError;
use crate::fetch::{BodyDecoder, FetchResult, HttpClient};
use crate::parser::ImageRecord;

/// Quality used when re-encoding.
pub const JPEG_QUALITY: u8 = 100;

/// Only content type accepted for images.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Result of downloading one image.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The image was written to `path`.
    Saved {
        /// Destination file.
        path: PathBuf,
    },
    /// The image could not be saved; no file was left at `path`.
    Failed {
        /// Destination the image would have been written to.
        path: PathBuf,
        /// Why it failed.
        error: ScrapeError,
    },
}

impl DownloadOutcome {
    /// Whether the image was saved.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    /// The destination path (written or intended).
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Saved { path } | Self::Failed { path, .. } => path,
        }
    }

    /// The failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ScrapeError> {
        match self {
            Self::Saved { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

/// Per-page image counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageStats {
    /// Images written.
    pub saved: usize,
    /// Images that failed.
    pub failed: usize,
}

/// Downloads images into an output directory.
///
/// Clones share one write tracker: every re-encode holds a read guard on it
/// until its blocking task ends, so [`wait_for_writes`](Self::wait_for_writes)
/// also covers writes whose async caller was aborted.
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    client: HttpClient,
    policy: RetryPolicy,
    output_dir: PathBuf,
    writes: Arc<RwLock<()>>,
}

impl ImageDownloader {
    /// Creates a downloader writing into `output_dir`.
    #[must_use]
    pub fn new(client: HttpClient, policy: RetryPolicy, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            policy,
            output_dir: output_dir.into(),
            writes: Arc::new(RwLock::new(())),
        }
    }

    /// Waits until every in-flight re-encode has finished writing.
    pub async fn wait_for_writes(&self) {
        let _idle = self.writes.write().await;
    }

    /// Downloads every image of a page in order.
    pub async fn download_all(
        &self,
        oid: &str,
        referer: &Url,
        images: &[ImageRecord],
    ) -> ImageStats {
        debug!(oid, count = images.len(), "downloading images");
        let mut stats = ImageStats::default();
        for (index, image) in images.iter().enumerate() {
            match self.download(image, oid, referer, index).await {
                DownloadOutcome::Saved { path } => {
                    info!(url = %image.url(), path = %path.display(), "downloaded image");
                    stats.saved += 1;
                }
                DownloadOutcome::Failed { path, error } => {
                    warn!(
                        url = %image.url(),
                        path = %path.display(),
                        error = %error,
                        "failed to download image"
                    );
                    stats.failed += 1;
                }
            }
        }
        stats
    }

    /// Downloads one image as item `index` of page `oid`.
    #[instrument(skip(self, image, referer), fields(url = %image.url()))]
    pub async fn download(
        &self,
        image: &ImageRecord,
        oid: &str,
        referer: &Url,
        index: usize,
    ) -> DownloadOutcome {
        let path = output_path(&self.output_dir, oid, index);
        debug!(caption = image.caption(), path = %path.display(), "downloading image");
        match self.download_to(image, referer, &path).await {
            Ok(()) => DownloadOutcome::Saved { path },
            Err(error) => DownloadOutcome::Failed { path, error },
        }
    }

    async fn download_to(
        &self,
        image: &ImageRecord,
        referer: &Url,
        path: &Path,
    ) -> Result<(), ScrapeError> {
        let response = self.fetch_with_retry(image.url(), referer).await?;

        let content_type = response.content_type().unwrap_or_default().to_string();
        if !is_jpeg(&content_type) {
            debug!(content_type = %content_type, "no JPEG returned");
            return Err(ScrapeError::unsupported_content_type(
                image.url().as_str(),
                content_type,
            ));
        }

        let decoder = response.into_decoder().await?;
        let url = image.url().to_string();
        let dest = path.to_path_buf();
        let in_flight = Arc::clone(&self.writes).read_owned().await;
        tokio::task::spawn_blocking(move || {
            let _in_flight = in_flight;
            reencode_to_file(decoder, &url, &dest)
        })
            .await
            .map_err(|e| ScrapeError::write(path, std::io::Error::other(e.to_string())))?
    }

    /// Requests `url` until it returns 200, a fatal status, or attempts run out.
    ///
    /// Only a fresh 200 response is ever returned; running out of attempts is
    /// always [`ScrapeError::RetryExhausted`].
    async fn fetch_with_retry(
        &self,
        url: &Url,
        referer: &Url,
    ) -> Result<FetchResult, ScrapeError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(attempt, "requesting image");

            let response = match self.client.get(url, Some(referer)).await {
                Ok(response) => response,
                Err(e) => {
                    debug!(attempt, error = %e, "no response for image");
                    return Err(e);
                }
            };

            let status = response.status();
            match self.policy.classify(status) {
                StatusClass::Success => return Ok(response),
                StatusClass::Fatal => {
                    debug!(status, "bad response for image");
                    return Err(ScrapeError::bad_status(url.as_str(), status));
                }
                StatusClass::Retryable => {
                    drop(response);
                    match self.policy.should_retry(status, attempt) {
                        RetryDecision::Retry { delay, attempt: next } => {
                            debug!(
                                status,
                                attempt,
                                next_attempt = next,
                                delay_ms = delay.as_millis(),
                                "server timeout, retrying"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            debug!(status, attempt, %reason, "not retrying image");
                            return Err(ScrapeError::retry_exhausted(url.as_str(), attempt));
                        }
                    }
                }
            }
        }
    }
}

/// Whether a `Content-Type` value denotes JPEG (parameters ignored).
#[must_use]
pub fn is_jpeg(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(JPEG_CONTENT_TYPE))
}

/// Decodes a JPEG body and writes it to `path` at [`JPEG_QUALITY`].
///
/// The image is fully encoded in memory before the file is created; a
/// failed write removes whatever was created.
fn reencode_to_file(decoder: BodyDecoder, url: &str, path: &Path) -> Result<(), ScrapeError> {
    let bytes = decoder.read_all()?;
    let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg)
        .map_err(|e| ScrapeError::corrupt_image(url, e))?;

    let mut encoded = Vec::new();
    decoded
        .write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY))
        .map_err(|e| ScrapeError::corrupt_image(url, e))?;

    if let Err(e) = std::fs::write(path, &encoded) {
        debug!(path = %path.display(), "cleaning up partial file after error");
        let _ = std::fs::remove_file(path);
        return Err(ScrapeError::write(path, e));
    }
    Ok(())
}
