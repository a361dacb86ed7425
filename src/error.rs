//! Error types for the scrape pipeline.
//!
//! A single [`ScrapeError`] enum covers every failure the pipeline can hit.
//! Each variant carries the URL or path it relates to so log lines are
//! self-describing. [`ScrapeError::scope`] tells the orchestrator whether a
//! failure ends the page pipeline or only the current image.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching, parsing or downloading.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// No response was received (DNS, connection refused, TLS, timeout).
    #[error("transport error requesting {url}: {source}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status the pipeline cannot use.
    #[error("HTTP {status} from {url}")]
    BadStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// A body or embedded payload could not be decoded.
    #[error("decode error for {context}: {message}")]
    Decode {
        /// What was being decoded (usually a URL).
        context: String,
        /// Human-readable cause.
        message: String,
    },

    /// A URL string could not be parsed.
    #[error("malformed URL {url:?}: {source}")]
    MalformedUrl {
        /// The offending input.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// The image body is not a decodable JPEG.
    #[error("corrupt image at {url}: {source}")]
    CorruptImage {
        /// The image URL.
        url: String,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },

    /// The image response is not `image/jpeg`.
    #[error("unsupported content type {content_type:?} from {url}")]
    UnsupportedContentType {
        /// The image URL.
        url: String,
        /// The `Content-Type` header value (empty when missing).
        content_type: String,
    },

    /// Writing the output file failed.
    #[error("write error for {path}: {source}")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Every attempt ended in a retryable status.
    #[error("gave up on {url} after {attempts} attempts")]
    RetryExhausted {
        /// The image URL.
        url: String,
        /// Number of requests made.
        attempts: u32,
    },

    /// Configuration rejected before any request was made.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// How far a failure propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureScope {
    /// Ends the page pipeline (and, under fail-fast, the run).
    Page,
    /// Logged and absorbed; the pipeline moves on to the next image.
    Image,
}

impl ScrapeError {
    /// Creates a transport error.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Creates a bad-status error.
    pub fn bad_status(url: impl Into<String>, status: u16) -> Self {
        Self::BadStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a decode error.
    pub fn decode(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Creates a malformed-URL error.
    pub fn malformed_url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::MalformedUrl {
            url: url.into(),
            source,
        }
    }

    /// Creates a corrupt-image error.
    pub fn corrupt_image(url: impl Into<String>, source: image::ImageError) -> Self {
        Self::CorruptImage {
            url: url.into(),
            source,
        }
    }

    /// Creates an unsupported-content-type error.
    pub fn unsupported_content_type(
        url: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self::UnsupportedContentType {
            url: url.into(),
            content_type: content_type.into(),
        }
    }

    /// Creates a write error.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Creates a retry-exhausted error.
    pub fn retry_exhausted(url: impl Into<String>, attempts: u32) -> Self {
        Self::RetryExhausted {
            url: url.into(),
            attempts,
        }
    }

    /// Returns the HTTP status for [`ScrapeError::BadStatus`].
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classifies how far this error propagates.
    ///
    /// | Error | Scope |
    /// |-------|-------|
    /// | Transport, BadStatus, Decode, MalformedUrl | Page when raised by fetch/parse |
    /// | CorruptImage, UnsupportedContentType, Write, RetryExhausted | Image |
    /// | InvalidConfig, Client | Page |
    ///
    /// Transport and BadStatus also occur per image; the downloader never
    /// lets those escape, so only their page-level occurrence reaches a caller.
    #[must_use]
    pub fn scope(&self) -> FailureScope {
        match self {
            Self::CorruptImage { .. }
            | Self::UnsupportedContentType { .. }
            | Self::Write { .. }
            | Self::RetryExhausted { .. } => FailureScope::Image,
            Self::Transport { .. }
            | Self::BadStatus { .. }
            | Self::Decode { .. }
            | Self::MalformedUrl { .. }
            | Self::InvalidConfig(_)
            | Self::Client(_) => FailureScope::Page,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_status_display_includes_status_and_url() {
        let error = ScrapeError::bad_status("https://example.com/england", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected status in: {msg}");
        assert!(msg.contains("https://example.com/england"), "Expected URL in: {msg}");
        assert_eq!(error.status(), Some(404));
    }

    #[test]
    fn test_unsupported_content_type_display() {
        let error = ScrapeError::unsupported_content_type("https://img.example.com/a.jpg", "text/html");
        let msg = error.to_string();
        assert!(msg.contains("text/html"), "Expected content type in: {msg}");
        assert_eq!(error.status(), None);
    }

    #[test]
    fn test_write_error_display_includes_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = ScrapeError::write("/tmp/out/wales0000.jpg", io_error);
        assert!(error.to_string().contains("/tmp/out/wales0000.jpg"));
    }

    #[test]
    fn test_malformed_url_display() {
        let source = url::Url::parse("::not a url").unwrap_err();
        let error = ScrapeError::malformed_url("::not a url", source);
        assert!(error.to_string().contains("malformed URL"));
    }

    #[test]
    fn test_retry_exhausted_display_includes_attempts() {
        let error = ScrapeError::retry_exhausted("https://img.example.com/a.jpg", 5);
        assert!(error.to_string().contains("5 attempts"));
    }

    #[test]
    fn test_scope_image_level_errors() {
        assert_eq!(
            ScrapeError::retry_exhausted("u", 5).scope(),
            FailureScope::Image
        );
        assert_eq!(
            ScrapeError::unsupported_content_type("u", "text/html").scope(),
            FailureScope::Image
        );
        let io_error = std::io::Error::other("disk full");
        assert_eq!(ScrapeError::write("p", io_error).scope(), FailureScope::Image);
    }

    #[test]
    fn test_scope_page_level_errors() {
        assert_eq!(ScrapeError::bad_status("u", 500).scope(), FailureScope::Page);
        assert_eq!(ScrapeError::decode("u", "bad gzip").scope(), FailureScope::Page);
        assert_eq!(
            ScrapeError::InvalidConfig("no locations".into()).scope(),
            FailureScope::Page
        );
    }
}
