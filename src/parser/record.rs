//! Image records decoded from the slideshow JSON payload.
//!
//! Each payload entry looks like:
//!
//! ```json
//! {"medium": "https://media.example.com/a.jpg?sig=abc", "strapline": "Big Ben at dusk"}
//! ```
//!
//! The query string is stripped from `medium`: it carries short-lived
//! signing parameters that are not part of the image's identity.

use serde::Deserialize;
use url::Url;

use crate::ScrapeError;

#[derive(Debug, Deserialize)]
struct RawImage {
    medium: String,
    strapline: String,
}

/// One image discovered on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    url: Url,
    caption: String,
}

impl ImageRecord {
    /// Builds a record from a raw URL string and caption.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::MalformedUrl`] if `url` is not an absolute URL.
    pub fn new(url: &str, caption: impl Into<String>) -> Result<Self, ScrapeError> {
        let parsed = Url::parse(url).map_err(|e| ScrapeError::malformed_url(url, e))?;
        Ok(Self {
            url: strip_query(parsed),
            caption: caption.into(),
        })
    }

    /// Decodes a single JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Decode`] for missing or mistyped fields and
    /// [`ScrapeError::MalformedUrl`] for an unparseable `medium`.
    pub fn from_json(json: &str) -> Result<Self, ScrapeError> {
        let raw: RawImage =
            serde_json::from_str(json).map_err(|e| ScrapeError::decode("image record", e))?;
        Self::try_from(raw)
    }

    /// The query-stripped image URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The caption shown under the image.
    #[must_use]
    pub fn caption(&self) -> &str {
        &self.caption
    }
}

impl TryFrom<RawImage> for ImageRecord {
    type Error = ScrapeError;

    fn try_from(raw: RawImage) -> Result<Self, Self::Error> {
        Self::new(&raw.medium, raw.strapline)
    }
}

/// Decodes the slideshow payload: a JSON array of image objects.
///
/// Order is preserved; it becomes the output sequence index.
///
/// # Errors
///
/// Returns [`ScrapeError::Decode`] if the payload is not an array of image
/// objects, or [`ScrapeError::MalformedUrl`] for the first bad URL.
pub fn decode_image_list(payload: &str) -> Result<Vec<ImageRecord>, ScrapeError> {
    let raw: Vec<RawImage> =
        serde_json::from_str(payload).map_err(|e| ScrapeError::decode("slideshow payload", e))?;
    raw.into_iter().map(ImageRecord::try_from).collect()
}

/// Removes the query component from `url`.
#[must_use]
pub fn strip_query(mut url: Url) -> Url {
    url.set_query(None);
    url
}
