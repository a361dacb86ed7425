//! Page parsing: find the slideshow element and decode its image payload.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, instrument};

use super::record::{ImageRecord, decode_image_list};
use crate::ScrapeError;
use crate::fetch::FetchResult;

/// CSS selector for the slideshow element.
pub const SLIDESHOW_SELECTOR: &str = ".slideshow.js-slideshow";

/// Attribute holding the JSON-encoded image list.
pub const IMAGE_DATA_ATTR: &str = "data-lp-initial-images";

#[allow(clippy::expect_used)]
static SLIDESHOW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(SLIDESHOW_SELECTOR).expect("slideshow selector"));

/// Parses a fetched page into its image records.
///
/// The body is only read when the status is 200. A page without a
/// slideshow, or whose payload does not decode, yields an empty list.
///
/// # Errors
///
/// - [`ScrapeError::BadStatus`] if the status is not 200
/// - [`ScrapeError::Transport`] if the body cannot be read
/// - [`ScrapeError::Decode`] if the body encoding is corrupt
#[instrument(skip(page), fields(url = %page.url()))]
pub async fn parse_page(page: FetchResult) -> Result<Vec<ImageRecord>, ScrapeError> {
    let status = page.status();
    if status != 200 {
        debug!(status, "page not loaded");
        return Err(ScrapeError::bad_status(page.url().as_str(), status));
    }

    let url = page.url().to_string();
    let body = page.into_decoder().await?.read_all()?;
    let html = String::from_utf8_lossy(&body);
    Ok(extract_images(&html, &url))
}

/// Extracts image records from an HTML document.
///
/// Only the first slideshow element is used. `context` is used in logs.
#[must_use]
pub fn extract_images(html: &str, context: &str) -> Vec<ImageRecord> {
    debug!(context, "getting image data");
    let document = Html::parse_document(html);
    let mut slideshows = document.select(&SLIDESHOW);

    let Some(slideshow) = slideshows.next() else {
        debug!(context, "no slideshow element");
        return Vec::new();
    };

    let extra = slideshows.count();
    if extra > 0 {
        debug!(context, extra, "additional slideshow elements ignored");
    }

    let Some(payload) = slideshow.value().attr(IMAGE_DATA_ATTR) else {
        debug!(context, attr = IMAGE_DATA_ATTR, "no image data attribute");
        return Vec::new();
    };

    match decode_image_list(payload) {
        Ok(images) => {
            debug!(context, count = images.len(), "decoded image data");
            images
        }
        Err(e) => {
            debug!(context, error = %e, "error decoding image data");
            Vec::new()
        }
    }
}
