//! Page parsing and image record decoding.
//!
//! A page carries at most one slideshow element whose
//! `data-lp-initial-images` attribute holds a JSON array of images. This
//! module turns a fetched page into an ordered list of [`ImageRecord`]s.

mod page;
mod record;

pub use page::{IMAGE_DATA_ATTR, SLIDESHOW_SELECTOR, extract_images, parse_page};
pub use record::{ImageRecord, decode_image_list, strip_query};
