//! Image download: retry policy, output naming and the downloader itself.
//!
//! # Example
//!
//! ```no_run
//! use guide_scraper::download::{ImageDownloader, RetryPolicy};
//! use guide_scraper::fetch::HttpClient;
//! use guide_scraper::parser::ImageRecord;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = ImageDownloader::new(HttpClient::new()?, RetryPolicy::default(), "data");
//! let image = ImageRecord::new("https://media.example.com/big-ben.jpg", "Big Ben")?;
//! let referer = Url::parse("https://www.lonelyplanet.com/england/london")?;
//! let outcome = downloader.download(&image, "england/london", &referer, 0).await;
//! println!("{}", outcome.path().display());
//! # Ok(())
//! # }
//! ```

mod downloader;
mod filename;
mod retry;

pub use downloader::{
    DownloadOutcome, ImageDownloader, ImageStats, JPEG_CONTENT_TYPE, JPEG_QUALITY, is_jpeg,
};
pub use filename::{OUTPUT_EXTENSION, output_file_name, output_path, page_stem};
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, DEFAULT_RETRY_STATUSES, RetryDecision, RetryPolicy,
    StatusClass,
};
