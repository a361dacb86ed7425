//! Guide Scraper Core Library
//!
//! Fetches travel-guide location pages, extracts the slideshow image list
//! embedded in each page, and archives every image as a quality-100 JPEG.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Run configuration and the built-in location list
//! - [`fetch`] - Shared HTTP client, browser headers and body decoding
//! - [`parser`] - Slideshow extraction and image record decoding
//! - [`download`] - Image download with fixed-delay retry
//! - [`orchestrator`] - One concurrent pipeline per page, run report
//!
//! # Example
//!
//! ```no_run
//! use guide_scraper::{ScrapeConfig, ScrapeOrchestrator};
//!
//! # async fn example() -> Result<(), guide_scraper::ScrapeError> {
//! let config = ScrapeConfig::default();
//! config.validate()?;
//! let orchestrator = ScrapeOrchestrator::from_config(&config)?;
//! let report = orchestrator.run(config.targets()?).await;
//! println!("saved {} images", report.images_saved());
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod parser;
pub mod target;

// Re-export commonly used types
pub use config::{DEFAULT_BASE_URL, DEFAULT_LOCATIONS, DEFAULT_OUTPUT_DIR, ScrapeConfig};
pub use download::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, DownloadOutcome, ImageDownloader, ImageStats,
    RetryDecision, RetryPolicy, output_file_name,
};
pub use error::{FailureScope, ScrapeError};
pub use fetch::{BodyDecoder, ContentEncoding, FetchResult, HttpClient};
pub use orchestrator::{PageReport, PageState, RunReport, ScrapeOrchestrator, run_page};
pub use parser::{ImageRecord, extract_images, parse_page};
pub use target::PageTarget;
