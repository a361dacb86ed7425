//! Page fetching: the shared HTTP client, browser headers and body decoding.
//!
//! # Example
//!
//! ```no_run
//! use guide_scraper::fetch::HttpClient;
//! use guide_scraper::PageTarget;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let base = Url::parse("https://www.lonelyplanet.com/")?;
//! let target = PageTarget::new(&base, "england/london")?;
//! let page = client.fetch_page(&target).await?;
//! println!("status {}", page.status());
//! # Ok(())
//! # }
//! ```

mod body;
mod client;
mod headers;

pub use body::{BodyDecoder, ContentEncoding};
pub use client::{
    CONNECT_TIMEOUT_SECS, FetchResult, HttpClient, MAX_REDIRECTS, READ_TIMEOUT_SECS,
};
pub use headers::{BROWSER_USER_AGENT, BrowserHeaders, host_header};
