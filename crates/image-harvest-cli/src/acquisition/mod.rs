//! Image acquisition: search, content-type filtering, and downloading.

pub mod download;
pub mod filter;
pub mod http_client;
pub mod search;

pub use download::{download_images, url_suffix, DownloadOptions, DownloadReport};
pub use filter::{filter_image_urls, is_image_content_type, is_url_image};
pub use http_client::{HeadResponse, HttpClient, HttpResponse};
pub use search::{search_images, DuckDuckGoImages, ImageHit, ImageSearch, SafeSearch};

/// Errors specific to talking to remote services.
#[derive(thiserror::Error, Debug)]
pub enum AcquisitionError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Search token not found for '{0}'")]
    TokenNotFound(String),

    #[error("Unexpected search response: {0}")]
    BadResponse(String),
}
