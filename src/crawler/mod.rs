//! Crawler module for page fetching, image extraction and downloading
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching under a bounded page pool
//! - CSS-selector image extraction
//! - Filename and destination path policy
//! - Bounded concurrent image downloads
//! - Overall crawl coordination

mod coordinator;
mod downloader;
mod extractor;
mod fetcher;
mod handle;
mod naming;

pub use coordinator::{run_crawl, Coordinator};
pub use downloader::{DownloadResult, ImageDownloader};
pub use extractor::{ImageDescriptor, ImageExtractor, SOURCE_ATTRIBUTES};
pub use fetcher::{
    build_http_client, FetchedPage, PageFetcher, BROWSER_USER_AGENT, DOWNLOAD_TIMEOUT,
    FETCH_TIMEOUT,
};
pub use handle::CrawlHandle;
pub use naming::{
    build_filename, destination_path, sanitize_component, sanitize_component_with,
    split_extension, NamingRules,
};

use crate::config::Config;
use crate::output::CrawlObserver;
use crate::Result;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration
/// 2. Generate the URL set
/// 3. Fetch every page and extract image references
/// 4. Download the deduplicated images
/// 5. Report the results to the observer
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `observer` - Receives progress and the final outcome
///
/// # Returns
///
/// * `Ok(Vec<DownloadResult>)` - One result per discovered image
/// * `Err(HarvestError)` - The run could not start or set up
pub async fn crawl(
    config: Config,
    observer: impl CrawlObserver + 'static,
) -> Result<Vec<DownloadResult>> {
    run_crawl(config, observer).await
}
