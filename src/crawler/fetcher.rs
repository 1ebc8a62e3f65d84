//! HTTP fetcher implementation
//!
//! This module handles all HTTP access for the crawler, including:
//! - Building HTTP clients with the browser-like user agent
//! - Bounding the number of in-flight page requests
//! - Classifying page fetch failures per URL

use crate::crawler::CrawlHandle;
use crate::diagnostics::Diagnostics;
use crate::FetchError;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// User agent sent with every page and image request
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Timeout applied to each page request
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout applied to each image request
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

const COMPONENT: &str = "fetcher";

/// Builds an HTTP client for page or image requests
///
/// Certificate validation is disabled so that sites with self-signed or
/// misconfigured certificates can still be crawled.
///
/// # Example
///
/// ```no_run
/// use img_harvest::crawler::{build_http_client, FETCH_TIMEOUT};
///
/// let client = build_http_client(FETCH_TIMEOUT).unwrap();
/// ```
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(timeout)
        .danger_accept_invalid_certs(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested
    pub url: String,

    /// HTTP status code (always 200)
    pub status_code: u16,

    /// Page body content
    pub body: String,
}

/// Fetches pages under a shared concurrency limit
///
/// Clones share the same client, permit pool and cancellation flag.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    semaphore: Arc<Semaphore>,
    handle: CrawlHandle,
    diagnostics: Diagnostics,
}

impl PageFetcher {
    /// Creates a fetcher allowing at most `concurrency` requests in flight
    pub fn new(
        concurrency: usize,
        handle: CrawlHandle,
        diagnostics: Diagnostics,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(FETCH_TIMEOUT)?,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            handle,
            diagnostics,
        })
    }

    /// Fetches the HTML for a single URL
    ///
    /// Waits for a permit, then short-circuits with
    /// [`FetchError::Cancelled`] if a stop was requested in the meantime.
    /// Anything other than HTTP 200 is a failure for this URL only.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| FetchError::Cancelled {
                url: url.to_string(),
            })?;

        if self.handle.is_stopped() {
            self.diagnostics
                .debug(COMPONENT, format!("Skipping {} (crawl stopped)", url));
            return Err(FetchError::Cancelled {
                url: url.to_string(),
            });
        }

        self.diagnostics.debug(COMPONENT, format!("GET {}", url));

        let result = self.send(url).await;
        if let Err(e) = &result {
            self.diagnostics.warn(COMPONENT, e.to_string());
        }
        result
    }

    async fn send(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_network_error(url, &e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_network_error(url, &e))?;

        Ok(FetchedPage {
            url: url.to_string(),
            status_code: status.as_u16(),
            body,
        })
    }
}

fn classify_network_error(url: &str, error: &reqwest::Error) -> FetchError {
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    };

    FetchError::Network {
        url: url.to_string(),
        message,
    }
}
