//! Image downloader
//!
//! Downloads every discovered image under its own concurrency limit and
//! turns each attempt into exactly one [`DownloadResult`], whatever happens.

use crate::config::{Config, FilenamePattern};
use crate::crawler::extractor::ImageDescriptor;
use crate::crawler::fetcher::{build_http_client, DOWNLOAD_TIMEOUT};
use crate::crawler::naming::{build_filename, destination_path};
use crate::crawler::CrawlHandle;
use crate::diagnostics::Diagnostics;
use crate::state::DownloadStatus;
use crate::DownloadError;
use chrono::Local;
use reqwest::header::REFERER;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

const COMPONENT: &str = "downloader";

/// Outcome of a single image download
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadResult {
    /// True for `Downloaded` and `SkippedExists`
    pub success: bool,

    pub url: String,

    /// Final filename, absent when the download failed before naming
    pub filename: Option<String>,

    /// Destination on disk, absent when the download failed before naming
    pub local_path: Option<PathBuf>,

    /// Bytes written, or size of the existing file when skipped
    pub size: u64,

    /// Wall-clock time spent, rounded to two decimals
    pub elapsed_secs: f64,

    pub status: DownloadStatus,

    /// Failure description, present iff `status` is `Failed`
    pub error: Option<String>,
}

impl DownloadResult {
    fn downloaded(url: &str, filename: String, path: PathBuf, size: u64, elapsed: f64) -> Self {
        Self {
            success: true,
            url: url.to_string(),
            filename: Some(filename),
            local_path: Some(path),
            size,
            elapsed_secs: round_secs(elapsed),
            status: DownloadStatus::Downloaded,
            error: None,
        }
    }

    fn skipped(url: &str, filename: String, path: PathBuf, size: u64) -> Self {
        Self {
            success: true,
            url: url.to_string(),
            filename: Some(filename),
            local_path: Some(path),
            size,
            elapsed_secs: 0.0,
            status: DownloadStatus::SkippedExists,
            error: None,
        }
    }

    /// Builds a failure record for `url`
    pub fn failed(url: &str, error: impl Into<String>, elapsed: f64) -> Self {
        Self {
            success: false,
            url: url.to_string(),
            filename: None,
            local_path: None,
            size: 0,
            elapsed_secs: round_secs(elapsed),
            status: DownloadStatus::Failed,
            error: Some(error.into()),
        }
    }
}

fn round_secs(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

/// Downloads images into the configured save root
///
/// Clones share the same client, permit pool and cancellation flag.
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    client: Client,
    semaphore: Arc<Semaphore>,
    save_root: PathBuf,
    overwrite: bool,
    create_subfolder: bool,
    pattern: FilenamePattern,
    handle: CrawlHandle,
    diagnostics: Diagnostics,
}

/// Destination paths claimed during one batch, mapped to the claiming URL
type ClaimedPaths = Arc<Mutex<HashMap<PathBuf, String>>>;

impl ImageDownloader {
    pub fn new(
        config: &Config,
        handle: CrawlHandle,
        diagnostics: Diagnostics,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(DOWNLOAD_TIMEOUT)?,
            semaphore: Arc::new(Semaphore::new(config.download_concurrency())),
            save_root: config.save_path.clone(),
            overwrite: config.overwrite,
            create_subfolder: config.create_subfolder,
            pattern: config.filename_pattern,
            handle,
            diagnostics,
        })
    }

    /// Downloads every descriptor and returns one result per input
    ///
    /// Results are returned in dispatch order; downloads themselves complete
    /// in any order.
    pub async fn download_all(&self, descriptors: &[ImageDescriptor]) -> Vec<DownloadResult> {
        self.download_all_with(descriptors, |_, _| {}).await
    }

    /// Like [`download_all`](Self::download_all), calling `on_result` with
    /// the number of finished downloads and the latest result as each one
    /// completes
    pub async fn download_all_with<F>(
        &self,
        descriptors: &[ImageDescriptor],
        mut on_result: F,
    ) -> Vec<DownloadResult>
    where
        F: FnMut(usize, &DownloadResult),
    {
        let claimed: ClaimedPaths = Arc::default();
        let mut tasks = JoinSet::new();

        for (index, descriptor) in descriptors.iter().enumerate() {
            let downloader = self.clone();
            let descriptor = descriptor.clone();
            let claimed = Arc::clone(&claimed);
            tasks.spawn(async move {
                let result = downloader.download_one(&descriptor, index, &claimed).await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<DownloadResult>> = vec![None; descriptors.len()];
        let mut finished = 0;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => {
                    finished += 1;
                    on_result(finished, &result);
                    slots[index] = Some(result);
                }
                Err(e) => {
                    self.diagnostics
                        .error(COMPONENT, format!("Download task failed: {}", e));
                }
            }
        }

        // A panicked task still owes its descriptor a result
        slots
            .into_iter()
            .zip(descriptors)
            .map(|(slot, descriptor)| {
                slot.unwrap_or_else(|| {
                    let result =
                        DownloadResult::failed(&descriptor.url, "download task aborted", 0.0);
                    finished += 1;
                    on_result(finished, &result);
                    result
                })
            })
            .collect()
    }

    async fn download_one(
        &self,
        descriptor: &ImageDescriptor,
        index: usize,
        claimed: &ClaimedPaths,
    ) -> DownloadResult {
        let cancelled =
            || DownloadResult::failed(&descriptor.url, DownloadError::Cancelled.to_string(), 0.0);

        let Ok(_permit) = self.semaphore.acquire().await else {
            return cancelled();
        };

        let started = Instant::now();

        if self.handle.is_stopped() {
            return cancelled();
        }

        if descriptor.url.trim().is_empty() {
            self.diagnostics
                .warn(COMPONENT, format!("Image #{} has no URL", index));
            return DownloadResult::failed("", DownloadError::NoUrl.to_string(), 0.0);
        }

        match self.try_download(descriptor, index, started, claimed).await {
            Ok(result) => {
                self.diagnostics.debug(
                    COMPONENT,
                    format!("{} {} ({} bytes)", result.status, descriptor.url, result.size),
                );
                result
            }
            Err(e) => {
                self.diagnostics
                    .warn(COMPONENT, format!("Failed {}: {}", descriptor.url, e));
                DownloadResult::failed(
                    &descriptor.url,
                    e.to_string(),
                    started.elapsed().as_secs_f64(),
                )
            }
        }
    }

    async fn try_download(
        &self,
        descriptor: &ImageDescriptor,
        index: usize,
        started: Instant,
        claimed: &ClaimedPaths,
    ) -> Result<DownloadResult, DownloadError> {
        let url = Url::parse(&descriptor.url)?;

        let response = self
            .client
            .get(url.clone())
            .header(REFERER, descriptor.source_page.as_str())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DownloadError::Status(status.as_u16()));
        }

        let filename = build_filename(&url, index, self.pattern, Local::now());
        let path = destination_path(&self.save_root, &url, &filename, self.create_subfolder);
        self.claim(&path, &descriptor.url, claimed);

        if !self.overwrite && tokio::fs::try_exists(&path).await? {
            let size = tokio::fs::metadata(&path).await?.len();
            return Ok(DownloadResult::skipped(&descriptor.url, filename, path, size));
        }

        let body = response.bytes().await?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &body).await?;

        Ok(DownloadResult::downloaded(
            &descriptor.url,
            filename,
            path,
            body.len() as u64,
            started.elapsed().as_secs_f64(),
        ))
    }

    // Collisions are reported, not prevented: the last writer wins.
    fn claim(&self, path: &Path, url: &str, claimed: &ClaimedPaths) {
        let mut claimed = claimed.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = claimed.insert(path.to_path_buf(), url.to_string()) {
            if previous != url {
                self.diagnostics.warn(
                    COMPONENT,
                    format!(
                        "{} and {} both resolve to {}",
                        previous,
                        url,
                        path.display()
                    ),
                );
            }
        }
    }
}
