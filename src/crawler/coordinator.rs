//! Crawler coordinator - main crawl orchestration logic
//!
//! This module sequences one crawl run:
//! - Validating the configuration and preparing the save directory
//! - Fetching every generated URL and extracting image descriptors
//! - Deduplicating descriptors across pages
//! - Downloading the collected images
//! - Reporting progress and the final outcome to an observer

use crate::config::{validate, Config};
use crate::crawler::{
    CrawlHandle, DownloadResult, ImageDescriptor, ImageDownloader, ImageExtractor, PageFetcher,
};
use crate::diagnostics::Diagnostics;
use crate::output::{CrawlObserver, CrawlProgress, NullObserver, ProgressEvent};
use crate::state::RunState;
use crate::url::UrlSetGenerator;
use crate::{FetchError, HarvestError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;

const COMPONENT: &str = "coordinator";

/// Share of the progress scale given to each phase
const PHASE_SPAN: usize = 50;

/// Drives a single crawl run
///
/// A coordinator runs at most once; a new run needs a new instance.
pub struct Coordinator {
    config: Arc<Config>,
    observer: Arc<dyn CrawlObserver>,
    diagnostics: Diagnostics,
    handle: CrawlHandle,
    state: RunState,
    found: Vec<ImageDescriptor>,
    results: Vec<DownloadResult>,
}

impl Coordinator {
    /// Creates an idle coordinator with a no-op observer
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            observer: Arc::new(NullObserver),
            diagnostics: Diagnostics::new(),
            handle: CrawlHandle::new(),
            state: RunState::Idle,
            found: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: impl CrawlObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Uses an existing collector, e.g. one shared with the host
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Handle for stopping the run from another task
    pub fn handle(&self) -> CrawlHandle {
        self.handle.clone()
    }

    /// Requests a cooperative stop
    ///
    /// Only usable before or after [`crawl`](Self::crawl), which borrows the
    /// coordinator mutably. To stop a run in progress, take a
    /// [`handle`](Self::handle) first and call [`CrawlHandle::stop`] on it
    /// from another task.
    pub fn stop(&self) {
        self.handle.stop();
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Descriptors accumulated so far, deduplicated across pages
    pub fn found_images(&self) -> &[ImageDescriptor] {
        &self.found
    }

    /// Results of the last completed or cancelled run
    pub fn results(&self) -> &[DownloadResult] {
        &self.results
    }

    pub fn progress(&self) -> CrawlProgress {
        self.handle.progress()
    }

    /// Runs the crawl to completion
    ///
    /// Returns the download results, one per discovered image. A stopped
    /// run still returns `Ok` with whatever was downloaded before the stop
    /// and ends in [`RunState::Cancelled`]; the observer's `on_finished` is
    /// only called for runs that complete.
    ///
    /// Configuration problems and setup failures end the run in
    /// [`RunState::Failed`], are reported once through `on_error` and are
    /// returned as errors.
    pub async fn crawl(&mut self) -> Result<Vec<DownloadResult>> {
        self.transition(RunState::Running)?;

        match self.run().await {
            Ok(results) => {
                self.results = results.clone();
                if self.handle.is_stopped() {
                    self.transition(RunState::Cancelled)?;
                    self.diagnostics.info(
                        COMPONENT,
                        format!("Crawl stopped with {} results", results.len()),
                    );
                } else {
                    self.transition(RunState::Completed)?;
                    self.observer.on_finished(&results);
                }
                Ok(results)
            }
            Err(e) => {
                self.transition(RunState::Failed)?;
                self.diagnostics.error(COMPONENT, e.to_string());
                self.observer.on_error(&e.to_string());
                Err(e)
            }
        }
    }

    async fn run(&mut self) -> Result<Vec<DownloadResult>> {
        validate(&self.config)?;
        let urls = UrlSetGenerator::new(&self.config).generate_urls()?;

        std::fs::create_dir_all(&self.config.save_path).map_err(|e| {
            HarvestError::Fatal(format!(
                "Cannot create save directory {}: {}",
                self.config.save_path.display(),
                e
            ))
        })?;

        let fetcher = PageFetcher::new(
            self.config.page_concurrency(),
            self.handle.clone(),
            self.diagnostics.clone(),
        )?;
        let downloader =
            ImageDownloader::new(&self.config, self.handle.clone(), self.diagnostics.clone())?;

        self.handle.update_progress(|p| p.total_urls = urls.len());
        self.emit(0, format!("Crawl started: {} URLs", urls.len()));

        self.fetch_pages(urls, fetcher).await;

        if self.found.is_empty() || self.handle.is_stopped() {
            if !self.handle.is_stopped() {
                self.emit(100, "Crawl complete: no images found");
            }
            return Ok(Vec::new());
        }

        let results = self.download_images(&downloader).await;

        if !self.handle.is_stopped() {
            let success = results.iter().filter(|r| r.success).count();
            self.emit(
                100,
                format!(
                    "Crawl complete: {} of {} images saved",
                    success,
                    results.len()
                ),
            );
        }

        Ok(results)
    }

    /// Fetches and extracts every URL, accumulating new descriptors
    async fn fetch_pages(&mut self, urls: Vec<String>, fetcher: PageFetcher) {
        let total = urls.len();
        let extractor = Arc::new(ImageExtractor::new(&self.config, self.diagnostics.clone()));
        let mut tasks = JoinSet::new();

        for url in urls {
            let fetcher = fetcher.clone();
            let extractor = Arc::clone(&extractor);
            tasks.spawn(async move {
                let images = fetcher
                    .fetch(&url)
                    .await
                    .map(|page| extractor.extract(&page.body, &page.url));
                (url, images)
            });
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut processed = 0;

        // Results are handled one at a time, so dedup needs no lock
        while let Some(joined) = tasks.join_next().await {
            processed += 1;

            let message = match joined {
                Ok((url, Ok(images))) => {
                    let fresh: Vec<ImageDescriptor> = images
                        .into_iter()
                        .filter(|image| seen.insert(image.url.clone()))
                        .collect();
                    let count = fresh.len();
                    if !fresh.is_empty() {
                        self.observer.on_images_found(&fresh);
                        self.found.extend(fresh);
                    }
                    format!("Processed {} ({} new images)", url, count)
                }
                Ok((url, Err(FetchError::Cancelled { .. }))) => format!("Skipped {}", url),
                Ok((url, Err(e))) => format!("Failed {}: {}", url, e),
                Err(e) => {
                    self.diagnostics
                        .error(COMPONENT, format!("Page task failed: {}", e));
                    "Page task failed".to_string()
                }
            };

            let found = self.found.len();
            self.handle.update_progress(|p| {
                p.processed_urls = processed;
                p.found_images = found;
            });
            self.emit(scaled(0, processed, total), message);
        }

        tracing::info!("Fetched {} pages, found {} unique images", processed, self.found.len());
    }

    async fn download_images(&self, downloader: &ImageDownloader) -> Vec<DownloadResult> {
        let total = self.found.len();
        self.emit(PHASE_SPAN as u8, format!("Starting download of {} images", total));

        let observer = Arc::clone(&self.observer);
        let handle = self.handle.clone();

        downloader
            .download_all_with(&self.found, |done, result| {
                handle.update_progress(|p| {
                    if result.success {
                        p.downloaded_images += 1;
                    } else {
                        p.failed_downloads += 1;
                    }
                });
                // The final 100% event is sent once the run settles
                if done < total {
                    observer.on_progress(&ProgressEvent::new(
                        scaled(PHASE_SPAN, done, total),
                        format!("Downloaded {}/{}: {}", done, total, result.status),
                    ));
                }
            })
            .await
    }

    fn emit(&self, percent: u8, message: impl Into<String>) {
        let event = ProgressEvent::new(percent, message);
        tracing::debug!("[{}%] {}", event.percent, event.message);
        self.observer.on_progress(&event);
    }

    fn transition(&mut self, to: RunState) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::debug!("Run state {} -> {}", self.state, to);
        self.state = to;
        Ok(())
    }
}

/// Maps `done` of `total` units onto one phase of the progress scale
fn scaled(base: usize, done: usize, total: usize) -> u8 {
    let step = done.min(total) * PHASE_SPAN / total.max(1);
    (base + step) as u8
}

/// Runs a complete crawl with the given observer
///
/// # Example
///
/// ```no_run
/// use img_harvest::config::load_config;
/// use img_harvest::crawler::run_crawl;
/// use img_harvest::output::LoggingObserver;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let results = run_crawl(config, LoggingObserver).await?;
/// println!("{} images", results.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    observer: impl CrawlObserver + 'static,
) -> Result<Vec<DownloadResult>> {
    let mut coordinator = Coordinator::new(config).with_observer(observer);
    coordinator.crawl().await
}
