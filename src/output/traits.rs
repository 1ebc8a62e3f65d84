//! Observer interface between a running crawl and its host
//!
//! A host (CLI, GUI, service) receives progress, discovered images, the
//! final result list, or a fatal error through a [`CrawlObserver`]. The
//! observer is called from the crawl task; hosts with their own event loop
//! can use [`ChannelObserver`] and drain events wherever they like.

use crate::crawler::{DownloadResult, ImageDescriptor};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Errors raised while writing run output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Informational progress update
///
/// The fetch phase reports within 0-50, the download phase within 50-100.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub percent: u8,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(percent: u8, message: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            message: message.into(),
        }
    }
}

/// Receives notifications from a crawl run
///
/// All methods default to doing nothing.
pub trait CrawlObserver: Send + Sync {
    /// Called any number of times while the run progresses
    fn on_progress(&self, _event: &ProgressEvent) {}

    /// Called once per page that yielded previously unseen images
    fn on_images_found(&self, _images: &[ImageDescriptor]) {}

    /// Called exactly once when a run completes without being cancelled
    fn on_finished(&self, _results: &[DownloadResult]) {}

    /// Called exactly once when a run fails before producing results
    fn on_error(&self, _message: &str) {}
}

/// Observer that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl CrawlObserver for NullObserver {}

/// Observer that writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl CrawlObserver for LoggingObserver {
    fn on_progress(&self, event: &ProgressEvent) {
        tracing::info!("[{:>3}%] {}", event.percent, event.message);
    }

    fn on_images_found(&self, images: &[ImageDescriptor]) {
        for image in images {
            tracing::debug!("Found {} via '{}'", image.url, image.selector);
        }
    }

    fn on_finished(&self, results: &[DownloadResult]) {
        tracing::info!("Crawl finished with {} results", results.len());
    }

    fn on_error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// A notification forwarded by [`ChannelObserver`]
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    Progress(ProgressEvent),
    ImagesFound(Vec<ImageDescriptor>),
    Finished(Vec<DownloadResult>),
    Error(String),
}

/// Observer that forwards every notification over an unbounded channel
///
/// Send failures (receiver dropped) are ignored; the crawl keeps running.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: UnboundedSender<CrawlEvent>,
}

impl ChannelObserver {
    pub fn new(sender: UnboundedSender<CrawlEvent>) -> Self {
        Self { sender }
    }
}

impl CrawlObserver for ChannelObserver {
    fn on_progress(&self, event: &ProgressEvent) {
        let _ = self.sender.send(CrawlEvent::Progress(event.clone()));
    }

    fn on_images_found(&self, images: &[ImageDescriptor]) {
        let _ = self.sender.send(CrawlEvent::ImagesFound(images.to_vec()));
    }

    fn on_finished(&self, results: &[DownloadResult]) {
        let _ = self.sender.send(CrawlEvent::Finished(results.to_vec()));
    }

    fn on_error(&self, message: &str) {
        let _ = self.sender.send(CrawlEvent::Error(message.to_string()));
    }
}
