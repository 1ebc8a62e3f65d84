//! Img-Harvest: a selector-driven image crawler
//!
//! This crate expands a URL pattern into a set of pages, extracts image
//! references from each page with CSS selectors, and downloads the
//! deduplicated images into a local directory tree.

pub mod config;
pub mod crawler;
pub mod diagnostics;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Img-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fatal error: {0}")]
    Fatal(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Crawl was cancelled")]
    Cancelled,

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunState,
        to: state::RunState,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while fetching a single page
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status}: {url}")]
    Status { url: String, status: u16 },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Fetch cancelled: {url}")]
    Cancelled { url: String },
}

/// Errors raised while downloading a single image
///
/// These never escape the downloader; they are folded into the
/// corresponding `DownloadResult`.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("No URL provided")]
    NoUrl,

    #[error("Download cancelled")]
    Cancelled,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Invalid image URL: {0}")]
    InvalidUrl(#[from] ::url::ParseError),

    #[error("{0}")]
    Network(#[from] reqwest::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Img-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, FilenamePattern};
pub use crawler::{Coordinator, CrawlHandle, DownloadResult, ImageDescriptor};
pub use diagnostics::{Diagnostic, DiagnosticLevel, Diagnostics};
pub use output::{CrawlObserver, ProgressEvent, RunStatistics};
pub use state::{DownloadStatus, RunState};
pub use url::UrlSetGenerator;
