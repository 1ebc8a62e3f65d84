use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Run parameters for a single crawl
///
/// Field names match the keys accepted in configuration files. Every field
/// except `url` is optional and falls back to the documented default.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Page URL, or URL template containing a `{}` placeholder when
    /// `repeat_enabled` is set
    pub url: String,

    /// CSS selectors applied to every page, in order
    #[serde(default = "default_selectors")]
    pub selectors: Vec<String>,

    /// Root directory for downloaded images
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,

    /// Replace files that already exist at the destination path
    #[serde(default)]
    pub overwrite: bool,

    /// Place images under a per-host subfolder of `save_path`
    #[serde(default = "default_true")]
    pub create_subfolder: bool,

    /// Expand the `{}` placeholder over `start_value..=end_value`
    #[serde(default)]
    pub repeat_enabled: bool,

    #[serde(default = "default_start")]
    pub start_value: i64,

    #[serde(default = "default_end")]
    pub end_value: i64,

    #[serde(default = "default_step")]
    pub step_value: i64,

    /// Maximum number of concurrent page fetches
    #[serde(default = "default_concurrent")]
    pub concurrent: u32,

    /// Maximum number of concurrent image downloads (defaults to `concurrent`)
    #[serde(default)]
    pub download_concurrent: Option<u32>,

    #[serde(default)]
    pub filename_pattern: FilenamePattern,

    /// Apply the image-extension filter to discovered URLs
    #[serde(default = "default_true")]
    pub check_extensions: bool,

    /// Reject URLs without a known image extension when checking extensions
    #[serde(default)]
    pub strict_extensions: bool,
}

impl Config {
    /// Creates a configuration for `url` with every other field at its default
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Size of the page-fetch pool
    pub fn page_concurrency(&self) -> usize {
        self.concurrent.max(1) as usize
    }

    /// Size of the image-download pool
    pub fn download_concurrency(&self) -> usize {
        self.download_concurrent.unwrap_or(self.concurrent).max(1) as usize
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: String::new(),
            selectors: default_selectors(),
            save_path: default_save_path(),
            overwrite: false,
            create_subfolder: true,
            repeat_enabled: false,
            start_value: default_start(),
            end_value: default_end(),
            step_value: default_step(),
            concurrent: default_concurrent(),
            download_concurrent: None,
            filename_pattern: FilenamePattern::default(),
            check_extensions: true,
            strict_extensions: false,
        }
    }
}

/// How downloaded files are named
///
/// Stored in configuration files as an integer (0-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "u8")]
pub enum FilenamePattern {
    /// `photo.jpg`
    #[default]
    KeepOriginal,

    /// `photo_20240101_120000.jpg`
    OriginalTimestamp,

    /// `0007_photo.jpg`
    IndexOriginal,

    /// `example_com_0007_photo.jpg`
    DomainIndexOriginal,
}

impl TryFrom<u8> for FilenamePattern {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::KeepOriginal),
            1 => Ok(Self::OriginalTimestamp),
            2 => Ok(Self::IndexOriginal),
            3 => Ok(Self::DomainIndexOriginal),
            other => Err(format!(
                "filename_pattern must be between 0 and 3, got {}",
                other
            )),
        }
    }
}

impl fmt::Display for FilenamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::KeepOriginal => "original",
            Self::OriginalTimestamp => "original + timestamp",
            Self::IndexOriginal => "index + original",
            Self::DomainIndexOriginal => "domain + index + original",
        };
        f.write_str(label)
    }
}

fn default_selectors() -> Vec<String> {
    vec!["img".to_string()]
}

fn default_save_path() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_true() -> bool {
    true
}

fn default_start() -> i64 {
    1
}

fn default_end() -> i64 {
    10
}

fn default_step() -> i64 {
    1
}

fn default_concurrent() -> u32 {
    3
}
