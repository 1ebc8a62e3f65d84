//! Filename and destination-path policy for downloaded images
//!
//! Every name that reaches the filesystem goes through
//! [`sanitize_component`], which guarantees a single, non-empty path
//! segment that cannot climb out of the save root.

use crate::config::FilenamePattern;
use crate::url::host_label;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use url::Url;

/// Maximum length of a name, excluding its extension, in characters
pub const MAX_NAME_CHARS: usize = 100;

/// Name used when sanitization leaves nothing behind
pub const FALLBACK_NAME: &str = "unnamed_file";

/// Extension appended to names that have none
pub const DEFAULT_EXTENSION: &str = ".jpg";

const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const RESERVED_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Filesystem naming rules to sanitize for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingRules {
    Posix,
    /// Adds reserved device names and trailing dot/space rules
    Windows,
}

impl NamingRules {
    /// Rules of the platform this binary was built for
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }
}

/// Sanitizes a file or folder name for the current platform
///
/// # Examples
///
/// ```
/// use img_harvest::crawler::sanitize_component;
///
/// assert_eq!(sanitize_component("a/b:c*d.png"), "a_b_c_d.png");
/// assert_eq!(sanitize_component("../.."), "unnamed_file");
/// ```
pub fn sanitize_component(name: &str) -> String {
    sanitize_component_with(name, NamingRules::current())
}

/// Sanitizes a file or folder name under explicit platform rules
pub fn sanitize_component_with(name: &str, rules: NamingRules) -> String {
    let mut collapsed = String::with_capacity(name.len());
    let mut previous_underscore = false;
    for c in name.chars() {
        let c = if FORBIDDEN_CHARS.contains(&c) { '_' } else { c };
        if c == '_' {
            if previous_underscore {
                continue;
            }
            previous_underscore = true;
        } else {
            previous_underscore = false;
        }
        collapsed.push(c);
    }

    let mut sanitized = collapsed
        .trim_matches(|c| c == ' ' || c == '.' || c == '_')
        .to_string();

    if rules == NamingRules::Windows {
        sanitized = sanitized
            .trim_end_matches(|c| c == '.' || c == ' ')
            .to_string();

        let device = sanitized.split('.').next().unwrap_or_default();
        if RESERVED_DEVICE_NAMES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(device))
        {
            sanitized.insert(0, '_');
        }
    }

    let (stem, extension) = split_extension(&sanitized);
    if stem.chars().count() > MAX_NAME_CHARS {
        let truncated: String = stem.chars().take(MAX_NAME_CHARS).collect();
        sanitized = format!("{}{}", truncated, extension);
    }

    if sanitized.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        sanitized
    }
}

/// Splits `name` into stem and extension (including the dot)
///
/// Leading dots do not start an extension, so `.hidden` has none.
pub fn split_extension(name: &str) -> (&str, &str) {
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    match name[leading_dots..].rfind('.') {
        Some(i) => name.split_at(leading_dots + i),
        None => (name, ""),
    }
}

/// Builds the sanitized filename for the image at dispatch position `index`
///
/// The base name is the percent-decoded last path segment of `url`, with
/// `.jpg` appended when it has no extension, or `image_{index}.jpg` when
/// the URL has no usable segment. `pattern` then decorates the base name.
/// If the path cannot be decoded the name falls back to
/// `image_{index}_{unix_timestamp}.jpg`.
pub fn build_filename(
    url: &Url,
    index: usize,
    pattern: FilenamePattern,
    now: DateTime<Local>,
) -> String {
    match original_name(url, index) {
        Some(name) => sanitize_component(&apply_pattern(&name, url, index, pattern, &now)),
        None => format!("image_{}_{}{}", index, now.timestamp(), DEFAULT_EXTENSION),
    }
}

fn original_name(url: &Url, index: usize) -> Option<String> {
    if url.cannot_be_a_base() {
        return None;
    }

    // Invalid UTF-8 escapes become U+FFFD instead of failing
    let bytes = urlencoding::decode_binary(url.path().as_bytes());
    let decoded = String::from_utf8_lossy(&bytes);
    let mut name = decoded.rsplit('/').next().unwrap_or_default().to_string();

    if split_extension(&name).1.is_empty() {
        name.push_str(DEFAULT_EXTENSION);
    }

    if name == DEFAULT_EXTENSION {
        name = format!("image_{}{}", index, DEFAULT_EXTENSION);
    }

    Some(name)
}

fn apply_pattern(
    name: &str,
    url: &Url,
    index: usize,
    pattern: FilenamePattern,
    now: &DateTime<Local>,
) -> String {
    match pattern {
        FilenamePattern::KeepOriginal => name.to_string(),
        FilenamePattern::OriginalTimestamp => {
            let (stem, extension) = split_extension(name);
            format!("{}_{}{}", stem, now.format("%Y%m%d_%H%M%S"), extension)
        }
        FilenamePattern::IndexOriginal => format!("{:04}_{}", index, name),
        FilenamePattern::DomainIndexOriginal => {
            let domain = host_label(url).replace('.', "_");
            format!("{}_{:04}_{}", domain, index, name)
        }
    }
}

/// Computes where an image is written
///
/// `<save_root>/<sanitized host>/<filename>` when `create_subfolder` is set,
/// otherwise `<save_root>/<filename>`.
pub fn destination_path(
    save_root: &Path,
    url: &Url,
    filename: &str,
    create_subfolder: bool,
) -> PathBuf {
    if create_subfolder {
        save_root
            .join(sanitize_component(&host_label(url)))
            .join(filename)
    } else {
        save_root.join(filename)
    }
}
