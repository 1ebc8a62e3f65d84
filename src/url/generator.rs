use crate::config::Config;
use crate::ConfigError;
use url::Url;

/// Token replaced by each value of the repeat range
pub const PLACEHOLDER: &str = "{}";

/// Hard cap on the number of URLs a single run may generate
pub const MAX_GENERATED_URLS: usize = 1000;

/// Number of generated URLs test-parsed by [`UrlSetGenerator::validate_pattern`]
const SAMPLE_SIZE: usize = 3;

/// Expands a URL template into the ordered list of pages to crawl
///
/// When `repeat_enabled` is set and the template contains `{}`, every
/// occurrence of the placeholder is replaced with each value of
/// `start_value..=end_value` stepping by `step_value`. Otherwise the
/// template is returned as the only URL.
///
/// # Example
///
/// ```
/// use img_harvest::config::Config;
/// use img_harvest::url::UrlSetGenerator;
///
/// let mut config = Config::new("https://ex.com/{}/page.html");
/// config.repeat_enabled = true;
/// config.start_value = 1;
/// config.end_value = 3;
///
/// let urls = UrlSetGenerator::new(&config).generate_urls().unwrap();
/// assert_eq!(urls[2], "https://ex.com/3/page.html");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct UrlSetGenerator<'a> {
    config: &'a Config,
}

impl<'a> UrlSetGenerator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Returns true if the template will be expanded over the repeat range
    pub fn expands(&self) -> bool {
        self.config.repeat_enabled && self.config.url.contains(PLACEHOLDER)
    }

    /// Number of URLs [`generate_urls`](Self::generate_urls) will produce
    ///
    /// Fails if the repeat range is malformed or exceeds
    /// [`MAX_GENERATED_URLS`].
    pub fn url_count(&self) -> Result<usize, ConfigError> {
        if !self.expands() {
            return Ok(1);
        }

        let (start, end, step) = (
            self.config.start_value,
            self.config.end_value,
            self.config.step_value,
        );

        if step <= 0 {
            return Err(ConfigError::Validation(format!(
                "step_value must be greater than 0, got {}",
                step
            )));
        }

        if start > end {
            return Err(ConfigError::Validation(format!(
                "start_value ({}) cannot be greater than end_value ({})",
                start, end
            )));
        }

        // i128 keeps the span exact for any pair of i64 bounds
        let count = (end as i128 - start as i128) / step as i128 + 1;
        if count > MAX_GENERATED_URLS as i128 {
            return Err(ConfigError::Validation(format!(
                "too many URLs would be generated ({}); the limit is {}",
                count, MAX_GENERATED_URLS
            )));
        }

        Ok(count as usize)
    }

    /// Generates the ordered URL list
    ///
    /// The result is never empty. No network activity happens here, so a
    /// failing range is always reported before any page is fetched.
    pub fn generate_urls(&self) -> Result<Vec<String>, ConfigError> {
        let template = self.config.url.trim();
        if template.is_empty() {
            return Err(ConfigError::Validation("url cannot be empty".to_string()));
        }

        let count = self.url_count()?;
        if !self.expands() {
            return Ok(vec![template.to_string()]);
        }

        let start = self.config.start_value;
        let step = self.config.step_value;

        Ok((0..count as i64)
            .map(|i| template.replace(PLACEHOLDER, &(start + i * step).to_string()))
            .collect())
    }

    /// Checks the template before a run
    ///
    /// In addition to the range checks of [`url_count`](Self::url_count),
    /// a repeat-enabled template must contain the placeholder, and the
    /// first few generated URLs must carry both a scheme and a host.
    ///
    /// Returns a human-readable confirmation on success.
    pub fn validate_pattern(&self) -> Result<String, ConfigError> {
        if self.config.url.trim().is_empty() {
            return Err(ConfigError::Validation("url cannot be empty".to_string()));
        }

        if self.config.repeat_enabled && !self.config.url.contains(PLACEHOLDER) {
            return Err(ConfigError::Validation(format!(
                "repeat crawling requires a {} placeholder in the URL",
                PLACEHOLDER
            )));
        }

        let urls = self.generate_urls()?;
        for url in urls.iter().take(SAMPLE_SIZE) {
            if !has_scheme_and_host(url) {
                return Err(ConfigError::InvalidUrl(format!(
                    "pattern produces an invalid URL: {}",
                    url
                )));
            }
        }

        Ok(format!("URL pattern is valid ({} URLs)", urls.len()))
    }
}

fn has_scheme_and_host(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => !url.scheme().is_empty() && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}
