//! HTML image extraction
//!
//! Applies the configured CSS selectors to a page and turns every matching
//! element into an [`ImageDescriptor`] with an absolute, deduplicated URL.

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::url::{is_valid_image_url, resolve_image_url};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Attributes read for the image source, in precedence order
pub const SOURCE_ATTRIBUTES: &[&str] = &["src", "data-src", "data-original"];

const COMPONENT: &str = "extractor";

/// An image discovered on a page
///
/// Two descriptors refer to the same image when their `url` strings are
/// equal (exact, case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Absolute image URL
    pub url: String,

    /// `alt` attribute, empty if absent
    pub alt: String,

    /// `title` attribute, empty if absent
    pub title: String,

    /// Page the image was found on
    pub source_page: String,

    /// Selector that matched the element
    pub selector: String,
}

/// Extracts image descriptors from HTML using an ordered selector list
#[derive(Debug, Clone)]
pub struct ImageExtractor {
    selectors: Vec<String>,
    check_extensions: bool,
    strict_extensions: bool,
    diagnostics: Diagnostics,
}

impl ImageExtractor {
    pub fn new(config: &Config, diagnostics: Diagnostics) -> Self {
        Self {
            selectors: config.selectors.clone(),
            check_extensions: config.check_extensions,
            strict_extensions: config.strict_extensions,
            diagnostics,
        }
    }

    /// Extracts images from `html` fetched from `base_url`
    ///
    /// Output order is selector order, then document order within a
    /// selector. A URL seen earlier on the same page is skipped. Selectors
    /// that fail to parse are reported and skipped without affecting the
    /// remaining ones.
    ///
    /// # Example
    ///
    /// ```
    /// use img_harvest::config::Config;
    /// use img_harvest::crawler::ImageExtractor;
    /// use img_harvest::diagnostics::Diagnostics;
    ///
    /// let extractor = ImageExtractor::new(&Config::new("https://ex.com/a/"), Diagnostics::new());
    /// let images = extractor.extract(r#"<img src="/x.png">"#, "https://ex.com/a/");
    /// assert_eq!(images[0].url, "https://ex.com/x.png");
    /// ```
    pub fn extract(&self, html: &str, base_url: &str) -> Vec<ImageDescriptor> {
        let base = match Url::parse(base_url) {
            Ok(base) => base,
            Err(e) => {
                self.diagnostics.warn(
                    COMPONENT,
                    format!("Cannot resolve images against '{}': {}", base_url, e),
                );
                return Vec::new();
            }
        };

        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut images = Vec::new();

        for raw in &self.selectors {
            let selector_text = raw.trim();
            if selector_text.is_empty() {
                continue;
            }

            let selector = match Selector::parse(selector_text) {
                Ok(selector) => selector,
                Err(e) => {
                    self.diagnostics.warn(
                        COMPONENT,
                        format!("Selector '{}' failed: {:?}", selector_text, e),
                    );
                    continue;
                }
            };

            for element in document.select(&selector) {
                if let Some(image) = self.describe(element, &base, base_url, selector_text) {
                    if seen.insert(image.url.clone()) {
                        images.push(image);
                    }
                }
            }
        }

        self.diagnostics.debug(
            COMPONENT,
            format!("{} images extracted from {}", images.len(), base_url),
        );

        images
    }

    fn describe(
        &self,
        element: ElementRef<'_>,
        base: &Url,
        base_url: &str,
        selector: &str,
    ) -> Option<ImageDescriptor> {
        let node = element.value();
        let src = SOURCE_ATTRIBUTES
            .iter()
            .filter_map(|name| node.attr(name))
            .find(|value| !value.trim().is_empty())?;

        let url = resolve_image_url(base, src)?;
        if !is_valid_image_url(&url, self.check_extensions, self.strict_extensions) {
            return None;
        }

        Some(ImageDescriptor {
            url: url.to_string(),
            alt: node.attr("alt").unwrap_or_default().to_string(),
            title: node.attr("title").unwrap_or_default().to_string(),
            source_page: base_url.to_string(),
            selector: selector.to_string(),
        })
    }
}
