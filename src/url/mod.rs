//! URL handling module for Img-Harvest
//!
//! This module provides URL-set generation from a repeat pattern, relative
//! image reference resolution, and the image-URL validity filter.

mod generator;
mod resolve;

pub use generator::{UrlSetGenerator, MAX_GENERATED_URLS, PLACEHOLDER};
pub use resolve::{
    has_image_extension, host_label, is_valid_image_url, resolve_image_url, IMAGE_EXTENSIONS,
};
