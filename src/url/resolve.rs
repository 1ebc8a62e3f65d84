use url::Url;

/// Path suffixes accepted as image files without further checks
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".svg"];

/// Resolves an image source attribute against the page it was found on
///
/// Follows standard relative-reference resolution, so `/x.png`,
/// `x.png`, `../x.png` and `//cdn.example.com/x.png` all produce absolute
/// URLs. Returns `None` for empty or unparseable references.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use img_harvest::url::resolve_image_url;
///
/// let base = Url::parse("https://ex.com/a/").unwrap();
/// let resolved = resolve_image_url(&base, "/x.png").unwrap();
/// assert_eq!(resolved.as_str(), "https://ex.com/x.png");
/// ```
pub fn resolve_image_url(base: &Url, src: &str) -> Option<Url> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    base.join(src).ok()
}

/// Decides whether a resolved URL should be kept as an image candidate
///
/// A URL lacking a host is always rejected. When `check_extensions` is set,
/// a path ending in a known image extension (case-insensitive, query
/// ignored) is accepted; any other path is accepted only if
/// `strict_extensions` is off.
pub fn is_valid_image_url(url: &Url, check_extensions: bool, strict_extensions: bool) -> bool {
    if url.scheme().is_empty() || url.host_str().map_or(true, str::is_empty) {
        return false;
    }

    if !check_extensions {
        return true;
    }

    if has_image_extension(url) {
        return true;
    }

    !strict_extensions
}

/// Returns true if the URL path ends in one of [`IMAGE_EXTENSIONS`]
pub fn has_image_extension(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Host of the URL including a non-default port, e.g. `example.com:8080`
///
/// Used to name per-site folders and filename prefixes.
pub fn host_label(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}
