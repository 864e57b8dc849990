//! URL normalization and crawl-scope checks
//!
//! Every URL the crawler touches goes through [`normalize_url`] before it is
//! compared against the visited set, so two spellings of the same page (with
//! and without a fragment, relative and absolute) are fetched only once.

use url::Url;

/// Remove the fragment identifier from a URL string
pub fn strip_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(head, _)| head)
}

/// Canonicalize a URL against the crawl base
///
/// The fragment is dropped and relative references (root-relative or not)
/// are resolved against `base`. Input that cannot be resolved is returned
/// with only the fragment removed. Normalizing an already-normalized URL
/// returns it unchanged.
pub fn normalize_url(url: &str, base: &Url) -> String {
    let without_fragment = strip_fragment(url);
    match base.join(without_fragment) {
        Ok(mut resolved) => {
            resolved.set_fragment(None);
            resolved.to_string()
        }
        Err(_) => without_fragment.to_string(),
    }
}

/// Check whether a URL falls inside the crawl scope
///
/// A URL is in scope when its host and explicit port equal the base's and its
/// path lies under the base path. The path check is segment-aware: with a base
/// of `/docs`, `/docs` and `/docs/intro` are in scope but `/docs-old` is not.
/// Malformed URLs are out of scope.
pub fn is_in_scope(url: &str, base: &Url) -> bool {
    let Ok(parsed) = Url::parse(strip_fragment(url)) else {
        return false;
    };

    match (parsed.host_str(), base.host_str()) {
        (Some(host), Some(base_host)) if host == base_host => {}
        _ => return false,
    }

    parsed.port() == base.port() && path_in_scope(parsed.path(), base.path())
}

fn path_in_scope(path: &str, base_path: &str) -> bool {
    if base_path.ends_with('/') {
        return path.starts_with(base_path);
    }
    match path.strip_prefix(base_path) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Heuristic for document pages as opposed to assets
///
/// Paths ending in `.html`, `.htm` or `/` are pages, as are paths whose final
/// segment has no `.` in it. Everything else (`.png`, `.css`, `.pdf`, but
/// also versioned segments such as `v1.2`) is treated as an asset.
pub fn looks_like_page(path: &str) -> bool {
    if path.ends_with(".html") || path.ends_with(".htm") || path.ends_with('/') {
        return true;
    }
    let last_segment = path.rsplit('/').next().unwrap_or("");
    !last_segment.contains('.')
}

/// Derive the crawl base (scheme, host, port and path) from a start URL
pub fn crawl_base(start: &Url) -> Url {
    let mut base = start.clone();
    base.set_query(None);
    base.set_fragment(None);
    base
}
