use url::Url;

use crate::CrawlerError;

/// Parses `raw` and returns its canonical key form.
pub fn normalize_url(raw: &str) -> Result<String, CrawlerError> {
    let url = Url::parse(raw.trim()).map_err(|e| CrawlerError::InvalidUrl(format!("{}: {}", raw, e)))?;
    Ok(canonicalize(url))
}

/// Canonical key form: fragment stripped, trailing slashes collapsed
/// (the root path keeps its single slash).
pub fn canonicalize(mut url: Url) -> String {
    url.set_fragment(None);
    if url.path().len() > 1 && url.path().ends_with('/') {
        let trimmed = url.path().trim_end_matches('/').to_string();
        let trimmed = if trimmed.is_empty() { "/".to_string() } else { trimmed };
        url.set_path(&trimmed);
    }
    url.to_string()
}

/// Scheme, host and effective port all match.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Resolves `href` against `base`. Anything that fails to parse or is
/// not http(s) (mailto:, javascript:, data:, ...) yields `None`.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" if resolved.host_str().is_some() => Some(resolved),
        _ => None,
    }
}

/// `resolve_link` followed by `canonicalize`.
pub fn resolve_normalized(base: &Url, href: &str) -> Option<String> {
    resolve_link(base, href).map(canonicalize)
}
