use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::BrowserError;

/// A cookie handed to the browser before crawling. Opaque to the crawl
/// itself; it only changes what the site renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieSeed {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
}

impl CookieSeed {
    pub fn new(name: &str, value: &str, domain: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            domain: domain.map(|d| d.trim_start_matches('.').to_ascii_lowercase()),
        }
    }

    fn applies_to(&self, host: &str) -> bool {
        match &self.domain {
            None => true,
            Some(domain) => {
                let domain = domain.trim_start_matches('.').to_ascii_lowercase();
                let host = host.to_ascii_lowercase();
                host == domain || host.ends_with(&format!(".{}", domain))
            }
        }
    }
}

/// Parses a `name=value` command line pair.
pub fn parse_cookie_arg(arg: &str) -> Result<CookieSeed, BrowserError> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| BrowserError::InvalidCookie(format!("expected name=value, got {:?}", arg)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(BrowserError::InvalidCookie(format!("empty cookie name in {:?}", arg)));
    }
    Ok(CookieSeed::new(name, value.trim(), None))
}

pub fn load_cookie_seeds<P: AsRef<Path>>(path: P) -> Result<Vec<CookieSeed>, BrowserError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .map_err(|e| BrowserError::InvalidCookie(format!("{}: {}", path.display(), e)))?;
    let seeds: Vec<CookieSeed> = serde_json::from_str(&json)
        .map_err(|e| BrowserError::InvalidCookie(format!("{}: {}", path.display(), e)))?;
    info!("Loaded {} cookies from {}", seeds.len(), path.display());
    Ok(seeds)
}

/// Builds a `Cookie` header value for a request to `url`.
pub fn cookie_header_for(seeds: &[CookieSeed], url: &str) -> Option<String> {
    let host = url::Url::parse(url).ok()?.host_str()?.to_string();
    let pairs: Vec<String> = seeds
        .iter()
        .filter(|seed| seed.applies_to(&host))
        .map(|seed| format!("{}={}", seed.name, seed.value))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}
