use browser::BrowserError;
use std::time::Duration;
use thiserror::Error;
use url::Url;

mod crawl;
mod extract;
mod page;
mod urls;

#[cfg(test)]
mod testing;

pub use crawl::{Crawler, PageVisit, VisitOutcome};
pub use extract::{ExtractError, HtmlExtractor, PageExtractor};
pub use page::{
    CrawlResult, FormField, FormSummary, Heading, NavItem, NavSection, PageLink, PageMetadata,
    PageSummary,
};
pub use urls::{canonicalize, normalize_url, resolve_link, resolve_normalized, same_origin};

pub const DEFAULT_MAX_PAGES: usize = 50;
pub const MAX_PAGES_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),
    #[error("Extractor error: {0}")]
    Extract(#[from] ExtractError),
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed: Url,
    pub max_pages: usize,
    pub same_origin_only: bool,
    pub navigation_timeout: Duration,
    /// Soft wait for network quiescence after each load.
    pub idle_timeout: Duration,
    pub max_duration: Option<Duration>,
}

impl CrawlConfig {
    pub fn new(seed: &str) -> Result<Self, CrawlerError> {
        let url = Url::parse(seed.trim())
            .map_err(|e| CrawlerError::InvalidUrl(format!("{}: {}", seed, e)))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(CrawlerError::InvalidUrl(format!(
                "{}: only http(s) URLs can be crawled",
                seed
            )));
        }

        Ok(Self {
            seed: url,
            max_pages: DEFAULT_MAX_PAGES,
            same_origin_only: true,
            navigation_timeout: Duration::from_millis(30_000),
            idle_timeout: Duration::from_millis(2_500),
            max_duration: None,
        })
    }

    /// Clamped to `1..=MAX_PAGES_LIMIT`.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.clamp(1, MAX_PAGES_LIMIT);
        self
    }

    pub fn with_same_origin_only(mut self, same_origin_only: bool) -> Self {
        self.same_origin_only = same_origin_only;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_max_duration(mut self, limit: Duration) -> Self {
        self.max_duration = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CrawlConfig::new("https://example.com").unwrap();
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
        assert!(config.same_origin_only);
        assert_eq!(config.navigation_timeout, Duration::from_secs(30));
        assert_eq!(config.idle_timeout, Duration::from_millis(2500));
        assert!(config.max_duration.is_none());
    }

    #[test]
    fn test_max_pages_is_clamped() {
        let config = CrawlConfig::new("https://example.com").unwrap();
        assert_eq!(config.clone().with_max_pages(0).max_pages, 1);
        assert_eq!(config.with_max_pages(5000).max_pages, MAX_PAGES_LIMIT);
    }

    #[test]
    fn test_seed_must_be_http() {
        assert!(CrawlConfig::new("ftp://example.com").is_err());
        assert!(CrawlConfig::new("mailto:someone@example.com").is_err());
        assert!(CrawlConfig::new("example.com").is_err());
    }
}
