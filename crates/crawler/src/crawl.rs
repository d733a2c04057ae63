use browser::PageDriver;
use indexmap::IndexSet;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::extract::PageExtractor;
use crate::page::{CrawlResult, PageSummary};
use crate::urls::{canonicalize, resolve_link, same_origin};
use crate::{CrawlConfig, CrawlerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    Loaded,
    /// Loaded, but the page could not be read; recorded without metadata.
    Unreadable,
    /// Never loaded; not recorded and not retried.
    Failed,
}

/// Reported after every dequeued URL.
#[derive(Debug, Clone)]
pub struct PageVisit<'a> {
    pub url: &'a str,
    pub outcome: VisitOutcome,
    pub visited: usize,
    pub discovered: usize,
}

/// Breadth-first crawl over one page surface.
///
/// `discovered` doubles as the FIFO queue: entries before `cursor` have
/// been dequeued, the rest are pending. It never grows past
/// `max_pages`, so neither can the visited count.
pub struct Crawler<D, E> {
    config: CrawlConfig,
    driver: D,
    extractor: E,
    discovered: IndexSet<String>,
    cursor: usize,
    result: CrawlResult,
}

impl<D: PageDriver, E: PageExtractor> Crawler<D, E> {
    pub fn new(config: CrawlConfig, driver: D, extractor: E) -> Self {
        let seed = canonicalize(config.seed.clone());
        let mut discovered = IndexSet::new();
        discovered.insert(seed.clone());

        Self {
            config,
            driver,
            extractor,
            discovered,
            cursor: 0,
            result: CrawlResult::new(seed),
        }
    }

    pub fn run(self) -> Result<CrawlResult, CrawlerError> {
        self.run_with_progress(|_| {})
    }

    pub fn run_with_progress<F>(mut self, mut on_visit: F) -> Result<CrawlResult, CrawlerError>
    where
        F: FnMut(&PageVisit<'_>),
    {
        info!(
            "Crawling {} (max {} pages, same origin only: {})",
            self.result.base_url, self.config.max_pages, self.config.same_origin_only
        );
        self.driver.open_page()?;
        let started = Instant::now();

        while self.get_visited_count() < self.config.max_pages {
            if let Some(limit) = self.config.max_duration {
                if started.elapsed() >= limit {
                    info!("Crawl time budget of {:?} spent", limit);
                    break;
                }
            }

            let Some(url) = self.get_next_url() else {
                break;
            };
            let outcome = self.visit(&url);

            on_visit(&PageVisit {
                url: &url,
                outcome,
                visited: self.get_visited_count(),
                discovered: self.get_discovered_count(),
            });
        }

        self.driver.close_page();
        self.result.discovered = self.discovered.iter().skip(self.cursor).cloned().collect();

        info!(
            "Crawl of {} finished: {} pages recorded, {} left unvisited",
            self.result.base_url,
            self.result.pages.len(),
            self.result.discovered.len()
        );
        Ok(self.result)
    }

    fn visit(&mut self, url: &str) -> VisitOutcome {
        let load = match self.driver.navigate(url, self.config.navigation_timeout) {
            Ok(load) => load,
            Err(e) => {
                warn!("Failed to navigate to {}: {}", url, e);
                return VisitOutcome::Failed;
            }
        };

        if let Err(e) = self.driver.wait_for_idle(self.config.idle_timeout) {
            debug!("Idle wait ended early on {}: {}", url, e);
        }

        let page_url = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                warn!("Queued URL {} no longer parses: {}", url, e);
                return VisitOutcome::Failed;
            }
        };
        let base = Url::parse(&load.final_url).unwrap_or_else(|_| page_url.clone());
        if base.as_str() != page_url.as_str() {
            debug!("{} resolved to {}", url, base);
        }

        let extraction = self
            .driver
            .page_content()
            .map_err(|e| e.to_string())
            .and_then(|html| self.extractor.extract(&html, &base).map_err(|e| e.to_string()));

        let (meta, outcome) = match extraction {
            Ok(meta) => (meta, VisitOutcome::Loaded),
            Err(e) => {
                warn!("Failed to extract metadata from {}: {}", url, e);
                (Default::default(), VisitOutcome::Unreadable)
            }
        };

        let mut targets = IndexSet::new();
        for link in &meta.links {
            let Some(target) = resolve_link(&base, &link.url) else {
                continue;
            };
            if self.config.same_origin_only && !same_origin(&self.config.seed, &target) {
                continue;
            }
            let target = canonicalize(target);
            self.add_discovered_link(&target);
            targets.insert(target);
        }

        debug!("{} links out of {}", targets.len(), url);
        self.result
            .pages
            .insert(url.to_string(), PageSummary::new(url.to_string(), load.status, meta));
        self.result
            .edges
            .insert(url.to_string(), targets.into_iter().collect());
        outcome
    }

    fn add_discovered_link(&mut self, link: &str) {
        if !self.discovered.contains(link) && self.discovered.len() < self.config.max_pages {
            self.discovered.insert(link.to_string());
        }
    }

    fn get_next_url(&mut self) -> Option<String> {
        let next = self.discovered.get_index(self.cursor)?.clone();
        self.cursor += 1;
        debug!("Next URL to visit: {}", next);
        Some(next)
    }

    #[cfg(test)]
    fn is_visited(&self, url: &str) -> bool {
        self.discovered
            .get_index_of(url)
            .map(|i| i < self.cursor)
            .unwrap_or(false)
    }

    fn get_visited_count(&self) -> usize {
        self.cursor
    }

    fn get_discovered_count(&self) -> usize {
        self.discovered.len()
    }

    #[cfg(test)]
    fn get_remaining_count(&self) -> usize {
        self.discovered.len() - self.cursor
    }

    #[cfg(test)]
    fn has_more_urls(&self) -> bool {
        self.get_remaining_count() > 0
    }
}
