use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;

use browser::{ChromeDriver, ChromeOptions, CookieSeed, HttpDriver, PageDriver};
use crawler::{CrawlConfig, Crawler, HtmlExtractor, PageVisit};
use exporter::Exporter;
use session::{Admission, SessionLimits, SessionManager, SessionOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    Chrome,
    Http,
}

/// Everything needed to run one crawl to completion.
#[derive(Debug, Clone)]
pub struct CrawlJob {
    pub seed: String,
    pub max_pages: usize,
    pub same_origin_only: bool,
    pub navigation_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_duration: Option<Duration>,
    pub driver: DriverKind,
    pub chrome: ChromeOptions,
    pub cookies: Vec<CookieSeed>,
    pub output: PathBuf,
}

impl CrawlJob {
    pub fn new(seed: &str, output: PathBuf) -> Self {
        Self {
            seed: seed.to_string(),
            max_pages: crawler::DEFAULT_MAX_PAGES,
            same_origin_only: true,
            navigation_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_millis(2500),
            max_duration: None,
            driver: DriverKind::Chrome,
            chrome: ChromeOptions::default(),
            cookies: Vec::new(),
            output,
        }
    }

    pub fn config(&self) -> Result<CrawlConfig> {
        let mut config = CrawlConfig::new(&self.seed)?
            .with_max_pages(self.max_pages)
            .with_same_origin_only(self.same_origin_only)
            .with_navigation_timeout(self.navigation_timeout)
            .with_idle_timeout(self.idle_timeout);
        if let Some(limit) = self.max_duration {
            config = config.with_max_duration(limit);
        }
        Ok(config)
    }

    fn driver(&self) -> Result<Box<dyn PageDriver>> {
        let driver: Box<dyn PageDriver> = match self.driver {
            DriverKind::Chrome => Box::new(
                ChromeDriver::launch(self.chrome.clone(), self.cookies.clone())
                    .context("Failed to launch Chrome")?,
            ),
            DriverKind::Http => Box::new(HttpDriver::new(self.cookies.clone())?),
        };
        Ok(driver)
    }
}

#[derive(Debug, Clone)]
pub struct JobReport {
    pub seed: String,
    pub pages_visited: usize,
    pub unvisited: usize,
    pub stories: usize,
    pub output_dir: PathBuf,
}

/// `<root>/<host>` or `<root>/<host>_<port>` for the seed.
pub fn site_dir(root: &Path, seed: &Url) -> PathBuf {
    let host = seed.host_str().unwrap_or("site");
    match seed.port() {
        Some(port) => root.join(format!("{}_{}", host, port)),
        None => root.join(host),
    }
}

/// Crawls, infers stories and writes the output files. Blocks until done.
pub fn run_job<F>(job: &CrawlJob, on_visit: F) -> Result<JobReport>
where
    F: FnMut(&PageVisit<'_>),
{
    let config = job.config()?;
    let dir = site_dir(&job.output, &config.seed);
    let extractor = HtmlExtractor::new()?;
    let driver = job.driver()?;

    let result = Crawler::new(config, driver, extractor)
        .run_with_progress(on_visit)
        .with_context(|| format!("Crawl of {} failed", job.seed))?;
    let stories = stories::infer_stories(&result);

    Exporter::new()
        .export_run(&dir, &result, &stories)
        .with_context(|| format!("Failed to write results to {}", dir.display()))?;

    Ok(JobReport {
        seed: job.seed.clone(),
        pages_visited: result.page_count(),
        unvisited: result.discovered.len(),
        stories: stories.len(),
        output_dir: dir,
    })
}

pub type JobRunner = Arc<dyn Fn(&CrawlJob) -> Result<JobReport> + Send + Sync>;

/// Runs crawl jobs behind a `SessionManager`: admitted jobs go to the
/// blocking pool, queued ones start when a running job finishes.
#[derive(Clone)]
pub struct CrawlService {
    sessions: SessionManager<CrawlJob>,
    runner: JobRunner,
}

impl CrawlService {
    pub fn new(limits: SessionLimits) -> Self {
        Self::with_runner(limits, Arc::new(|job: &CrawlJob| run_job(job, |_| {})))
    }

    pub fn with_runner(limits: SessionLimits, runner: JobRunner) -> Self {
        Self {
            sessions: SessionManager::new(limits),
            runner,
        }
    }

    pub fn sessions(&self) -> &SessionManager<CrawlJob> {
        &self.sessions
    }

    /// Returns the session id; fails when the queue is full.
    pub async fn submit(&self, job: CrawlJob) -> Result<String> {
        let admission = self.sessions.create(job.clone()).await?;
        match &admission {
            Admission::Started(id) => self.spawn_worker(id.clone(), job),
            Admission::Queued { position, .. } => {
                info!("Crawl of {} queued at position {}", job.seed, position)
            }
        }
        Ok(admission.id().to_string())
    }

    fn spawn_worker(&self, id: String, job: CrawlJob) {
        let service = self.clone();
        tokio::spawn(async move { service.work(id, job).await });
    }

    /// Runs `job`, then whatever its completion promoted, on this worker.
    async fn work(&self, id: String, job: CrawlJob) {
        let mut next = Some((id, job));

        while let Some((id, job)) = next.take() {
            info!("Session {} crawling {}", id, job.seed);
            let runner = Arc::clone(&self.runner);
            let outcome = match tokio::task::spawn_blocking(move || runner(&job)).await {
                Ok(Ok(report)) => {
                    info!(
                        "Session {} done: {} pages, {} stories in {}",
                        id,
                        report.pages_visited,
                        report.stories,
                        report.output_dir.display()
                    );
                    SessionOutcome::Completed {
                        pages_visited: report.pages_visited,
                        stories: report.stories,
                    }
                }
                Ok(Err(e)) => {
                    warn!("Session {} failed: {:#}", id, e);
                    SessionOutcome::Failed(format!("{:#}", e))
                }
                Err(e) => {
                    error!("Session {} worker panicked: {}", id, e);
                    SessionOutcome::Failed(format!("crawl worker panicked: {}", e))
                }
            };

            match self.sessions.complete(&id, outcome).await {
                Ok(promoted) => next = promoted,
                Err(e) => error!("Could not complete session {}: {}", id, e),
            }
        }
    }
}
