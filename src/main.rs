use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use browser::{load_cookie_seeds, parse_cookie_arg, ChromeOptions, ScrollBehavior};
use exporter::{ExportFormat, Exporter, STORIES_CSV_FILE, STORIES_FILE};
use session::{SessionLimits, SessionStatus};

mod cli;
mod progress;
mod service;

use cli::{Cli, Commands, CrawlOptions, DriverArg};
use progress::CrawlProgress;
use service::{run_job, CrawlJob, CrawlService, DriverKind, JobReport};

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_job(seed: &str, options: &CrawlOptions) -> Result<CrawlJob> {
    let mut cookies = options
        .cookies
        .iter()
        .map(|arg| parse_cookie_arg(arg))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(path) = &options.cookies_file {
        cookies.extend(load_cookie_seeds(path)?);
    }

    let chrome = ChromeOptions {
        headless: options.headless,
        scroll_behavior: if options.scroll {
            ScrollBehavior::Incremental {
                steps: 5,
                delay_ms: 300,
            }
        } else {
            ScrollBehavior::None
        },
        ..ChromeOptions::default()
    };

    let mut job = CrawlJob::new(seed, options.output.clone());
    job.max_pages = options.max_pages;
    job.same_origin_only = !options.allow_cross_origin;
    job.navigation_timeout = Duration::from_millis(options.timeout_ms);
    job.idle_timeout = Duration::from_millis(options.idle_ms);
    job.max_duration = options.max_duration_secs.map(Duration::from_secs);
    job.driver = match options.driver {
        DriverArg::Chrome => DriverKind::Chrome,
        DriverArg::Http => DriverKind::Http,
    };
    job.chrome = chrome;
    job.cookies = cookies;
    // Reject bad seeds before any browser starts.
    job.config()?;
    Ok(job)
}

async fn crawl(url: String, options: CrawlOptions, show_progress: bool) -> Result<()> {
    let job = build_job(&url, &options)?;
    let max_pages = job.config()?.max_pages as u64;

    let report = tokio::task::spawn_blocking(move || -> Result<JobReport> {
        let progress = CrawlProgress::new(max_pages, show_progress);
        let report = run_job(&job, |visit| progress.record(visit))?;
        progress.finish(report.pages_visited);
        if progress.failed() > 0 {
            warn!("{} pages could not be loaded", progress.failed());
        }
        Ok(report)
    })
    .await
    .context("Crawl worker stopped unexpectedly")??;

    println!(
        "Crawled {} pages from {} ({} left unvisited), {} user stories",
        report.pages_visited, report.seed, report.unvisited, report.stories
    );
    println!("Results written to {}", report.output_dir.display());
    Ok(())
}

async fn batch(
    urls: Vec<String>,
    max_running: usize,
    max_queued: usize,
    options: CrawlOptions,
) -> Result<()> {
    let service = CrawlService::new(SessionLimits {
        max_running: max_running.max(1),
        max_queued,
        ..SessionLimits::default()
    });

    for url in &urls {
        let job = match build_job(url, &options) {
            Ok(job) => job,
            Err(e) => {
                error!("Skipping {}: {:#}", url, e);
                continue;
            }
        };
        if let Err(e) = service.submit(job).await {
            warn!("Skipping {}: {:#}", url, e);
        }
    }

    service.sessions().wait_idle().await;

    let records = service.sessions().list().await;
    let failed = records
        .iter()
        .filter(|r| r.status == SessionStatus::Failed)
        .count();
    for record in &records {
        let elapsed = match (record.started_at, record.finished_at) {
            (Some(start), Some(end)) => format!("{}s", (end - start).num_seconds()),
            _ => "-".to_string(),
        };
        match record.status {
            SessionStatus::Completed => println!(
                "✓ {} - {} pages, {} stories ({})",
                record.request.seed,
                record.pages_visited.unwrap_or_default(),
                record.stories.unwrap_or_default(),
                elapsed
            ),
            _ => println!(
                "✗ {} - {} ({})",
                record.request.seed,
                record.error.as_deref().unwrap_or("not finished"),
                elapsed
            ),
        }
    }

    info!("{} crawls finished, {} failed", records.len(), failed);
    Ok(())
}

fn rebuild_stories(sitemap: &Path, output: Option<PathBuf>, print: bool) -> Result<()> {
    let exporter = Exporter::new();
    let result = exporter
        .read_site_map(sitemap)
        .with_context(|| format!("Failed to read site map {}", sitemap.display()))?;
    let stories = stories::infer_stories(&result);

    let dir = output
        .or_else(|| sitemap.parent().map(Path::to_path_buf))
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)?;
    exporter.write_stories(&stories, dir.join(STORIES_FILE), ExportFormat::Json)?;
    exporter.write_stories(&stories, dir.join(STORIES_CSV_FILE), ExportFormat::Csv)?;

    info!(
        "{} stories from {} pages written to {}",
        stories.len(),
        result.page_count(),
        dir.display()
    );
    if print {
        println!("{}", serde_json::to_string_pretty(&stories)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Crawl { url, options } => crawl(url, options, !cli.quiet).await,
        Commands::Batch {
            urls,
            max_running,
            max_queued,
            options,
        } => batch(urls, max_running, max_queued, options).await,
        Commands::Stories {
            sitemap,
            output,
            print,
        } => rebuild_stories(&sitemap, output, print),
    }
}
