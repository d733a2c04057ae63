use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-explorer")]
#[command(author = "CharaTech")]
#[command(version)]
#[command(about = "Breadth-first site crawling and user-story inference", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl one site and infer its user stories
    Crawl {
        /// URL to start crawling from
        #[arg(value_name = "URL")]
        url: String,

        #[command(flatten)]
        options: CrawlOptions,
    },

    /// Crawl several sites through the bounded session queue
    Batch {
        /// Seed URLs, one crawl each
        #[arg(value_name = "URL", required = true, num_args = 1..)]
        urls: Vec<String>,

        /// Crawls allowed to run at once
        #[arg(long, default_value = "3", env = "SITE_EXPLORER_MAX_RUNNING")]
        max_running: usize,

        /// Crawls allowed to wait for a slot
        #[arg(long, default_value = "32")]
        max_queued: usize,

        #[command(flatten)]
        options: CrawlOptions,
    },

    /// Recompute user stories from a saved site map
    Stories {
        /// Path to a sitemap.json written by `crawl`
        #[arg(value_name = "SITEMAP")]
        sitemap: PathBuf,

        /// Directory for the story files (defaults to the site map's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also print the stories as JSON on stdout
        #[arg(long)]
        print: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CrawlOptions {
    /// Maximum number of pages to visit (at most 200)
    #[arg(short = 'n', long, default_value = "50", env = "SITE_EXPLORER_MAX_PAGES")]
    pub max_pages: usize,

    /// Output directory; each site gets a subdirectory named after its host
    #[arg(short, long, default_value = "./explorations", env = "SITE_EXPLORER_OUTPUT")]
    pub output: PathBuf,

    /// Follow links to other origins
    #[arg(long)]
    pub allow_cross_origin: bool,

    /// Navigation timeout in milliseconds
    #[arg(long, default_value = "30000")]
    pub timeout_ms: u64,

    /// Soft wait for network quiescence after each load, in milliseconds
    #[arg(long, default_value = "2500")]
    pub idle_ms: u64,

    /// Stop the crawl after this many seconds
    #[arg(long)]
    pub max_duration_secs: Option<u64>,

    /// Page loading backend
    #[arg(long, value_enum, default_value = "chrome", env = "SITE_EXPLORER_DRIVER")]
    pub driver: DriverArg,

    /// Run Chrome without a window
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub headless: bool,

    /// Scroll each page in steps to trigger lazy content (chrome only)
    #[arg(long)]
    pub scroll: bool,

    /// Cookie sent with every request, as name=value (repeatable)
    #[arg(long = "cookie", value_name = "NAME=VALUE")]
    pub cookies: Vec<String>,

    /// JSON file with an array of {name, value, domain?} cookies
    #[arg(long, env = "SITE_EXPLORER_COOKIES")]
    pub cookies_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DriverArg {
    /// Headless Chrome, renders JavaScript
    Chrome,
    /// Plain HTTP GET, static HTML only
    Http,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
