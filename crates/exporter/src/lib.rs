use crawler::{CrawlResult, PageSummary};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stories::UserStory;
use thiserror::Error;
use tracing::info;

pub const SITE_MAP_FILE: &str = "sitemap.json";
pub const STORIES_FILE: &str = "user-stories.json";
pub const STORIES_CSV_FILE: &str = "user-stories.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to export data: {0}")]
    ExportFailed(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeList {
    pub source: String,
    pub targets: Vec<String>,
}

/// On-disk shape of a crawl: `baseUrl`, `pages`, `edges`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteMapDocument {
    pub base_url: String,
    pub pages: Vec<PageSummary>,
    pub edges: Vec<EdgeList>,
    /// Queued but never visited when the crawl stopped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovered: Vec<String>,
}

impl SiteMapDocument {
    pub fn from_result(result: &CrawlResult) -> Self {
        Self {
            base_url: result.base_url.clone(),
            pages: result.pages.values().cloned().collect(),
            edges: result
                .edges
                .iter()
                .map(|(source, targets)| EdgeList {
                    source: source.clone(),
                    targets: targets.clone(),
                })
                .collect(),
            discovered: result.discovered.iter().cloned().collect(),
        }
    }

    pub fn into_result(self) -> CrawlResult {
        let mut result = CrawlResult::new(self.base_url);
        for page in self.pages {
            result.pages.insert(page.url.clone(), page);
        }
        for edge in self.edges {
            result.edges.insert(edge.source, edge.targets);
        }
        result.discovered.extend(self.discovered);
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

/// Files written for one crawl run.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub site_map: PathBuf,
    pub stories: PathBuf,
    pub stories_csv: PathBuf,
}

pub struct Exporter;

impl Exporter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_site_map<P: AsRef<Path>>(
        &self,
        result: &CrawlResult,
        path: P,
    ) -> Result<(), ExportError> {
        let document = SiteMapDocument::from_result(result);
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| ExportError::ExportFailed(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn read_site_map<P: AsRef<Path>>(&self, path: P) -> Result<CrawlResult, ExportError> {
        let json = std::fs::read_to_string(path)?;
        let document: SiteMapDocument = serde_json::from_str(&json)
            .map_err(|e| ExportError::InvalidFormat(e.to_string()))?;
        Ok(document.into_result())
    }

    pub fn write_stories_json<P: AsRef<Path>>(
        &self,
        stories: &[UserStory],
        path: P,
    ) -> Result<(), ExportError> {
        let json = serde_json::to_string_pretty(stories)
            .map_err(|e| ExportError::ExportFailed(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn write_stories_csv<P: AsRef<Path>>(
        &self,
        stories: &[UserStory],
        path: P,
    ) -> Result<(), ExportError> {
        let mut wtr = csv::Writer::from_path(path)?;

        wtr.write_record([
            "id",
            "kind",
            "title",
            "entryUrl",
            "description",
            "suggestedName",
            "supportingUrls",
            "ctaLabel",
        ])?;

        for story in stories {
            wtr.write_record([
                story.id.as_str(),
                story.kind.as_str(),
                story.title.as_str(),
                story.entry_url.as_str(),
                story.description.as_str(),
                story.suggested_name.as_str(),
                story.supporting_urls.join(" ").as_str(),
                story.cta_label.as_deref().unwrap_or_default(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }

    pub fn write_stories<P: AsRef<Path>>(
        &self,
        stories: &[UserStory],
        path: P,
        format: ExportFormat,
    ) -> Result<(), ExportError> {
        match format {
            ExportFormat::Json => self.write_stories_json(stories, path),
            ExportFormat::Csv => self.write_stories_csv(stories, path),
        }
    }

    /// Writes the site map and both story files into `dir`, creating it.
    pub fn export_run<P: AsRef<Path>>(
        &self,
        dir: P,
        result: &CrawlResult,
        stories: &[UserStory],
    ) -> Result<ExportPaths, ExportError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let paths = ExportPaths {
            site_map: dir.join(SITE_MAP_FILE),
            stories: dir.join(STORIES_FILE),
            stories_csv: dir.join(STORIES_CSV_FILE),
        };
        self.write_site_map(result, &paths.site_map)?;
        self.write_stories(stories, &paths.stories, ExportFormat::Json)?;
        self.write_stories(stories, &paths.stories_csv, ExportFormat::Csv)?;

        info!(
            "Exported {} pages and {} stories to {}",
            result.page_count(),
            stories.len(),
            dir.display()
        );
        Ok(paths)
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}
