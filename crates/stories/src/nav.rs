use crawler::{normalize_url, resolve_normalized, CrawlResult, NavItem, NavSection};
use std::collections::HashMap;
use url::Url;

/// A navigation menu entry pointing at a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavReference {
    /// "Section > Parent > Item"
    pub path: String,
    pub label: String,
    pub section: Option<String>,
    pub depth: usize,
}

impl NavReference {
    fn new(section: &NavSection, item: &NavItem) -> Self {
        let path: Vec<&str> = section
            .label
            .iter()
            .map(String::as_str)
            .chain(item.parents.iter().map(String::as_str))
            .chain(std::iter::once(item.label.as_str()))
            .collect();

        Self {
            path: path.join(" > "),
            label: item.label.clone(),
            section: section.label.clone(),
            depth: item.depth,
        }
    }
}

/// Reverse index from normalized URL to the menu entries targeting it.
/// Duplicates are kept: being linked from many menus is a signal.
#[derive(Debug, Clone, Default)]
pub struct NavIndex {
    references: HashMap<String, Vec<NavReference>>,
}

impl NavIndex {
    pub fn build(result: &CrawlResult) -> Self {
        let mut references: HashMap<String, Vec<NavReference>> = HashMap::new();

        for (page_url, page) in &result.pages {
            let Ok(base) = Url::parse(page_url) else {
                continue;
            };
            for section in &page.meta.navigation {
                for item in &section.items {
                    if let Some(target) = resolve_normalized(&base, &item.href) {
                        references
                            .entry(target)
                            .or_default()
                            .push(NavReference::new(section, item));
                    }
                }
            }
        }

        Self { references }
    }

    pub fn references(&self, url: &str) -> &[NavReference] {
        let key = normalize_url(url).unwrap_or_else(|_| url.to_string());
        self.references.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}
