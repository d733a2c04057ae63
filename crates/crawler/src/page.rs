use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLink {
    pub url: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub method: String,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    pub label: String,
    /// Absolute unless the page URL could not join it.
    pub href: String,
    pub depth: usize,
    /// Labels of the enclosing menu items, outermost first.
    #[serde(default)]
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavSection {
    #[serde(default)]
    pub label: Option<String>,
    pub items: Vec<NavItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// Everything the extractor reads off a loaded page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMetadata {
    pub title: String,
    pub links: Vec<PageLink>,
    pub forms: Vec<FormSummary>,
    pub interactive_element_count: usize,
    pub has_scrollable_sections: bool,
    pub landmarks: BTreeSet<String>,
    pub navigation: Vec<NavSection>,
    pub headings: Vec<Heading>,
    pub breadcrumbs: Vec<String>,
    pub structured_data: Vec<String>,
    pub meta_description: Option<String>,
    pub keywords: Vec<String>,
    pub cta_candidates: Vec<String>,
}

/// One visited page, keyed by its canonical URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub url: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(flatten)]
    pub meta: PageMetadata,
}

impl PageSummary {
    pub fn new(url: String, status: Option<u16>, meta: PageMetadata) -> Self {
        Self { url, status, meta }
    }

    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.meta.forms.iter().flat_map(|form| form.fields.iter())
    }

    pub fn has_password_field(&self) -> bool {
        self.fields()
            .any(|field| field.field_type.eq_ignore_ascii_case("password"))
    }

    pub fn has_forms(&self) -> bool {
        self.meta.forms.iter().any(|form| !form.fields.is_empty())
    }
}

/// The page/edge graph of one crawl run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    pub base_url: String,
    pub pages: IndexMap<String, PageSummary>,
    pub edges: IndexMap<String, Vec<String>>,
    pub discovered: IndexSet<String>,
}

impl CrawlResult {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn outbound(&self, url: &str) -> &[String] {
        self.edges.get(url).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, field_type: &str) -> FormField {
        FormField {
            name: name.to_string(),
            field_type: field_type.to_string(),
            label: None,
            required: false,
        }
    }

    #[test]
    fn test_password_detection_is_case_insensitive() {
        let meta = PageMetadata {
            forms: vec![FormSummary {
                fields: vec![field("user", "email"), field("pass", "PASSWORD")],
                ..FormSummary::default()
            }],
            ..PageMetadata::default()
        };
        let page = PageSummary::new("https://example.com/login".into(), Some(200), meta);
        assert!(page.has_password_field());
        assert!(page.has_forms());
    }

    #[test]
    fn test_empty_form_is_not_a_form() {
        let meta = PageMetadata {
            forms: vec![FormSummary::default()],
            ..PageMetadata::default()
        };
        let page = PageSummary::new("https://example.com/".into(), None, meta);
        assert!(!page.has_forms());
        assert!(!page.has_password_field());
    }

    #[test]
    fn test_page_summary_json_is_flat_camel_case() {
        let meta = PageMetadata {
            title: "Home".into(),
            interactive_element_count: 2,
            ..PageMetadata::default()
        };
        let page = PageSummary::new("https://example.com/".into(), Some(200), meta);
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["url"], "https://example.com/");
        assert_eq!(json["title"], "Home");
        assert_eq!(json["interactiveElementCount"], 2);
        assert!(json.get("meta").is_none());

        let back: PageSummary = serde_json::from_value(json).unwrap();
        assert_eq!(back, page);
    }
}
