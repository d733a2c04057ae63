//! Structured page snapshot from a serialized DOM.
//!
//! The crawler only sees the `PageExtractor` trait; `HtmlExtractor` is the
//! CSS-selector implementation used by both browser adapters.

use indexmap::IndexSet;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::page::{FormField, FormSummary, Heading, NavItem, NavSection, PageLink, PageMetadata};

const MAX_CTA_CANDIDATES: usize = 20;
const MAX_CTA_CHARS: usize = 80;

const SKIPPED_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "reset", "image"];

const LANDMARK_ROLES: &[&str] = &[
    "banner",
    "navigation",
    "main",
    "contentinfo",
    "complementary",
    "search",
    "form",
    "region",
];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector {0}: {1}")]
    Selector(&'static str, String),
    #[error("Extraction failed: {0}")]
    Failed(String),
}

pub trait PageExtractor {
    fn extract(&self, html: &str, page_url: &Url) -> Result<PageMetadata, ExtractError>;
}

struct Selectors {
    title: Selector,
    link: Selector,
    form: Selector,
    field: Selector,
    label: Selector,
    interactive: Selector,
    landmark: Selector,
    nav: Selector,
    heading: Selector,
    breadcrumb_container: Selector,
    breadcrumb_item: Selector,
    breadcrumb_link: Selector,
    jsonld: Selector,
    itemtype: Selector,
    meta_description: Selector,
    og_description: Selector,
    meta_keywords: Selector,
    cta: Selector,
    scrollable: Selector,
}

fn parse(css: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(css, e.to_string()))
}

impl Selectors {
    fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            title: parse("title")?,
            link: parse("a[href]")?,
            form: parse("form")?,
            field: parse("input, select, textarea")?,
            label: parse("label")?,
            interactive: parse("button, [role='button'], input, select, textarea, summary, [onclick]")?,
            landmark: parse("header, nav, main, footer, aside, [role]")?,
            nav: parse("nav, [role='navigation']")?,
            heading: parse("h1, h2, h3, h4, h5, h6")?,
            breadcrumb_container: parse("nav, ol, ul, div")?,
            breadcrumb_item: parse("li")?,
            breadcrumb_link: parse("a")?,
            jsonld: parse("script[type='application/ld+json']")?,
            itemtype: parse("[itemtype]")?,
            meta_description: parse("meta[name='description']")?,
            og_description: parse("meta[property='og:description']")?,
            meta_keywords: parse("meta[name='keywords']")?,
            cta: parse("button, a[role='button'], input[type='submit'], input[type='button'], a[class]")?,
            scrollable: parse("[style], [data-scrollable]")?,
        })
    }
}

/// `href` joined onto the page URL; kept raw when it cannot be joined.
fn absolute_href(el: &ElementRef, page_url: &Url) -> Option<String> {
    let href = el.value().attr("href")?.trim();
    Some(
        page_url
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string()),
    )
}

pub struct HtmlExtractor {
    selectors: Selectors,
}

impl HtmlExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            selectors: Selectors::new()?,
        })
    }

    fn title(&self, doc: &Html) -> String {
        doc.select(&self.selectors.title)
            .next()
            .map(|el| element_text(&el))
            .unwrap_or_default()
    }

    fn links(&self, doc: &Html, page_url: &Url) -> Vec<PageLink> {
        doc.select(&self.selectors.link)
            .filter_map(|el| {
                let url = absolute_href(&el, page_url)?;
                let text = labelled_text(&el);
                Some(PageLink { url, text })
            })
            .collect()
    }

    fn forms(&self, doc: &Html) -> Vec<FormSummary> {
        let labels_by_id: HashMap<String, String> = doc
            .select(&self.selectors.label)
            .filter_map(|label| {
                let target = label.value().attr("for")?;
                Some((target.to_string(), element_text(&label)))
            })
            .collect();

        doc.select(&self.selectors.form)
            .map(|form| FormSummary {
                action: form.value().attr("action").map(str::to_string),
                method: form
                    .value()
                    .attr("method")
                    .unwrap_or("get")
                    .to_ascii_lowercase(),
                fields: form
                    .select(&self.selectors.field)
                    .filter_map(|field| form_field(&field, &labels_by_id))
                    .collect(),
            })
            .collect()
    }

    fn interactive_count(&self, doc: &Html) -> usize {
        doc.select(&self.selectors.interactive)
            .filter(|el| {
                !(el.value().name() == "input"
                    && el
                        .value()
                        .attr("type")
                        .map(|t| t.eq_ignore_ascii_case("hidden"))
                        .unwrap_or(false))
            })
            .count()
    }

    fn has_scrollable_sections(&self, doc: &Html) -> bool {
        doc.select(&self.selectors.scrollable).any(|el| {
            if el.value().attr("data-scrollable").is_some() {
                return true;
            }
            let style: String = el
                .value()
                .attr("style")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            ["overflow:auto", "overflow:scroll", "overflow-y:auto", "overflow-y:scroll", "overflow-x:auto", "overflow-x:scroll"]
                .iter()
                .any(|rule| style.contains(rule))
        })
    }

    fn landmarks(&self, doc: &Html) -> BTreeSet<String> {
        doc.select(&self.selectors.landmark)
            .filter_map(|el| {
                if let Some(role) = el.value().attr("role") {
                    let role = role.trim().to_ascii_lowercase();
                    return LANDMARK_ROLES.contains(&role.as_str()).then_some(role);
                }
                let implied = match el.value().name() {
                    "header" => "banner",
                    "nav" => "navigation",
                    "main" => "main",
                    "footer" => "contentinfo",
                    "aside" => "complementary",
                    _ => return None,
                };
                Some(implied.to_string())
            })
            .collect()
    }

    fn navigation(&self, doc: &Html, page_url: &Url) -> Vec<NavSection> {
        doc.select(&self.selectors.nav)
            .map(|nav| {
                let label = nav
                    .value()
                    .attr("aria-label")
                    .map(collapse_ws)
                    .filter(|l| !l.is_empty())
                    .or_else(|| {
                        nav.select(&self.selectors.heading)
                            .next()
                            .map(|h| element_text(&h))
                            .filter(|l| !l.is_empty())
                    });

                let items = nav
                    .select(&self.selectors.link)
                    .filter_map(|link| {
                        let label = labelled_text(&link);
                        if label.is_empty() {
                            return None;
                        }
                        let href = absolute_href(&link, page_url)?;
                        let (depth, parents) = menu_position(&link, &nav);
                        Some(NavItem {
                            label,
                            href,
                            depth,
                            parents,
                        })
                    })
                    .collect();

                NavSection { label, items }
            })
            .collect()
    }

    fn headings(&self, doc: &Html) -> Vec<Heading> {
        doc.select(&self.selectors.heading)
            .filter_map(|el| {
                let level = el.value().name()[1..].parse::<u8>().ok()?;
                let text = element_text(&el);
                (!text.is_empty()).then_some(Heading { level, text })
            })
            .collect()
    }

    fn breadcrumbs(&self, doc: &Html) -> Vec<String> {
        let container = doc.select(&self.selectors.breadcrumb_container).find(|el| {
            let marker = format!(
                "{} {}",
                el.value().attr("aria-label").unwrap_or_default(),
                el.value().attr("class").unwrap_or_default()
            );
            marker.to_ascii_lowercase().contains("breadcrumb")
        });

        let Some(container) = container else {
            return Vec::new();
        };

        let mut crumbs: Vec<String> = container
            .select(&self.selectors.breadcrumb_item)
            .map(|li| element_text(&li))
            .filter(|t| !t.is_empty())
            .collect();
        if crumbs.is_empty() {
            crumbs = container
                .select(&self.selectors.breadcrumb_link)
                .map(|a| element_text(&a))
                .filter(|t| !t.is_empty())
                .collect();
        }
        crumbs
    }

    fn structured_data(&self, doc: &Html, crumbs: &mut Vec<String>) -> Vec<String> {
        let mut types = IndexSet::new();

        for script in doc.select(&self.selectors.jsonld) {
            let raw: String = script.text().collect();
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => collect_jsonld(&value, &mut types, crumbs),
                Err(e) => debug!("Skipping malformed JSON-LD block: {}", e),
            }
        }

        for el in doc.select(&self.selectors.itemtype) {
            if let Some(itemtype) = el.value().attr("itemtype") {
                for part in itemtype.split_whitespace() {
                    if let Some(name) = part.trim_end_matches('/').rsplit('/').next() {
                        if !name.is_empty() {
                            types.insert(name.to_string());
                        }
                    }
                }
            }
        }

        types.into_iter().collect()
    }

    fn meta_description(&self, doc: &Html) -> Option<String> {
        doc.select(&self.selectors.meta_description)
            .chain(doc.select(&self.selectors.og_description))
            .filter_map(|el| el.value().attr("content"))
            .map(collapse_ws)
            .find(|d| !d.is_empty())
    }

    fn keywords(&self, doc: &Html) -> Vec<String> {
        doc.select(&self.selectors.meta_keywords)
            .filter_map(|el| el.value().attr("content"))
            .flat_map(|content| content.split(','))
            .map(collapse_ws)
            .filter(|k| !k.is_empty())
            .collect()
    }

    fn cta_candidates(&self, doc: &Html) -> Vec<String> {
        let mut seen = IndexSet::new();
        for el in doc.select(&self.selectors.cta) {
            let tag = el.value().name();
            if tag == "a" && el.value().attr("role") != Some("button") {
                let class = el.value().attr("class").unwrap_or_default().to_ascii_lowercase();
                if !["btn", "button", "cta"].iter().any(|m| class.contains(m)) {
                    continue;
                }
            }

            let text = if tag == "input" {
                el.value().attr("value").map(collapse_ws).unwrap_or_default()
            } else {
                labelled_text(&el)
            };

            if !text.is_empty() && text.chars().count() <= MAX_CTA_CHARS {
                seen.insert(text);
            }
            if seen.len() >= MAX_CTA_CANDIDATES {
                break;
            }
        }
        seen.into_iter().collect()
    }
}

impl PageExtractor for HtmlExtractor {
    fn extract(&self, html: &str, page_url: &Url) -> Result<PageMetadata, ExtractError> {
        let doc = Html::parse_document(html);

        let mut breadcrumbs = self.breadcrumbs(&doc);
        let mut jsonld_crumbs = Vec::new();
        let structured_data = self.structured_data(&doc, &mut jsonld_crumbs);
        if breadcrumbs.is_empty() {
            breadcrumbs = jsonld_crumbs;
        }

        let meta = PageMetadata {
            title: self.title(&doc),
            links: self.links(&doc, page_url),
            forms: self.forms(&doc),
            interactive_element_count: self.interactive_count(&doc),
            has_scrollable_sections: self.has_scrollable_sections(&doc),
            landmarks: self.landmarks(&doc),
            navigation: self.navigation(&doc, page_url),
            headings: self.headings(&doc),
            breadcrumbs,
            structured_data,
            meta_description: self.meta_description(&doc),
            keywords: self.keywords(&doc),
            cta_candidates: self.cta_candidates(&doc),
        };

        debug!(
            "Extracted {} links, {} forms, {} nav sections from {}",
            meta.links.len(),
            meta.forms.len(),
            meta.navigation.len(),
            page_url
        );
        Ok(meta)
    }
}

fn form_field(field: &ElementRef, labels_by_id: &HashMap<String, String>) -> Option<FormField> {
    let el = field.value();
    let field_type = match el.name() {
        "input" => el.attr("type").unwrap_or("text").trim().to_ascii_lowercase(),
        other => other.to_string(),
    };
    if SKIPPED_INPUT_TYPES.contains(&field_type.as_str()) {
        return None;
    }

    let id = el.attr("id");
    let label = el
        .attr("aria-label")
        .map(collapse_ws)
        .or_else(|| id.and_then(|id| labels_by_id.get(id).cloned()))
        .or_else(|| {
            field
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| a.value().name() == "label")
                .map(|label| element_text(&label))
        })
        .or_else(|| el.attr("placeholder").map(collapse_ws))
        .filter(|l| !l.is_empty());

    Some(FormField {
        name: el.attr("name").or(id).unwrap_or_default().to_string(),
        field_type,
        label,
        required: el.attr("required").is_some() || el.attr("aria-required") == Some("true"),
    })
}

/// List nesting depth of a menu link below its `nav`, plus the labels of
/// the enclosing menu items.
fn menu_position(link: &ElementRef, nav: &ElementRef) -> (usize, Vec<String>) {
    let mut lists = 0usize;
    let mut items: Vec<ElementRef> = Vec::new();

    for ancestor in link.ancestors() {
        if ancestor.id() == nav.id() {
            break;
        }
        if let Some(el) = ElementRef::wrap(ancestor) {
            match el.value().name() {
                "ul" | "ol" => lists += 1,
                "li" => items.push(el),
                _ => {}
            }
        }
    }

    // The nearest <li> is the link's own item.
    let parents = items
        .iter()
        .skip(1)
        .rev()
        .filter_map(item_label)
        .collect();
    (lists.saturating_sub(1), parents)
}

fn item_label(item: &ElementRef) -> Option<String> {
    item.children()
        .filter_map(ElementRef::wrap)
        .find(|child| matches!(child.value().name(), "a" | "button" | "span"))
        .map(|child| labelled_text(&child))
        .filter(|label| !label.is_empty())
}

fn collect_jsonld(value: &Value, types: &mut IndexSet<String>, crumbs: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_jsonld(item, types, crumbs);
            }
        }
        Value::Object(map) => {
            let mut is_breadcrumb = false;
            match map.get("@type") {
                Some(Value::String(t)) => {
                    is_breadcrumb = t == "BreadcrumbList";
                    types.insert(t.clone());
                }
                Some(Value::Array(ts)) => {
                    for t in ts.iter().filter_map(Value::as_str) {
                        is_breadcrumb |= t == "BreadcrumbList";
                        types.insert(t.to_string());
                    }
                }
                _ => {}
            }

            if is_breadcrumb && crumbs.is_empty() {
                if let Some(Value::Array(elements)) = map.get("itemListElement") {
                    crumbs.extend(elements.iter().filter_map(|el| {
                        el.get("name")
                            .or_else(|| el.get("item").and_then(|item| item.get("name")))
                            .and_then(Value::as_str)
                            .map(collapse_ws)
                    }));
                }
            }

            if let Some(graph) = map.get("@graph") {
                collect_jsonld(graph, types, crumbs);
            }
        }
        _ => {}
    }
}

fn labelled_text(el: &ElementRef) -> String {
    let text = element_text(el);
    if !text.is_empty() {
        return text;
    }
    el.value()
        .attr("aria-label")
        .or_else(|| el.value().attr("title"))
        .map(collapse_ws)
        .unwrap_or_default()
}

fn element_text(el: &ElementRef) -> String {
    collapse_ws(&el.text().collect::<Vec<_>>().join(" "))
}

pub(crate) fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}
