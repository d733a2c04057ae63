use crawler::{normalize_url, CrawlResult, PageSummary};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use url::Url;

use crate::classify::classify_kind;
use crate::cta::select_primary;
use crate::nav::{NavIndex, NavReference};
use crate::rules::{CtaRules, StoryRules};
use crate::score::{detect_goal, detect_persona, score_page};
use crate::text::{collapse_ws, slugify};
use crate::StoryKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStory {
    pub id: String,
    pub kind: StoryKind,
    pub title: String,
    pub entry_url: String,
    pub description: String,
    pub suggested_name: String,
    pub supporting_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_label: Option<String>,
}

/// A scored page before selection. Only lives for one assembly pass.
#[derive(Debug, Clone)]
pub struct StoryCandidate<'a> {
    pub url: &'a str,
    pub page: &'a PageSummary,
    pub kind: StoryKind,
    pub score: u32,
    pub nav_refs: Vec<NavReference>,
    pub persona: Option<&'static str>,
    pub goal: &'static str,
    pub cta_label: Option<String>,
}

/// `story-` followed by the first 16 hex digits of sha256("url|kind").
pub fn story_id(url: &str, kind: StoryKind) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}", url, kind).as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(8).map(|b| format!("{:02x}", b)).collect();
    format!("story-{}", hex)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StoryAssembler {
    rules: StoryRules,
    cta_rules: CtaRules,
}

impl StoryAssembler {
    pub fn new(rules: StoryRules, cta_rules: CtaRules) -> Self {
        Self { rules, cta_rules }
    }

    /// Every page of `result` with its inferred kind and score, in crawl order.
    pub fn candidates<'a>(&self, result: &'a CrawlResult) -> Vec<StoryCandidate<'a>> {
        let index = NavIndex::build(result);
        debug!("Navigation index covers {} targets", index.len());

        result
            .pages
            .iter()
            .map(|(url, page)| {
                let refs = index.references(url);
                let kind = classify_kind(page, refs, &self.rules);
                let persona = detect_persona(page, &self.rules);
                let cta_label = select_primary(&page.meta.cta_candidates, &self.cta_rules);
                let goal = detect_goal(page, kind, cta_label.as_deref(), &self.rules);
                let score = score_page(page, kind, refs, persona, cta_label.as_deref(), &self.rules);

                StoryCandidate {
                    url: url.as_str(),
                    page,
                    kind,
                    score,
                    nav_refs: refs.to_vec(),
                    persona,
                    goal,
                    cta_label,
                }
            })
            .collect()
    }

    pub fn assemble(&self, result: &CrawlResult) -> Vec<UserStory> {
        let mut candidates = self.candidates(result);
        // Stable: equal scores keep crawl order.
        candidates.sort_by(|a, b| b.score.cmp(&a.score));

        let mut seen: HashSet<(String, StoryKind)> = HashSet::new();
        let mut per_kind: HashMap<StoryKind, usize> = HashMap::new();
        let mut stories = Vec::new();

        for candidate in &candidates {
            let key = normalize_url(candidate.url).unwrap_or_else(|_| candidate.url.to_string());
            let taken = per_kind.entry(candidate.kind).or_insert(0);
            if *taken >= self.rules.per_kind_cap || seen.contains(&(key.clone(), candidate.kind)) {
                continue;
            }

            *taken += 1;
            seen.insert((key.clone(), candidate.kind));
            debug!(
                "Accepted {} story for {} (score {})",
                candidate.kind, key, candidate.score
            );
            stories.push(self.build_story(candidate, &key, result));
        }

        stories
    }

    fn build_story(&self, candidate: &StoryCandidate, url: &str, result: &CrawlResult) -> UserStory {
        let name = display_name(candidate);
        let title = story_title(candidate.kind, &name, candidate.cta_label.as_deref());

        let supporting_urls = result
            .outbound(candidate.url)
            .iter()
            .filter(|target| target.as_str() != candidate.url)
            .take(self.rules.max_supporting_urls)
            .cloned()
            .collect();

        UserStory {
            id: story_id(url, candidate.kind),
            kind: candidate.kind,
            suggested_name: slugify(&title),
            title,
            entry_url: url.to_string(),
            description: describe(candidate, &name),
            supporting_urls,
            cta_label: candidate.cta_label.clone(),
        }
    }
}

/// Page title up to the first " | " or " - " separator, else the menu label,
/// else the last path segment, else the host.
fn display_name(candidate: &StoryCandidate) -> String {
    let title = collapse_ws(&candidate.page.meta.title);
    let head = title
        .split(" | ")
        .next()
        .and_then(|part| part.split(" - ").next())
        .unwrap_or("")
        .trim();
    if !head.is_empty() {
        return head.to_string();
    }

    if let Some(reference) = candidate.nav_refs.first() {
        if !reference.label.is_empty() {
            return reference.label.clone();
        }
    }

    let Ok(url) = Url::parse(candidate.url) else {
        return candidate.url.to_string();
    };
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.replace(['-', '_'], " "))
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_else(|| candidate.url.to_string())
}

fn story_title(kind: StoryKind, name: &str, cta: Option<&str>) -> String {
    match (kind, cta) {
        (StoryKind::Authentication, _) => format!("Sign in through {}", name),
        (StoryKind::Complex, _) => format!("Complete the {} form", name),
        (StoryKind::Interaction, Some(cta)) => format!("{} on {}", cta, name),
        (StoryKind::Interaction, None) => format!("Engage with {}", name),
        (StoryKind::Browsing, _) => format!("Explore {}", name),
    }
}

fn with_article(noun: &str) -> String {
    let vowel = noun
        .chars()
        .next()
        .map(|c| "aeiou".contains(c.to_ascii_lowercase()))
        .unwrap_or(false);
    if vowel {
        format!("An {}", noun)
    } else {
        format!("A {}", noun)
    }
}

fn describe(candidate: &StoryCandidate, name: &str) -> String {
    let who = with_article(candidate.persona.unwrap_or("visitor"));
    let route = candidate
        .nav_refs
        .iter()
        .min_by_key(|r| r.depth)
        .map(|r| format!("via the \"{}\" menu", r.path))
        .unwrap_or_else(|| format!("at {}", candidate.url));
    let action = match candidate.kind {
        StoryKind::Authentication => "enters their credentials",
        StoryKind::Complex => "fills in the form",
        StoryKind::Interaction => "uses the page's controls",
        StoryKind::Browsing => "reads through the content",
    };

    let mut description = format!(
        "{} reaches {} {} and {} to {}.",
        who, name, route, action, candidate.goal
    );
    if let Some(cta) = &candidate.cta_label {
        description.push_str(&format!(" Primary action: \"{}\".", cta));
    }
    description
}
