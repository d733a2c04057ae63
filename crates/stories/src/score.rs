use crawler::PageSummary;

use crate::classify::mentions_cta_keyword;
use crate::nav::NavReference;
use crate::rules::{KeywordBucket, StoryRules};
use crate::text::{fold, has_word, word_padded};
use crate::StoryKind;

/// Additive relevance score; see `ScoreWeights` for the individual terms.
pub fn score_page(
    page: &PageSummary,
    kind: StoryKind,
    refs: &[NavReference],
    persona: Option<&str>,
    cta_label: Option<&str>,
    rules: &StoryRules,
) -> u32 {
    let w = &rules.weights;
    let mut score = 0;

    if !refs.is_empty() {
        score += w.nav_reference;
        if refs.iter().any(|r| r.depth == 0) {
            score += w.top_level_nav;
        }
    }
    score += w.for_kind(kind);
    if page.has_forms() {
        score += w.form;
    }
    if !page.meta.structured_data.is_empty() {
        score += w.structured_data;
    }
    if mentions_cta_keyword(page, std::iter::empty(), rules) {
        score += w.cta_keyword;
    }
    if persona.is_some() {
        score += w.persona;
    }
    if cta_label.is_some() {
        score += w.cta_label;
    }

    let interactive = u32::try_from(page.meta.interactive_element_count).unwrap_or(u32::MAX);
    score + interactive.min(w.interactive_cap)
}

fn first_bucket(buckets: &[KeywordBucket], texts: &[&str]) -> Option<&'static str> {
    let padded = word_padded(&fold(&texts.join(" | ")));
    buckets
        .iter()
        .find(|bucket| bucket.terms.iter().any(|term| has_word(&padded, term)))
        .map(|bucket| bucket.tag)
}

/// Likely visitor type from title, description and keywords. Buckets are
/// tried in declaration order.
pub fn detect_persona(page: &PageSummary, rules: &StoryRules) -> Option<&'static str> {
    let mut texts = vec![page.meta.title.as_str()];
    texts.extend(page.meta.meta_description.as_deref());
    texts.extend(page.meta.keywords.iter().map(String::as_str));
    first_bucket(rules.personas, &texts)
}

pub fn detect_goal(
    page: &PageSummary,
    kind: StoryKind,
    cta_label: Option<&str>,
    rules: &StoryRules,
) -> &'static str {
    if kind == StoryKind::Authentication {
        return "sign in to their account";
    }

    let mut texts = vec![page.meta.title.as_str()];
    texts.extend(page.meta.meta_description.as_deref());
    texts.extend(page.meta.keywords.iter().map(String::as_str));
    texts.extend(cta_label);

    first_bucket(rules.goals, &texts).unwrap_or(match kind {
        StoryKind::Complex => "complete a multi-step form",
        StoryKind::Interaction => "take the page's primary action",
        _ => "explore the page content",
    })
}
