use crate::rules::{CtaRules, TermGroup};
use crate::text::{collapse_ws, fold, has_word, one_edit_apart, strip_zero_width, title_case, word_padded};

/// Removes zero-width characters, collapses whitespace and repairs the
/// known garbled tokens.
pub fn clean_label(raw: &str, rules: &CtaRules) -> String {
    let mut label = collapse_ws(&strip_zero_width(raw));
    for (garbled, fixed) in rules.repairs {
        if label.contains(garbled) {
            label = label.replace(garbled, fixed);
        }
    }
    label
}

#[derive(Debug)]
struct ScoredLabel {
    label: String,
    canonical: Option<&'static str>,
    score: f32,
}

/// Candidate and term as padded word lists. Accepts containment either way
/// or a single inserted/deleted character.
fn term_matches(padded: &str, term: &str) -> bool {
    let term_padded = word_padded(term);
    let words = padded.trim();
    let term_words = term_padded.trim();

    has_word(padded, term_words)
        || (words.chars().count() >= 3 && has_word(&term_padded, words))
        || one_edit_apart(words, term_words)
}

fn matched_group<'a>(padded: &str, groups: &'a [TermGroup]) -> Option<&'a TermGroup> {
    groups
        .iter()
        .find(|group| group.terms.iter().any(|term| term_matches(padded, term)))
}

fn score_label(label: String, index: usize, rules: &CtaRules) -> ScoredLabel {
    let padded = word_padded(&fold(&label));
    let mut score = 0.0;

    let group = matched_group(&padded, rules.groups);
    if let Some(group) = group {
        score += group.weight;
    }
    if rules
        .negative_terms
        .iter()
        .any(|term| has_word(&padded, word_padded(term).trim()))
    {
        score -= rules.negative_penalty;
    }
    if label.split_whitespace().count() <= rules.concise_max_words {
        score += rules.concise_bonus;
    }
    let len = label.chars().count();
    if (rules.length_range.0..=rules.length_range.1).contains(&len) {
        score += rules.length_bonus;
    }
    score -= rules.index_penalty * index as f32;

    ScoredLabel {
        label,
        canonical: group.map(|g| g.canonical),
        score,
    }
}

fn restore_accents(label: &str, rules: &CtaRules) -> String {
    let (plain, accented) = rules.accent_restoration;
    label
        .split(' ')
        .map(|word| if word == plain { accented } else { word })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Picks the primary call-to-action label among `candidates`.
///
/// Candidates are scored in their original order; ties go to the earlier
/// one. When the winning label does not spell out its canonical term
/// (ignoring case and accents), the title-cased canonical term replaces it. If nothing scores above the
/// floor the first non-empty candidate is returned as-is (after cleaning).
pub fn select_primary(candidates: &[String], rules: &CtaRules) -> Option<String> {
    let scored: Vec<ScoredLabel> = candidates
        .iter()
        .map(|raw| clean_label(raw, rules))
        .filter(|label| !label.is_empty())
        .enumerate()
        .map(|(index, label)| score_label(label, index, rules))
        .collect();

    let first = scored.first()?;
    let best = scored
        .iter()
        .fold(first, |best, next| if next.score > best.score { next } else { best });

    if best.score <= rules.floor {
        return Some(first.label.clone());
    }

    // Canonical terms are stored folded, so compare against the folded label.
    let label = match best.canonical {
        Some(canonical) if !fold(&best.label).contains(canonical) => title_case(canonical),
        _ => best.label.clone(),
    };
    Some(restore_accents(&label, rules))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(labels: &[&str]) -> Option<String> {
        let candidates: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        select_primary(&candidates, &CtaRules::default())
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(select(&[]), None);
        assert_eq!(select(&["", "\u{200B}", "   "]), None);
    }

    #[test]
    fn test_reserver_variants_resolve_to_accented_form() {
        assert_eq!(select(&["Réserver", "Reserver"]).as_deref(), Some("Réserver"));
        assert_eq!(select(&["Reserver"]).as_deref(), Some("Réserver"));
        assert_eq!(select(&["RÃ©server"]).as_deref(), Some("Réserver"));
        assert_eq!(select(&["Reserve"]).as_deref(), Some("Réserver"));
    }

    #[test]
    fn test_clean_label() {
        let rules = CtaRules::default();
        assert_eq!(clean_label("  Get\u{200B}   started \n", &rules), "Get started");
        assert_eq!(clean_label("DÃ©couvrir", &rules), "Découvrir");
    }

    #[test]
    fn test_negative_terms_lose_to_primary_action() {
        assert_eq!(select(&["Log in", "Get started"]).as_deref(), Some("Get started"));
        assert_eq!(select(&["Sign in", "Sign up"]).as_deref(), Some("Sign up"));
    }

    #[test]
    fn test_rewrites_to_canonical_term() {
        assert_eq!(
            select(&["Start your free trial"]).as_deref(),
            Some("Start Free Trial")
        );
        assert_eq!(
            select(&["Follow us on Facebook", "Contact"]).as_deref(),
            Some("Contact Us")
        );
    }

    #[test]
    fn test_keeps_label_spelling_out_canonical_term() {
        assert_eq!(select(&["Découvrir"]).as_deref(), Some("Découvrir"));
        assert_eq!(select(&["GET STARTED"]).as_deref(), Some("GET STARTED"));
    }

    #[test]
    fn test_falls_back_to_first_candidate_below_floor() {
        assert_eq!(
            select(&["Learn about us", "Our team"]).as_deref(),
            Some("Learn about us")
        );
        assert_eq!(select(&["Follow us on Facebook"]).as_deref(), Some("Follow us on Facebook"));
    }

    #[test]
    fn test_ties_prefer_earliest_candidate() {
        assert_eq!(select(&["Buy now", "Buy now!"]).as_deref(), Some("Buy now"));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let labels = ["Découvrir", "Book a demo", "Contact", "Log in", "Start free trial"];
        let first = select(&labels);
        for _ in 0..5 {
            assert_eq!(select(&labels), first);
        }
        assert_eq!(first.as_deref(), Some("Request A Demo"));
    }
}
