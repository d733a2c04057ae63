use crawler::PageSummary;

use crate::nav::NavReference;
use crate::rules::StoryRules;
use crate::text::{fold, word_padded};
use crate::StoryKind;

/// First matching rule wins: auth signals, then structured-data intent,
/// then form complexity, then engagement, else browsing.
pub fn classify_kind(page: &PageSummary, refs: &[NavReference], rules: &StoryRules) -> StoryKind {
    if is_authentication(page, rules) {
        return StoryKind::Authentication;
    }

    if let Some(kind) = structured_kind(page, rules) {
        return kind;
    }

    if is_complex(page, rules) {
        return StoryKind::Complex;
    }

    let nav_labels = refs.iter().map(|r| r.label.as_str());
    if mentions_cta_keyword(page, nav_labels, rules)
        || page.meta.interactive_element_count >= rules.interaction_min_elements
        || page.has_forms()
    {
        return StoryKind::Interaction;
    }

    StoryKind::Browsing
}

fn is_authentication(page: &PageSummary, rules: &StoryRules) -> bool {
    if page.has_password_field() {
        return true;
    }
    let title = fold(&page.meta.title);
    rules
        .auth_title_keywords
        .iter()
        .any(|keyword| title.contains(keyword))
}

fn structured_kind(page: &PageSummary, rules: &StoryRules) -> Option<StoryKind> {
    page.meta.structured_data.iter().find_map(|tag| {
        rules
            .structured_kinds
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(tag))
            .map(|(_, kind)| *kind)
    })
}

fn is_complex(page: &PageSummary, rules: &StoryRules) -> bool {
    page.meta
        .forms
        .iter()
        .any(|form| form.fields.len() >= rules.complex_min_fields)
        || page.fields().any(|field| {
            rules
                .complex_field_types
                .iter()
                .any(|t| field.field_type.eq_ignore_ascii_case(t))
        })
}

/// Title, keywords, CTA candidates and the given extra labels contain a
/// word starting with one of the CTA keywords.
pub(crate) fn mentions_cta_keyword<'a>(
    page: &'a PageSummary,
    extra: impl Iterator<Item = &'a str>,
    rules: &StoryRules,
) -> bool {
    let mut texts: Vec<&str> = vec![page.meta.title.as_str()];
    texts.extend(page.meta.keywords.iter().map(String::as_str));
    texts.extend(page.meta.cta_candidates.iter().map(String::as_str));
    texts.extend(extra);

    let padded = word_padded(&fold(&texts.join(" | ")));
    rules
        .cta_keywords
        .iter()
        .any(|keyword| padded.contains(&format!(" {}", keyword)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler::{FormField, FormSummary, PageMetadata};

    fn field(field_type: &str) -> FormField {
        FormField {
            name: field_type.to_string(),
            field_type: field_type.to_string(),
            label: None,
            required: false,
        }
    }

    fn page(meta: PageMetadata) -> PageSummary {
        PageSummary::new("https://example.com/x".into(), Some(200), meta)
    }

    fn form(types: &[&str]) -> FormSummary {
        FormSummary {
            fields: types.iter().map(|t| field(t)).collect(),
            ..FormSummary::default()
        }
    }

    fn classify(meta: PageMetadata) -> StoryKind {
        classify_kind(&page(meta), &[], &StoryRules::default())
    }

    #[test]
    fn test_password_field_always_wins() {
        let meta = PageMetadata {
            title: "Pricing and plans".into(),
            forms: vec![form(&["email", "password", "select", "textarea"])],
            structured_data: vec!["Product".into()],
            interactive_element_count: 20,
            ..PageMetadata::default()
        };
        assert_eq!(classify(meta), StoryKind::Authentication);
    }

    #[test]
    fn test_auth_title_keywords() {
        for title in ["Connexion | Example", "Sign In", "Member LOGIN", "Log in to Acme"] {
            let meta = PageMetadata {
                title: title.into(),
                ..PageMetadata::default()
            };
            assert_eq!(classify(meta), StoryKind::Authentication, "{}", title);
        }
    }

    #[test]
    fn test_structured_data_overrides_form_complexity() {
        let meta = PageMetadata {
            forms: vec![form(&["text", "email", "tel", "textarea"])],
            structured_data: vec!["WebPage".into(), "BlogPosting".into()],
            ..PageMetadata::default()
        };
        assert_eq!(classify(meta), StoryKind::Browsing);
    }

    #[test]
    fn test_complex_forms() {
        let four_fields = PageMetadata {
            forms: vec![form(&["text", "email", "tel", "text"])],
            ..PageMetadata::default()
        };
        assert_eq!(classify(four_fields), StoryKind::Complex);

        let select = PageMetadata {
            forms: vec![form(&["select"])],
            ..PageMetadata::default()
        };
        assert_eq!(classify(select), StoryKind::Complex);
    }

    #[test]
    fn test_interaction_signals() {
        let keyword = PageMetadata {
            title: "Book a table".into(),
            ..PageMetadata::default()
        };
        assert_eq!(classify(keyword), StoryKind::Interaction);

        let busy = PageMetadata {
            interactive_element_count: 3,
            ..PageMetadata::default()
        };
        assert_eq!(classify(busy), StoryKind::Interaction);

        let small_form = PageMetadata {
            forms: vec![form(&["email"])],
            ..PageMetadata::default()
        };
        assert_eq!(classify(small_form), StoryKind::Interaction);
    }

    #[test]
    fn test_nav_labels_count_as_cta_text() {
        let refs = vec![NavReference {
            path: "Main > Get a quote".into(),
            label: "Get a quote".into(),
            section: Some("Main".into()),
            depth: 0,
        }];
        let page = page(PageMetadata {
            title: "Acme".into(),
            ..PageMetadata::default()
        });
        assert_eq!(
            classify_kind(&page, &refs, &StoryRules::default()),
            StoryKind::Interaction
        );
    }

    #[test]
    fn test_cta_keyword_needs_word_start() {
        let meta = PageMetadata {
            title: "Follow us on Facebook".into(),
            interactive_element_count: 1,
            ..PageMetadata::default()
        };
        assert_eq!(classify(meta), StoryKind::Browsing);
    }

    #[test]
    fn test_plain_page_is_browsing() {
        let meta = PageMetadata {
            title: "Our history".into(),
            interactive_element_count: 1,
            ..PageMetadata::default()
        };
        assert_eq!(classify(meta), StoryKind::Browsing);
    }
}
