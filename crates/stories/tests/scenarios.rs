use crawler::{resolve_normalized, CrawlResult, HtmlExtractor, PageExtractor, PageSummary};
use std::collections::HashSet;
use stories::{classify_kind, infer_stories, NavIndex, StoryAssembler, StoryKind, StoryRules};
use url::Url;

/// Builds a crawl result the way the crawler would, from (url, html) pairs.
fn site(pages: &[(&str, &str)]) -> CrawlResult {
    let extractor = HtmlExtractor::new().unwrap();
    let mut result = CrawlResult::new("https://example.com/".into());

    for (url, html) in pages {
        let base = Url::parse(url).unwrap();
        let meta = extractor.extract(html, &base).unwrap();

        let mut targets: Vec<String> = Vec::new();
        for link in &meta.links {
            if let Some(target) = resolve_normalized(&base, &link.url) {
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }

        result
            .pages
            .insert(url.to_string(), PageSummary::new(url.to_string(), Some(200), meta));
        result.edges.insert(url.to_string(), targets);
    }
    result
}

const HOME: &str = r#"<html><head><title>Example</title></head><body>
<nav aria-label="Main"><ul>
  <li><a href="/login">Connexion</a></li>
  <li><a href="/history">History</a></li>
</ul></nav>
<h1>Welcome</h1>
</body></html>"#;

const LOGIN: &str = r#"<html><head><title>Connexion | Example</title></head><body>
<form action="/session" method="post">
  <label for="email">Email</label><input id="email" name="email" type="email" required>
  <label for="pw">Mot de passe</label><input id="pw" name="password" type="password" required>
  <button type="submit">Se connecter</button>
</form>
<a href="/">Accueil</a>
</body></html>"#;

const HISTORY: &str = r#"<html><head><title>Our history</title></head><body>
<main><h1>Since 1902</h1><p>We have been around.</p></main>
<button>Menu</button>
</body></html>"#;

#[test]
fn test_login_page_behind_top_menu() {
    let result = site(&[
        ("https://example.com/", HOME),
        ("https://example.com/login", LOGIN),
    ]);

    let assembler = StoryAssembler::default();
    let candidates = assembler.candidates(&result);
    let login = candidates
        .iter()
        .find(|c| c.url == "https://example.com/login")
        .unwrap();
    assert_eq!(login.kind, StoryKind::Authentication);
    assert!(login.score >= 35 + 40 + 20, "score was {}", login.score);
    assert_eq!(login.nav_refs[0].depth, 0);

    let stories = assembler.assemble(&result);
    let auth: Vec<_> = stories
        .iter()
        .filter(|s| s.kind == StoryKind::Authentication)
        .collect();
    assert_eq!(auth.len(), 1);
    assert_eq!(auth[0].entry_url, "https://example.com/login");
    assert_eq!(auth[0].title, "Sign in through Connexion");
    assert!(auth[0].description.contains("via the \"Main > Connexion\" menu"));
    assert_eq!(auth[0].supporting_urls, vec!["https://example.com/".to_string()]);
}

#[test]
fn test_quiet_page_is_browsing() {
    let result = site(&[("https://example.com/history", HISTORY)]);
    let page = &result.pages["https://example.com/history"];
    assert_eq!(page.meta.interactive_element_count, 1);

    let index = NavIndex::build(&result);
    let kind = classify_kind(
        page,
        index.references("https://example.com/history"),
        &StoryRules::default(),
    );
    assert_eq!(kind, StoryKind::Browsing);

    let stories = infer_stories(&result);
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0].kind, StoryKind::Browsing);
}

fn large_site() -> CrawlResult {
    let mut pages: Vec<(String, String)> = Vec::new();
    for i in 0..12 {
        let body = match i % 4 {
            0 => "<form><input type=\"password\" name=\"pw\"></form>".to_string(),
            1 => "<form><select name=\"s\"></select></form>".to_string(),
            2 => "<button>Get started</button><button>Contact</button><button>Log in</button>"
                .to_string(),
            _ => "<p>Text only.</p>".to_string(),
        };
        let html = format!(
            "<html><head><title>Page {}</title></head><body><nav><ul>\
             <li><a href=\"/p{}\">Next</a></li></ul></nav>{}</body></html>",
            i,
            (i + 1) % 12,
            body
        );
        pages.push((format!("https://example.com/p{}", i), html));
    }
    let refs: Vec<(&str, &str)> = pages.iter().map(|(u, h)| (u.as_str(), h.as_str())).collect();
    site(&refs)
}

#[test]
fn test_story_uniqueness_and_caps() {
    let stories = infer_stories(&large_site());

    let mut pairs = HashSet::new();
    for story in &stories {
        assert!(pairs.insert((story.entry_url.clone(), story.kind)));
        assert!(story.supporting_urls.len() <= 5);
        assert!(!story.supporting_urls.contains(&story.entry_url));
    }
    for kind in StoryKind::ALL {
        let count = stories.iter().filter(|s| s.kind == kind).count();
        assert_eq!(count, 3, "{}", kind);
    }
}

#[test]
fn test_inference_is_repeatable() {
    let result = large_site();
    let first = infer_stories(&result);
    let second = infer_stories(&result);
    assert_eq!(first, second);

    let ids: HashSet<_> = first.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids.len(), first.len());
}

#[test]
fn test_interaction_story_carries_cta() {
    let stories = infer_stories(&large_site());
    let interaction = stories
        .iter()
        .find(|s| s.kind == StoryKind::Interaction)
        .unwrap();
    assert_eq!(interaction.cta_label.as_deref(), Some("Get started"));
    assert!(interaction.title.starts_with("Get started on Page"));
}
