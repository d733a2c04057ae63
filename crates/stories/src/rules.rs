//! Heuristic tables consumed by the classifier, scorer and CTA selector.
//!
//! Everything here is plain data. `StoryRules::default()` and
//! `CtaRules::default()` are the production tables; tests build smaller
//! ones from their own statics.

use crate::StoryKind;

/// A named group of trigger terms. Terms are written in folded form
/// (lowercase, no accents).
#[derive(Debug, Clone, Copy)]
pub struct KeywordBucket {
    pub tag: &'static str,
    pub terms: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub nav_reference: u32,
    pub top_level_nav: u32,
    pub authentication: u32,
    pub complex: u32,
    pub interaction: u32,
    pub form: u32,
    pub structured_data: u32,
    pub cta_keyword: u32,
    pub persona: u32,
    pub cta_label: u32,
    pub interactive_cap: u32,
}

impl ScoreWeights {
    pub fn for_kind(&self, kind: StoryKind) -> u32 {
        match kind {
            StoryKind::Authentication => self.authentication,
            StoryKind::Complex => self.complex,
            StoryKind::Interaction => self.interaction,
            StoryKind::Browsing => 0,
        }
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            nav_reference: 40,
            top_level_nav: 20,
            authentication: 35,
            complex: 25,
            interaction: 15,
            form: 10,
            structured_data: 12,
            cta_keyword: 18,
            persona: 8,
            cta_label: 10,
            interactive_cap: 10,
        }
    }
}

pub const AUTH_TITLE_KEYWORDS: &[&str] = &["login", "log in", "sign in", "connexion"];

pub const STRUCTURED_KINDS: &[(&str, StoryKind)] = &[
    ("LoginAction", StoryKind::Authentication),
    ("RegisterAction", StoryKind::Authentication),
    ("ReserveAction", StoryKind::Complex),
    ("Reservation", StoryKind::Complex),
    ("Order", StoryKind::Complex),
    ("CheckoutPage", StoryKind::Complex),
    ("ContactPage", StoryKind::Interaction),
    ("Product", StoryKind::Interaction),
    ("Offer", StoryKind::Interaction),
    ("Service", StoryKind::Interaction),
    ("Event", StoryKind::Interaction),
    ("Article", StoryKind::Browsing),
    ("BlogPosting", StoryKind::Browsing),
    ("NewsArticle", StoryKind::Browsing),
    ("FAQPage", StoryKind::Browsing),
    ("AboutPage", StoryKind::Browsing),
    ("CollectionPage", StoryKind::Browsing),
];

pub const CTA_KEYWORDS: &[&str] = &[
    "pricing",
    "tarif",
    "contact",
    "demo",
    "start",
    "signup",
    "sign up",
    "register",
    "book",
    "reserv",
    "trial",
    "essai",
    "quote",
    "devis",
    "subscribe",
    "buy",
    "order",
];

pub const PERSONAS: &[KeywordBucket] = &[
    KeywordBucket {
        tag: "developer",
        terms: &["api", "sdk", "developer", "developers", "docs", "documentation", "integration", "github", "cli"],
    },
    KeywordBucket {
        tag: "designer",
        terms: &["design", "designer", "figma", "ui", "ux", "prototype", "mockup"],
    },
    KeywordBucket {
        tag: "marketer",
        terms: &["marketing", "campaign", "campaigns", "seo", "analytics", "conversion", "newsletter"],
    },
    KeywordBucket {
        tag: "operations lead",
        terms: &["operations", "workflow", "workflows", "automation", "logistics", "support", "admin"],
    },
    KeywordBucket {
        tag: "executive",
        terms: &["enterprise", "roi", "executive", "strategy", "leadership", "investors"],
    },
];

pub const GOALS: &[KeywordBucket] = &[
    KeywordBucket {
        tag: "compare pricing and plan options",
        terms: &["pricing", "plans", "plan", "tarifs", "tarif", "prix"],
    },
    KeywordBucket {
        tag: "book an appointment",
        terms: &["book", "booking", "reserver", "reservation", "appointment", "rendez vous"],
    },
    KeywordBucket {
        tag: "request a product demo",
        terms: &["demo", "trial", "essai"],
    },
    KeywordBucket {
        tag: "create an account",
        terms: &["signup", "sign up", "register", "inscription", "get started"],
    },
    KeywordBucket {
        tag: "get in touch with the team",
        terms: &["contact", "support", "help", "quote", "devis"],
    },
    KeywordBucket {
        tag: "complete a purchase",
        terms: &["cart", "checkout", "buy", "shop", "order", "panier"],
    },
    KeywordBucket {
        tag: "read the documentation",
        terms: &["docs", "documentation", "guide", "guides", "tutorial"],
    },
    KeywordBucket {
        tag: "catch up on the latest content",
        terms: &["blog", "news", "article", "articles", "actualites"],
    },
];

#[derive(Debug, Clone, Copy)]
pub struct StoryRules {
    pub auth_title_keywords: &'static [&'static str],
    pub structured_kinds: &'static [(&'static str, StoryKind)],
    pub complex_min_fields: usize,
    pub complex_field_types: &'static [&'static str],
    pub interaction_min_elements: usize,
    pub cta_keywords: &'static [&'static str],
    pub personas: &'static [KeywordBucket],
    pub goals: &'static [KeywordBucket],
    pub weights: ScoreWeights,
    pub per_kind_cap: usize,
    pub max_supporting_urls: usize,
}

impl Default for StoryRules {
    fn default() -> Self {
        Self {
            auth_title_keywords: AUTH_TITLE_KEYWORDS,
            structured_kinds: STRUCTURED_KINDS,
            complex_min_fields: 4,
            complex_field_types: &["select", "textarea"],
            interaction_min_elements: 3,
            cta_keywords: CTA_KEYWORDS,
            personas: PERSONAS,
            goals: GOALS,
            weights: ScoreWeights::default(),
            per_kind_cap: 3,
            max_supporting_urls: 5,
        }
    }
}

/// Equivalent CTA wordings sharing one canonical label.
#[derive(Debug, Clone, Copy)]
pub struct TermGroup {
    pub canonical: &'static str,
    pub terms: &'static [&'static str],
    pub weight: f32,
}

pub const CTA_GROUPS: &[TermGroup] = &[
    TermGroup {
        canonical: "reserver",
        terms: &["reserver", "reservation", "book now", "book a table", "booking"],
        weight: 30.0,
    },
    TermGroup {
        canonical: "get started",
        terms: &["get started", "start now", "commencer", "demarrer"],
        weight: 26.0,
    },
    TermGroup {
        canonical: "request a demo",
        terms: &["request a demo", "book a demo", "demander une demo", "demo"],
        weight: 24.0,
    },
    TermGroup {
        canonical: "start free trial",
        terms: &["start free trial", "free trial", "essai gratuit", "trial"],
        weight: 22.0,
    },
    TermGroup {
        canonical: "sign up",
        terms: &["sign up", "signup", "register", "inscription", "create account"],
        weight: 20.0,
    },
    TermGroup {
        canonical: "contact us",
        terms: &["contact us", "contactez-nous", "nous contacter", "contact"],
        weight: 18.0,
    },
    TermGroup {
        canonical: "get a quote",
        terms: &["get a quote", "demander un devis", "devis", "quote"],
        weight: 16.0,
    },
    TermGroup {
        canonical: "buy now",
        terms: &["buy now", "add to cart", "acheter", "buy", "order"],
        weight: 14.0,
    },
    TermGroup {
        canonical: "subscribe",
        terms: &["subscribe", "s'abonner", "newsletter"],
        weight: 10.0,
    },
    TermGroup {
        canonical: "decouvrir",
        terms: &["decouvrir", "discover", "learn more", "en savoir plus"],
        weight: 8.0,
    },
];

pub const CTA_NEGATIVE_TERMS: &[&str] = &[
    "login",
    "log in",
    "sign in",
    "signin",
    "connexion",
    "se connecter",
    "my account",
    "mon compte",
];

/// Known mojibake of accented CTA words (UTF-8 read as Latin-1).
pub const CTA_REPAIRS: &[(&str, &str)] = &[("RÃ©server", "Réserver"), ("DÃ©couvrir", "Découvrir")];

#[derive(Debug, Clone, Copy)]
pub struct CtaRules {
    pub groups: &'static [TermGroup],
    pub negative_terms: &'static [&'static str],
    pub negative_penalty: f32,
    pub concise_max_words: usize,
    pub concise_bonus: f32,
    pub length_range: (usize, usize),
    pub length_bonus: f32,
    pub index_penalty: f32,
    /// A label must score strictly above this to beat the first candidate.
    pub floor: f32,
    pub repairs: &'static [(&'static str, &'static str)],
    pub accent_restoration: (&'static str, &'static str),
}

impl Default for CtaRules {
    fn default() -> Self {
        Self {
            groups: CTA_GROUPS,
            negative_terms: CTA_NEGATIVE_TERMS,
            negative_penalty: 6.0,
            concise_max_words: 4,
            concise_bonus: 6.0,
            length_range: (4, 24),
            length_bonus: 4.0,
            index_penalty: 0.01,
            floor: 10.0,
            repairs: CTA_REPAIRS,
            accent_restoration: ("Reserver", "Réserver"),
        }
    }
}
