//! User-story inference over a finished crawl.
//!
//! The pass is pure: it reads a `CrawlResult`, builds a navigation index,
//! classifies and scores every page, picks a call-to-action label and keeps
//! the best few stories per kind. Running it twice on the same result gives
//! the same stories.

use serde::{Deserialize, Serialize};
use std::fmt;

use crawler::CrawlResult;

mod assemble;
mod classify;
mod cta;
mod nav;
mod rules;
mod score;
mod text;

pub use assemble::{story_id, StoryAssembler, StoryCandidate, UserStory};
pub use classify::classify_kind;
pub use cta::{clean_label, select_primary};
pub use nav::{NavIndex, NavReference};
pub use rules::{CtaRules, KeywordBucket, ScoreWeights, StoryRules, TermGroup};
pub use score::{detect_goal, detect_persona, score_page};
pub use text::slugify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryKind {
    Authentication,
    Complex,
    Interaction,
    Browsing,
}

impl StoryKind {
    pub const ALL: [StoryKind; 4] = [
        StoryKind::Authentication,
        StoryKind::Complex,
        StoryKind::Interaction,
        StoryKind::Browsing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryKind::Authentication => "authentication",
            StoryKind::Complex => "complex",
            StoryKind::Interaction => "interaction",
            StoryKind::Browsing => "browsing",
        }
    }
}

impl fmt::Display for StoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stories for `result` using the default rule tables.
pub fn infer_stories(result: &CrawlResult) -> Vec<UserStory> {
    StoryAssembler::default().assemble(result)
}
