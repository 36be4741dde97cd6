//! Domain types shared by the keyword, vector and hybrid rankers.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub type PromptId = String;

/// Difficulty level of a prompt. Accepts the Korean labels used by older
/// prompt files as aliases.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Level {
    #[serde(alias = "입문", alias = "beginner")]
    Beginner,
    #[default]
    #[serde(alias = "중급", alias = "intermediate")]
    Intermediate,
    #[serde(alias = "고급", alias = "advanced")]
    Advanced,
    #[serde(alias = "expert")]
    Expert,
}

/// A stored, reusable instruction template.
///
/// - `id`: stable unique identity; fusion and caching key on it
/// - `body`: the template text (`"prompt"` in JSON records)
/// - `category`: one of the configured category names
/// - `keywords`: unordered tags; a bare string is accepted as a single tag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prompt {
    pub id: PromptId,
    pub title: String,
    #[serde(rename = "prompt", alias = "body", default)]
    pub body: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tool: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub framework: String,
    #[serde(default)]
    pub level: Level,
    #[serde(default, deserialize_with = "keywords_from_any")]
    pub keywords: Vec<String>,
}

impl Prompt {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            category: String::new(),
            tool: String::new(),
            framework: String::new(),
            level: Level::default(),
            keywords: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Text fed to the embedding provider: title, body and space-joined
    /// keywords separated by single spaces. Cached vectors depend on this
    /// exact layout.
    pub fn indexed_text(&self) -> String {
        format!("{} {} {}", self.title, self.body, self.keywords.join(" "))
    }
}

fn null_as_empty<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

fn keywords_from_any<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Option::<Raw>::deserialize(de)? {
        Some(Raw::One(s)) if s.trim().is_empty() => Vec::new(),
        Some(Raw::One(s)) => vec![s],
        Some(Raw::Many(v)) => v,
        None => Vec::new(),
    })
}

/// Categories and keywords matched from free text. Sorted sets so that
/// iteration order is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    pub categories: BTreeSet<String>,
    pub keywords: BTreeSet<String>,
}

impl TagSet {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.keywords.is_empty()
    }
}

/// Indicates which ranker produced a candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Keyword,
    Vector,
    Hybrid,
}

/// A prompt with the score assigned by one ranker.
///
/// `rank` is the 1-based position in the returned list. `score` is
/// ranker-specific but higher is always better.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub prompt: Prompt,
    pub score: f32,
    pub rank: usize,
    pub source: SourceKind,
}

impl ScoredCandidate {
    pub fn id(&self) -> &str {
        &self.prompt.id
    }
}

/// Rewrite `rank` so it matches list position (1-based).
pub fn assign_ranks(candidates: &mut [ScoredCandidate]) {
    for (i, c) in candidates.iter_mut().enumerate() {
        c.rank = i + 1;
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendMode {
    Keyword,
    Vector,
    #[default]
    Hybrid,
}

impl fmt::Display for RecommendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Keyword => "keyword",
            Self::Vector => "vector",
            Self::Hybrid => "hybrid",
        };
        f.write_str(s)
    }
}

/// Result of a recommendation call that keeps "no match" apart from
/// "a subsystem failed".
///
/// An empty `Results` is the normal no-match outcome. `Degraded` carries
/// usable results produced without the vector path. `Unavailable` means
/// the requested path could not run at all.
#[derive(Debug, Clone)]
pub enum RecommendOutcome {
    Results(Vec<ScoredCandidate>),
    Degraded { results: Vec<ScoredCandidate>, reason: String },
    Unavailable { reason: String },
}

impl RecommendOutcome {
    pub fn candidates(&self) -> &[ScoredCandidate] {
        match self {
            Self::Results(r) | Self::Degraded { results: r, .. } => r,
            Self::Unavailable { .. } => &[],
        }
    }

    pub fn into_candidates(self) -> Vec<ScoredCandidate> {
        match self {
            Self::Results(r) | Self::Degraded { results: r, .. } => r,
            Self::Unavailable { .. } => Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
