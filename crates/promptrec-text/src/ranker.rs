use std::collections::HashSet;
use tracing::debug;

use promptrec_core::types::{assign_ranks, Prompt, ScoredCandidate, SourceKind, TagSet};

/// Points for a prompt whose category is among the matched categories.
pub const CATEGORY_SCORE: u32 = 2;

/// Scores prompts against a tag set: `CATEGORY_SCORE` for a category hit
/// plus one per shared keyword. Prompts scoring zero are dropped; ties keep
/// the order of the input collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRanker;

impl KeywordRanker {
    pub fn new() -> Self { Self }

    pub fn score(&self, tags: &TagSet, prompt: &Prompt) -> u32 {
        let mut score = 0;
        if tags.categories.contains(&prompt.category) {
            score += CATEGORY_SCORE;
        }
        let own: HashSet<&str> = prompt.keywords.iter().map(String::as_str).collect();
        score + own.into_iter().filter(|k| tags.keywords.contains(*k)).count() as u32
    }

    pub fn rank(&self, tags: &TagSet, prompts: &[Prompt], top_k: usize) -> Vec<ScoredCandidate> {
        if prompts.is_empty() || tags.is_empty() || top_k == 0 {
            return Vec::new();
        }
        let mut scored: Vec<(u32, &Prompt)> = prompts
            .iter()
            .map(|p| (self.score(tags, p), p))
            .filter(|(s, _)| *s > 0)
            .collect();
        // sort_by is stable: equal scores stay in collection order
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(top_k);
        debug!(matched = scored.len(), "keyword ranking done");

        let mut out: Vec<ScoredCandidate> = scored
            .into_iter()
            .map(|(s, p)| ScoredCandidate { prompt: p.clone(), score: s as f32, rank: 0, source: SourceKind::Keyword })
            .collect();
        assign_ranks(&mut out);
        out
    }
}
