use std::collections::{HashMap, HashSet};

use promptrec_core::config::RecommendSettings;
use promptrec_core::types::{assign_ranks, ScoredCandidate, SourceKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub keyword: f32,
    pub vector: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self { keyword: 0.4, vector: 0.6 }
    }
}

impl From<&RecommendSettings> for FusionWeights {
    fn from(s: &RecommendSettings) -> Self {
        Self { keyword: s.keyword_weight, vector: s.vector_weight }
    }
}

/// Weighted fusion of a keyword ranking and a vector ranking.
///
/// A keyword hit at position `i` of `n` contributes `(n - i) * keyword`;
/// a vector hit contributes `similarity * vector`. The keyword side is
/// rank based and the vector side is score based. Prompts found by both
/// get the sum. An id repeated within one list counts once, at its best
/// position. Equal totals keep first-seen order, keyword list first.
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridFuser {
    weights: FusionWeights,
}

impl HybridFuser {
    pub fn new(weights: FusionWeights) -> Self { Self { weights } }

    pub fn fuse(&self, keyword: &[ScoredCandidate], vector: &[ScoredCandidate], top_k: usize) -> Vec<ScoredCandidate> {
        if top_k == 0 {
            return Vec::new();
        }
        let keyword = first_per_id(keyword);
        let vector = first_per_id(vector);
        let n = keyword.len();
        let contributions = keyword
            .iter()
            .enumerate()
            .map(|(i, c)| (*c, (n - i) as f32 * self.weights.keyword))
            .chain(vector.iter().map(|c| (*c, c.score * self.weights.vector)));

        let mut merged: Vec<ScoredCandidate> = Vec::with_capacity(keyword.len() + vector.len());
        let mut slot: HashMap<&str, usize> = HashMap::new();
        for (c, contribution) in contributions {
            match slot.get(c.id()) {
                Some(&i) => merged[i].score += contribution,
                None => {
                    slot.insert(c.id(), merged.len());
                    merged.push(ScoredCandidate { prompt: c.prompt.clone(), score: contribution, rank: 0, source: SourceKind::Hybrid });
                }
            }
        }

        merged.sort_by(|a, b| b.score.total_cmp(&a.score));
        merged.truncate(top_k);
        assign_ranks(&mut merged);
        merged
    }
}

/// Drop repeated ids within one ranked list, keeping the best-placed entry.
fn first_per_id(list: &[ScoredCandidate]) -> Vec<&ScoredCandidate> {
    let mut seen = HashSet::with_capacity(list.len());
    let mut out = Vec::with_capacity(list.len());
    for c in list {
        if seen.insert(c.id()) {
            out.push(c);
        }
    }
    out
}
