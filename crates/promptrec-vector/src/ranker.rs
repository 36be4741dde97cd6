use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use promptrec_core::error::Result;
use promptrec_core::types::{assign_ranks, Prompt, ScoredCandidate, SourceKind};

use crate::index::EmbeddingIndex;

/// Semantic ranker: embeds the query and returns the nearest prompts with
/// their cosine similarity as score.
#[derive(Clone)]
pub struct VectorRanker {
    index: Arc<EmbeddingIndex>,
}

impl VectorRanker {
    pub fn new(index: Arc<EmbeddingIndex>) -> Self { Self { index } }

    pub fn index(&self) -> &Arc<EmbeddingIndex> { &self.index }

    /// Like [`try_rank`](Self::try_rank) but any index failure becomes an
    /// empty list.
    pub fn rank(&self, query_text: &str, prompts: &[Prompt], top_k: usize) -> Vec<ScoredCandidate> {
        match self.try_rank(query_text, prompts, top_k) {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "vector ranking unavailable");
                Vec::new()
            }
        }
    }

    pub fn try_rank(&self, query_text: &str, prompts: &[Prompt], top_k: usize) -> Result<Vec<ScoredCandidate>> {
        if query_text.trim().is_empty() || prompts.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let snapshot = self.index.ensure_built(prompts)?;
        let hits = self.index.query_snapshot(&snapshot, query_text, top_k.min(prompts.len()))?;

        let mut by_id: HashMap<&str, &Prompt> = HashMap::with_capacity(prompts.len());
        for p in prompts {
            by_id.entry(p.id.as_str()).or_insert(p);
        }
        let mut out: Vec<ScoredCandidate> = hits
            .into_iter()
            .filter_map(|(id, score)| {
                by_id.get(id.as_str()).map(|p| ScoredCandidate { prompt: (*p).clone(), score, rank: 0, source: SourceKind::Vector })
            })
            .collect();
        assign_ranks(&mut out);
        Ok(out)
    }
}
